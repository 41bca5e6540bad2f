use async_trait::async_trait;
use tracing::info;

use super::context::ResolveContext;
use super::strategy::{LoaderResolution, LoaderStrategy};
use crate::core::cache::{CacheEntry, ResourceCache};
use crate::core::error::{LauncherResult, ResultExt};
use crate::core::state::EngineConfig;
use crate::core::version::{VersionJson, VersionManifest, VersionMetadata};

/// Vanilla adds nothing on top of the base game.
pub struct VanillaStrategy;

#[async_trait]
impl LoaderStrategy for VanillaStrategy {
    async fn resolve(&self, _ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>> {
        Ok(None)
    }
}

/// Resolves `requested` (an id or the `release`/`snapshot` alias) through the
/// manifest and loads its version JSON, validated by the manifest hash.
pub async fn fetch_base_metadata(
    config: &EngineConfig,
    cache: &ResourceCache,
    requested: &str,
) -> LauncherResult<VersionMetadata> {
    let manifest = VersionManifest::fetch(config, cache)
        .await
        .stage("fetch version manifest")?;
    let entry = manifest.resolve(requested)?;

    let local = config
        .paths
        .cache_file(&format!("minecraft/{}.json", entry.id));
    let cache_entry = match &entry.sha1 {
        Some(sha1) => CacheEntry::verified(local, &entry.url, sha1),
        None => CacheEntry::immutable(local, &entry.url),
    };

    let json: VersionJson = cache
        .resolve_json(&cache_entry)
        .await
        .stage("fetch version metadata")?;
    let metadata = VersionMetadata::from_json(json)?;

    info!(
        "Minecraft {} ({}) with {} libraries",
        metadata.id,
        metadata.version_type,
        metadata.libraries.len()
    );
    Ok(metadata)
}
