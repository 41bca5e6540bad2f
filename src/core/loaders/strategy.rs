use async_trait::async_trait;
use tracing::info;

use super::context::ResolveContext;
use super::fabric::FabricStrategy;
use super::forge::ForgeStrategy;
use super::neoforge::NeoForgeStrategy;
use super::quilt::QuiltStrategy;
use super::vanilla::{fetch_base_metadata, VanillaStrategy};
use super::LoaderKind;
use crate::core::cache::ResourceCache;
use crate::core::error::{LauncherResult, ResultExt};
use crate::core::processors::InstallerBundle;
use crate::core::state::EngineConfig;
use crate::core::version::{LoaderMetadata, VersionMetadata};

/// What a loader strategy produces for one game version.
#[derive(Debug, Clone)]
pub struct LoaderResolution {
    pub metadata: LoaderMetadata,
    /// Present for loaders that must run installer processors.
    pub installer: Option<InstallerBundle>,
}

#[async_trait]
pub trait LoaderStrategy: Send + Sync {
    /// `None` means the base game runs as is.
    async fn resolve(&self, ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>>;
}

/// Closed dispatcher over the supported loaders.
pub enum Strategy {
    Vanilla(VanillaStrategy),
    Fabric(FabricStrategy),
    Quilt(QuiltStrategy),
    Forge(ForgeStrategy),
    NeoForge(NeoForgeStrategy),
}

impl Strategy {
    pub fn new(kind: LoaderKind) -> Self {
        match kind {
            LoaderKind::Vanilla => Self::Vanilla(VanillaStrategy),
            LoaderKind::Fabric => Self::Fabric(FabricStrategy),
            LoaderKind::Quilt => Self::Quilt(QuiltStrategy),
            LoaderKind::Forge => Self::Forge(ForgeStrategy),
            LoaderKind::NeoForge => Self::NeoForge(NeoForgeStrategy),
        }
    }

    pub async fn resolve(&self, ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>> {
        match self {
            Strategy::Vanilla(s) => s.resolve(ctx).await,
            Strategy::Fabric(s) => s.resolve(ctx).await,
            Strategy::Quilt(s) => s.resolve(ctx).await,
            Strategy::Forge(s) => s.resolve(ctx).await,
            Strategy::NeoForge(s) => s.resolve(ctx).await,
        }
    }
}

/// Output of the metadata stage.
#[derive(Debug, Clone)]
pub struct ResolvedMetadata {
    pub metadata: VersionMetadata,
    /// Base game metadata before the loader merge, kept for installer variables.
    pub base: VersionMetadata,
    pub installer: Option<InstallerBundle>,
}

/// Resolves base metadata for `game_version` and merges the loader's on top.
pub async fn resolve_metadata(
    config: &EngineConfig,
    cache: &ResourceCache,
    kind: LoaderKind,
    game_version: &str,
    loader_version: &str,
) -> LauncherResult<ResolvedMetadata> {
    let base = fetch_base_metadata(config, cache, game_version)
        .await
        .stage("resolve base metadata")?;

    let ctx = ResolveContext {
        game_version: &base.id,
        loader_version,
        config,
        cache,
    };
    let resolution = Strategy::new(kind)
        .resolve(ctx)
        .await
        .stage("resolve loader metadata")?;

    let Some(resolution) = resolution else {
        return Ok(ResolvedMetadata {
            metadata: base.clone(),
            base,
            installer: None,
        });
    };

    resolution
        .metadata
        .check_parent(&base.id)
        .stage("resolve loader metadata")?;
    info!("Resolved {} {} for {}", kind, resolution.metadata.id, base.id);
    Ok(ResolvedMetadata {
        metadata: base.clone().merge(resolution.metadata),
        base,
        installer: resolution.installer,
    })
}
