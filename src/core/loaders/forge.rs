use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::context::ResolveContext;
use super::strategy::{LoaderResolution, LoaderStrategy};
use super::LoaderKind;
use crate::core::cache::CacheEntry;
use crate::core::error::{LauncherError, LauncherResult, ResultExt};
use crate::core::libraries::{Artifact, Library, LibraryOrigin};
use crate::core::processors::profile::OFFICIAL_CLIENT_VARIABLE;
use crate::core::processors::{InstallProfile, InstallerArchive, InstallerBundle};
use crate::core::version::{LoaderMetadata, VersionJson};

const INSTALL_PROFILE_ENTRY: &str = "install_profile.json";

/// `promotions_slim.json`.
#[derive(Debug, Deserialize)]
struct Promotions {
    #[serde(default)]
    promos: BTreeMap<String, String>,
}

pub struct ForgeStrategy;

#[async_trait]
impl LoaderStrategy for ForgeStrategy {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>> {
        let version = if ctx.wants_latest() {
            latest_forge_version(&ctx).await.stage("resolve latest forge")?
        } else {
            forge_version_id(ctx.game_version, ctx.loader_version)
        };
        info!("Using Forge {} for Minecraft {}", version, ctx.game_version);

        let base = ctx.config.endpoints().forge_maven.trim_end_matches('/');
        let url = format!(
            "{}/net/minecraftforge/forge/{v}/forge-{v}-installer.jar",
            base,
            v = version
        );
        load_installer(&ctx, LoaderKind::Forge, &version, &[url])
            .await
            .map(Some)
    }
}

/// Forge versions are published as `<game>-<forge>`; a bare Forge version is
/// prefixed with the game version.
pub fn forge_version_id(game_version: &str, loader_version: &str) -> String {
    let prefix = format!("{game_version}-");
    if loader_version.starts_with(&prefix) {
        loader_version.to_string()
    } else {
        format!("{prefix}{loader_version}")
    }
}

async fn latest_forge_version(ctx: &ResolveContext<'_>) -> LauncherResult<String> {
    let entry = CacheEntry::best_effort(
        ctx.config.paths.cache_file("forge/promotions_slim.json"),
        &ctx.config.endpoints().forge_promotions,
    );
    let promotions: Promotions = ctx.cache.resolve_json(&entry).await?;
    let key = format!("{}-latest", ctx.game_version);
    promotions
        .promos
        .get(&key)
        .map(|v| forge_version_id(ctx.game_version, v))
        .ok_or_else(|| {
            LauncherError::InvalidVersion(format!(
                "no Forge release promoted for Minecraft {}",
                ctx.game_version
            ))
        })
}

/// Fetches the installer from the first URL that exists, then reads its
/// profile and version JSON.
///
/// Installer libraries are appended with [`LibraryOrigin::Installer`] so they
/// are downloaded for the processors but kept off the game classpath.
pub(crate) async fn load_installer(
    ctx: &ResolveContext<'_>,
    kind: LoaderKind,
    version: &str,
    urls: &[String],
) -> LauncherResult<LoaderResolution> {
    let archive = fetch_installer(ctx, kind, version, urls)
        .await
        .stage("fetch installer")?;

    let path = archive.clone();
    let (profile, version_json) = tokio::task::spawn_blocking(move || read_installer(&path))
        .await
        .map_err(|e| LauncherError::Other(format!("installer read task failed: {e}")))?
        .stage("read installer")?;

    let mut metadata = LoaderMetadata::from_json(kind, version_json, LibraryOrigin::Loader);
    metadata.libraries.extend(profile.libraries());

    // The official client is produced locally from the base game download.
    if let Some(official) = profile.data_specifier(OFFICIAL_CLIENT_VARIABLE)? {
        let artifact = Artifact {
            path: official.path(),
            url: None,
            sha1: None,
            size: None,
        };
        metadata
            .libraries
            .push(Library::simple(official, artifact, LibraryOrigin::Loader));
    }

    debug!(
        "{} {}: {} libraries, {} processors",
        kind,
        version,
        metadata.libraries.len(),
        profile.processors.len()
    );

    Ok(LoaderResolution {
        metadata,
        installer: Some(InstallerBundle {
            kind,
            version: version.to_string(),
            archive,
            profile,
        }),
    })
}

async fn fetch_installer(
    ctx: &ResolveContext<'_>,
    kind: LoaderKind,
    version: &str,
    urls: &[String],
) -> LauncherResult<PathBuf> {
    for url in urls {
        let file_name = url.rsplit('/').next().unwrap_or(url.as_str());
        let entry = CacheEntry::immutable(
            ctx.config
                .paths
                .cache_file(&format!("{}/{}", kind, file_name)),
            url,
        );
        match ctx.cache.ensure(&entry).await {
            Ok(path) => return Ok(path),
            Err(err) if err.is_not_found() => {
                debug!("No installer at {}", url);
            }
            Err(err) => return Err(err),
        }
    }

    Err(LauncherError::InvalidVersion(format!(
        "no {kind} installer published for {version}"
    )))
}

fn read_installer(path: &std::path::Path) -> LauncherResult<(InstallProfile, VersionJson)> {
    let mut archive = InstallerArchive::open(path)?;
    let profile: InstallProfile = archive.read_json(INSTALL_PROFILE_ENTRY)?;
    let version_json: VersionJson = archive.read_json(&profile.version_json_entry())?;
    Ok((profile, version_json))
}
