use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::context::ResolveContext;
use super::strategy::{LoaderResolution, LoaderStrategy};
use super::LoaderKind;
use crate::core::cache::CacheEntry;
use crate::core::error::{LauncherError, LauncherResult, ResultExt};
use crate::core::libraries::{Library, LibraryOrigin};
use crate::core::maven::LibrarySpecifier;
use crate::core::version::{LoaderMetadata, VersionJson};

/// A loader served by a Fabric-style meta API (Fabric itself and Quilt).
#[derive(Debug, Clone, Copy)]
pub struct MetaFlavor {
    pub kind: LoaderKind,
    /// Cache directory and log name.
    pub name: &'static str,
    /// Coordinate prefix of the loader jar itself, `group:artifact`.
    pub loader_artifact: &'static str,
    pub loader_maven: &'static str,
}

pub const FABRIC: MetaFlavor = MetaFlavor {
    kind: LoaderKind::Fabric,
    name: "fabric",
    loader_artifact: "net.fabricmc:fabric-loader",
    loader_maven: "https://maven.fabricmc.net/",
};

/// One entry of `/versions/loader/<game>`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderListEntry {
    pub loader: LoaderVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderVersion {
    pub version: String,
    #[serde(default)]
    pub stable: Option<bool>,
}

pub struct FabricStrategy;

#[async_trait]
impl LoaderStrategy for FabricStrategy {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>> {
        resolve_profile(ctx, FABRIC, &ctx.config.endpoints().fabric_meta)
            .await
            .map(Some)
    }
}

/// Picks a loader version from the meta list and loads its profile document.
pub async fn resolve_profile(
    ctx: ResolveContext<'_>,
    flavor: MetaFlavor,
    meta_base: &str,
) -> LauncherResult<LoaderResolution> {
    let base = meta_base.trim_end_matches('/');
    let versions = fetch_loader_versions(&ctx, flavor, base)
        .await
        .stage("fetch loader versions")?;
    let version = select_loader_version(&versions, &ctx)?;

    info!(
        "Using {} loader {} for Minecraft {}",
        flavor.name, version, ctx.game_version
    );

    let url = format!(
        "{}/versions/loader/{}/{}/profile/json",
        base, ctx.game_version, version
    );
    let entry = CacheEntry::immutable(
        ctx.config
            .paths
            .cache_file(&format!("{}/{}-{}.json", flavor.name, version, ctx.game_version)),
        url,
    );
    let profile: VersionJson = ctx
        .cache
        .resolve_json(&entry)
        .await
        .map_err(not_found_as_invalid(&version))
        .stage("fetch profile")?;

    let mut metadata = LoaderMetadata::from_json(flavor.kind, profile, LibraryOrigin::Loader);
    ensure_loader_artifact(&mut metadata.libraries, flavor, &version)?;
    Ok(LoaderResolution {
        metadata,
        installer: None,
    })
}

async fn fetch_loader_versions(
    ctx: &ResolveContext<'_>,
    flavor: MetaFlavor,
    base: &str,
) -> LauncherResult<Vec<LoaderListEntry>> {
    // The list grows over time, so it is refreshed with an offline fallback.
    let entry = CacheEntry::best_effort(
        ctx.config
            .paths
            .cache_file(&format!("{}/loader-{}.json", flavor.name, ctx.game_version)),
        format!("{}/versions/loader/{}", base, ctx.game_version),
    );
    ctx.cache
        .resolve_json(&entry)
        .await
        .map_err(not_found_as_invalid(ctx.game_version))
}

/// The requested version must be listed; `latest` takes the first (newest)
/// entry.
pub fn select_loader_version(
    versions: &[LoaderListEntry],
    ctx: &ResolveContext<'_>,
) -> LauncherResult<String> {
    if versions.is_empty() {
        return Err(LauncherError::InvalidVersion(format!(
            "no loader versions for Minecraft {}",
            ctx.game_version
        )));
    }

    if ctx.wants_latest() {
        return Ok(versions[0].loader.version.clone());
    }

    versions
        .iter()
        .find(|v| v.loader.version == ctx.loader_version)
        .map(|v| v.loader.version.clone())
        .ok_or_else(|| {
            LauncherError::InvalidVersion(format!(
                "loader {} is not available for Minecraft {}",
                ctx.loader_version, ctx.game_version
            ))
        })
}

/// Profiles normally list the loader jar; older ones relied on the launcher
/// adding it.
fn ensure_loader_artifact(
    libraries: &mut Vec<Library>,
    flavor: MetaFlavor,
    version: &str,
) -> LauncherResult<()> {
    let specifier = LibrarySpecifier::parse(&format!("{}:{}", flavor.loader_artifact, version))?;
    if libraries
        .iter()
        .any(|l| l.specifier.dedup_key() == specifier.dedup_key())
    {
        return Ok(());
    }

    debug!("Adding missing loader artifact {}", specifier);
    let artifact = crate::core::libraries::Artifact {
        path: specifier.path(),
        url: Some(specifier.url(flavor.loader_maven)),
        sha1: None,
        size: None,
    };
    libraries.push(Library::simple(specifier, artifact, LibraryOrigin::Loader));
    Ok(())
}

pub(crate) fn not_found_as_invalid(what: &str) -> impl FnOnce(LauncherError) -> LauncherError {
    let what = what.to_string();
    move |err| {
        if err.is_not_found() {
            LauncherError::InvalidVersion(format!("{what}: {err}"))
        } else {
            err
        }
    }
}
