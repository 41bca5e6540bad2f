// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest v2.

use serde::Deserialize;
use tracing::info;

use crate::core::cache::{CacheEntry, ResourceCache};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::EngineConfig;

/// Top-level Mojang version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    #[serde(rename = "releaseTime", default)]
    pub release_time: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetches the manifest. It has no known hash, so a failed refresh falls
    /// back to the last cached copy.
    pub async fn fetch(config: &EngineConfig, cache: &ResourceCache) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let entry = CacheEntry::best_effort(
            config.paths.cache_file("minecraft/version_manifest.json"),
            &config.endpoints().version_manifest,
        );
        let manifest: VersionManifest = cache.resolve_json(&entry).await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Maps the `release`/`snapshot` aliases to concrete ids and looks the
    /// result up.
    pub fn resolve(&self, requested: &str) -> LauncherResult<&VersionEntry> {
        let id = match requested {
            "release" => self.latest.release.as_str(),
            "snapshot" => self.latest.snapshot.as_str(),
            other => other,
        };
        self.find_version(id).ok_or_else(|| {
            LauncherError::InvalidVersion(format!("unknown game version {requested:?}"))
        })
    }
}
