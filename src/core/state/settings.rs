use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 6;
const MAX_DOWNLOAD_CONCURRENCY: usize = 16;

/// Upstream base URLs. Overridable so the engine can run against a mirror or
/// a local mock server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest: String,
    pub resources: String,
    pub maven_central: String,
    pub fabric_meta: String,
    pub quilt_meta: String,
    pub forge_maven: String,
    pub forge_promotions: String,
    pub neoforge_maven: String,
    pub neoforge_latest: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json"
                .into(),
            resources: "https://resources.download.minecraft.net".into(),
            maven_central: "https://repo1.maven.org/maven2".into(),
            fabric_meta: "https://meta.fabricmc.net/v2".into(),
            quilt_meta: "https://meta.quiltmc.org/v3".into(),
            forge_maven: "https://maven.minecraftforge.net".into(),
            forge_promotions:
                "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json"
                    .into(),
            neoforge_maven: "https://maven.neoforged.net/releases".into(),
            neoforge_latest: "https://maven.neoforged.net/api/maven/latest/version/releases"
                .into(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at one base URL, using the same path layout as
    /// the public services.
    pub fn mirrored(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            version_manifest: format!("{base}/mc/game/version_manifest_v2.json"),
            resources: format!("{base}/resources"),
            maven_central: format!("{base}/maven2"),
            fabric_meta: format!("{base}/fabric/v2"),
            quilt_meta: format!("{base}/quilt/v3"),
            forge_maven: format!("{base}/forge-maven"),
            forge_promotions: format!("{base}/forge/promotions_slim.json"),
            neoforge_maven: format!("{base}/neoforge-maven"),
            neoforge_latest: format!("{base}/neoforge/api/maven/latest/version/releases"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub download_concurrency: usize,
    pub java_path: Option<PathBuf>,
    pub endpoints: Endpoints,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            java_path: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl LauncherSettings {
    /// Reads `path`, falling back to defaults when the file is missing.
    /// A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(LauncherError::io(path, source)),
        };
        let mut settings: Self = serde_json::from_str(&raw)?;
        settings.download_concurrency = settings.effective_concurrency();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::io(parent, source))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| LauncherError::io(path, source))
    }

    pub fn effective_concurrency(&self) -> usize {
        if self.download_concurrency == 0 || self.download_concurrency > MAX_DOWNLOAD_CONCURRENCY {
            warn!(
                "download_concurrency={} out of range, clamping",
                self.download_concurrency
            );
        }
        self.download_concurrency.clamp(1, MAX_DOWNLOAD_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LauncherSettings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.download_concurrency, DEFAULT_DOWNLOAD_CONCURRENCY);
        assert_eq!(settings.endpoints, Endpoints::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher_settings.json");
        std::fs::write(
            &path,
            r#"{"download_concurrency": 64, "endpoints": {"fabric_meta": "http://mirror/v2"}}"#,
        )
        .unwrap();

        let settings = LauncherSettings::load(&path).unwrap();
        assert_eq!(settings.download_concurrency, 16);
        assert_eq!(settings.endpoints.fabric_meta, "http://mirror/v2");
        assert_eq!(
            settings.endpoints.quilt_meta,
            Endpoints::default().quilt_meta
        );
    }

    #[test]
    fn save_then_load_preserves_java_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher_settings.json");
        let settings = LauncherSettings {
            java_path: Some(PathBuf::from("/opt/jdk/bin/java")),
            ..LauncherSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = LauncherSettings::load(&path).unwrap();
        assert_eq!(loaded.java_path, Some(PathBuf::from("/opt/jdk/bin/java")));
    }
}
