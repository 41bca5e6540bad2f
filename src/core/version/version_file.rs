// ─── Version File ───
// Raw shape of a version JSON. The same document format is served by Mojang,
// by Fabric/Quilt meta as loader profiles, and shipped inside Forge/NeoForge
// installers as `version.json`.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use super::arguments::ArgumentTemplate;
use super::rules::{OsName, PlatformRule};
use crate::core::libraries::{Artifact, Library, LibraryOrigin};
use crate::core::maven::LibrarySpecifier;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub major_version: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<DownloadArtifact>,
}

/// Reference from version metadata to its asset index document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    pub sha1: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentTemplate>,
    #[serde(default)]
    pub jvm: Vec<ArgumentTemplate>,
}

// ─── Library Entry ───

/// A library as written in metadata. Mojang entries carry `downloads`;
/// Fabric-style entries carry a repository `url` and optional hash.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: LibrarySpecifier,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub rules: Vec<PlatformRule>,
    #[serde(default)]
    pub natives: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<DownloadArtifact>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl DownloadArtifact {
    pub fn to_artifact(&self, fallback_path: String) -> Artifact {
        Artifact {
            path: non_empty(self.path.as_deref()).unwrap_or(fallback_path),
            url: non_empty(self.url.as_deref()),
            sha1: non_empty(self.sha1.as_deref()),
            size: self.size,
        }
    }
}

impl LibraryEntry {
    pub fn into_library(self, origin: LibraryOrigin) -> Library {
        let default_path = self.name.path();

        let artifact = match (&self.downloads, non_empty(self.url.as_deref())) {
            (Some(downloads), _) => downloads
                .artifact
                .as_ref()
                .map(|a| a.to_artifact(default_path.clone())),
            (None, Some(repo)) => Some(Artifact {
                path: default_path.clone(),
                url: Some(self.name.url(&repo)),
                sha1: non_empty(self.sha1.as_deref()),
                size: self.size,
            }),
            // Natives-only entries have nothing on the classpath themselves.
            (None, None) if !self.natives.is_empty() => None,
            (None, None) => Some(Artifact {
                path: default_path.clone(),
                url: None,
                sha1: non_empty(self.sha1.as_deref()),
                size: self.size,
            }),
        };

        let mut natives = BTreeMap::new();
        for (os, classifier) in &self.natives {
            match OsName::parse(os) {
                Some(os) => {
                    natives.insert(os, classifier.clone());
                }
                None => warn!("{}: ignoring natives for unknown os {:?}", self.name, os),
            }
        }

        let classifiers = self
            .downloads
            .as_ref()
            .map(|d| {
                d.classifiers
                    .iter()
                    .map(|(name, a)| {
                        let fallback = self.name.with_classifier(name).path();
                        (name.clone(), a.to_artifact(fallback))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Library {
            specifier: self.name,
            artifact,
            rules: self.rules,
            natives,
            classifiers,
            origin,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
