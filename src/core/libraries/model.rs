use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::cache::{CacheEntry, CachePolicy};
use crate::core::downloader::DownloadTask;
use crate::core::error::LauncherResult;
use crate::core::maven::LibrarySpecifier;
use crate::core::state::LauncherPaths;
use crate::core::version::rules::{rules_allow, OsName, Platform, PlatformRule};

/// A downloadable file in the libraries tree.
///
/// `path` is relative to the libraries root and `/`-separated. The runtime
/// location is always computed from it, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    /// `None` means the file is provided by something else (the base game
    /// download or an installer processor) and is treated as satisfied.
    pub url: Option<String>,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

impl Artifact {
    pub fn runtime_path(&self, paths: &LauncherPaths) -> PathBuf {
        paths.library_file(&self.path)
    }

    pub fn cache_entry(&self, paths: &LauncherPaths) -> CacheEntry {
        CacheEntry {
            local_path: self.runtime_path(paths),
            url: self.url.clone(),
            sha1: self.sha1.clone(),
            policy: CachePolicy::Validated,
        }
    }

    pub fn download_task(&self, paths: &LauncherPaths) -> Option<DownloadTask> {
        Some(DownloadTask {
            url: self.url.clone()?,
            dest: self.runtime_path(paths),
            sha1: self.sha1.clone(),
            size: self.size,
        })
    }
}

/// Where a library entry came from. Later stages use this for deduplication
/// and to keep installer-only jars off the game classpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryOrigin {
    Base,
    Loader,
    /// Listed by an installer profile; needed by processors only.
    Installer,
}

/// One logical library as declared by metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    pub specifier: LibrarySpecifier,
    pub artifact: Option<Artifact>,
    pub rules: Vec<PlatformRule>,
    /// Legacy per-OS native classifier templates, e.g. `natives-windows-${arch}`.
    pub natives: BTreeMap<OsName, String>,
    pub classifiers: BTreeMap<String, Artifact>,
    pub origin: LibraryOrigin,
}

impl Library {
    /// A library with a single artifact and no rules.
    pub fn simple(specifier: LibrarySpecifier, artifact: Artifact, origin: LibraryOrigin) -> Self {
        Self {
            specifier,
            artifact: Some(artifact),
            rules: Vec::new(),
            natives: BTreeMap::new(),
            classifiers: BTreeMap::new(),
            origin,
        }
    }

    pub fn should_install(&self, platform: &Platform) -> LauncherResult<bool> {
        rules_allow(&self.rules, platform)
    }

    /// Expands into the concrete files needed on `platform`: the main
    /// artifact plus the matching legacy native classifier, if any.
    pub fn expand(&self, platform: &Platform) -> Vec<RuntimeLibrary> {
        let mut out = Vec::new();

        if let Some(artifact) = &self.artifact {
            out.push(RuntimeLibrary {
                specifier: self.specifier.clone(),
                artifact: artifact.clone(),
                origin: self.origin,
                native: false,
            });
        }

        if let Some(template) = self.natives.get(&platform.os) {
            let classifier = template.replace("${arch}", platform.arch.pointer_width());
            if let Some(artifact) = self.classifiers.get(&classifier) {
                out.push(RuntimeLibrary {
                    specifier: self.specifier.with_classifier(&classifier),
                    artifact: artifact.clone(),
                    origin: self.origin,
                    native: true,
                });
            } else {
                tracing::warn!(
                    "{} declares native {} but has no matching download",
                    self.specifier,
                    classifier
                );
            }
        }

        out
    }
}

/// A platform-specific file ready for classification and download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLibrary {
    pub specifier: LibrarySpecifier,
    pub artifact: Artifact,
    pub origin: LibraryOrigin,
    /// Legacy natives jar that must be extracted before launch.
    pub native: bool,
}

impl RuntimeLibrary {
    pub fn runtime_path(&self, paths: &LauncherPaths) -> PathBuf {
        self.artifact.runtime_path(paths)
    }

    pub fn on_classpath(&self) -> bool {
        !self.native && self.origin != LibraryOrigin::Installer
    }
}
