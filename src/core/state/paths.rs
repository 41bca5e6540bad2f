use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "Blocklaunch";

/// Every on-disk location the engine reads or writes, derived from one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    pub root: PathBuf,
    pub libraries: PathBuf,
    pub assets: PathBuf,
    pub caches: PathBuf,
    pub tmp: PathBuf,
    pub natives: PathBuf,
    pub instances: PathBuf,
}

impl LauncherPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            libraries: root.join("libraries"),
            assets: root.join("assets"),
            caches: root.join("caches"),
            tmp: root.join("tmp"),
            natives: root.join("natives"),
            instances: root.join("instances"),
            root,
        }
    }

    /// `dirs::data_dir()/Blocklaunch`, or the working directory when the
    /// platform has no data dir.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    pub fn asset_indexes(&self) -> PathBuf {
        self.assets.join("indexes")
    }

    pub fn asset_objects(&self) -> PathBuf {
        self.assets.join("objects")
    }

    pub fn natives_for(&self, version_id: &str) -> PathBuf {
        self.natives.join(version_id)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("launcher_settings.json")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".blocklaunch.lock")
    }

    /// Resolves a `/`-separated cache key under `caches/`.
    pub fn cache_file(&self, key: &str) -> PathBuf {
        join_relative(&self.caches, key)
    }

    /// Resolves a `/`-separated Maven layout path under `libraries/`.
    pub fn library_file(&self, relative: &str) -> PathBuf {
        join_relative(&self.libraries, relative)
    }

    pub fn ensure_dirs(&self) -> LauncherResult<()> {
        for dir in [
            &self.root,
            &self.libraries,
            &self.assets,
            &self.caches,
            &self.tmp,
        ] {
            std::fs::create_dir_all(dir).map_err(|source| LauncherError::io(dir, source))?;
        }
        Ok(())
    }
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_file_follows_maven_layout() {
        let paths = LauncherPaths::new("/data");
        assert_eq!(
            paths.library_file("org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar"),
            PathBuf::from("/data/libraries/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar")
        );
    }

    #[test]
    fn cache_file_ignores_leading_slash() {
        let paths = LauncherPaths::new("/data");
        assert_eq!(
            paths.cache_file("/minecraft/version_manifest.json"),
            PathBuf::from("/data/caches/minecraft/version_manifest.json")
        );
    }
}
