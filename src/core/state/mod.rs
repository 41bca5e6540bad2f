mod paths;
mod settings;

use std::path::PathBuf;

pub use paths::LauncherPaths;
pub use settings::{Endpoints, LauncherSettings, DEFAULT_DOWNLOAD_CONCURRENCY};

use crate::core::error::LauncherResult;

/// Configuration built once at startup and passed by reference to every stage.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub paths: LauncherPaths,
    pub settings: LauncherSettings,
}

impl EngineConfig {
    pub fn new(paths: LauncherPaths, settings: LauncherSettings) -> Self {
        Self { paths, settings }
    }

    /// Loads `launcher_settings.json` from `root` and creates the directory tree.
    pub fn load(root: impl Into<PathBuf>) -> LauncherResult<Self> {
        let paths = LauncherPaths::new(root);
        paths.ensure_dirs()?;
        let settings = LauncherSettings::load(&paths.settings_file())?;
        Ok(Self { paths, settings })
    }

    pub fn load_default() -> LauncherResult<Self> {
        Self::load(LauncherPaths::default_root())
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.settings.endpoints
    }
}
