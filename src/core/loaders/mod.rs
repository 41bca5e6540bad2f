pub mod context;
pub mod fabric;
pub mod forge;
pub mod neoforge;
pub mod quilt;
pub mod strategy;
pub mod vanilla;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::LauncherError;

pub use context::ResolveContext;
pub use strategy::{resolve_metadata, LoaderResolution, LoaderStrategy, ResolvedMetadata, Strategy};

/// The fixed set of supported loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    #[default]
    Vanilla,
    Fabric,
    Quilt,
    Forge,
    NeoForge,
}

impl LoaderKind {
    /// Loaders that ship as an installer archive with post-processors.
    pub fn uses_installer(&self) -> bool {
        matches!(self, LoaderKind::Forge | LoaderKind::NeoForge)
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::Vanilla => write!(f, "vanilla"),
            LoaderKind::Fabric => write!(f, "fabric"),
            LoaderKind::Quilt => write!(f, "quilt"),
            LoaderKind::Forge => write!(f, "forge"),
            LoaderKind::NeoForge => write!(f, "neoforge"),
        }
    }
}

impl FromStr for LoaderKind {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" | "" => Ok(LoaderKind::Vanilla),
            "fabric" => Ok(LoaderKind::Fabric),
            "quilt" => Ok(LoaderKind::Quilt),
            "forge" => Ok(LoaderKind::Forge),
            "neoforge" => Ok(LoaderKind::NeoForge),
            other => Err(LauncherError::Other(format!("unknown loader {other:?}"))),
        }
    }
}
