// ─── Install Profile ───
// `install_profile.json` as shipped inside Forge and NeoForge installers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::core::error::LauncherResult;
use crate::core::libraries::{Library, LibraryOrigin};
use crate::core::loaders::LoaderKind;
use crate::core::maven::LibrarySpecifier;
use crate::core::version::LibraryEntry;

/// Variable holding the path of the final patched client jar.
pub const PATCHED_VARIABLE: &str = "PATCHED";
/// Variable holding the official client the processors start from.
pub const OFFICIAL_CLIENT_VARIABLE: &str = "MC_OFF";

#[derive(Debug, Clone, Deserialize)]
pub struct InstallProfile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub minecraft: Option<String>,
    /// Archive path of the version JSON, usually `/version.json`.
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, DataEntry>,
    #[serde(default)]
    pub processors: Vec<ProcessorStep>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataEntry {
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub server: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorStep {
    /// Empty means every side.
    #[serde(default)]
    pub sides: Vec<String>,
    pub jar: LibrarySpecifier,
    #[serde(default)]
    pub classpath: Vec<LibrarySpecifier>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Expected output files and their hashes, both as argument templates.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl ProcessorStep {
    pub fn runs_on_client(&self) -> bool {
        self.sides.is_empty() || self.sides.iter().any(|s| s == "client")
    }
}

impl InstallProfile {
    /// Entry name of the embedded version JSON.
    pub fn version_json_entry(&self) -> String {
        self.json
            .as_deref()
            .unwrap_or("/version.json")
            .trim_start_matches('/')
            .to_string()
    }

    /// Client processors in declared order.
    pub fn client_processors(&self) -> impl Iterator<Item = &ProcessorStep> {
        self.processors.iter().filter(|p| p.runs_on_client())
    }

    /// A `[coord]` data value as a specifier.
    pub fn data_specifier(&self, name: &str) -> LauncherResult<Option<LibrarySpecifier>> {
        let Some(entry) = self.data.get(name) else {
            return Ok(None);
        };
        let value = entry.client.trim();
        match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            Some(coord) => LibrarySpecifier::parse(coord).map(Some),
            None => Ok(None),
        }
    }

    /// The marker whose existence means the processors already ran.
    pub fn patched_output(&self) -> LauncherResult<Option<LibrarySpecifier>> {
        self.data_specifier(PATCHED_VARIABLE)
    }

    pub fn libraries(&self) -> Vec<Library> {
        self.libraries
            .iter()
            .cloned()
            .map(|l| l.into_library(LibraryOrigin::Installer))
            .collect()
    }

    /// Profile libraries keyed by coordinate, for processor jar and
    /// classpath lookups.
    pub fn library_map(&self) -> BTreeMap<LibrarySpecifier, Library> {
        self.libraries()
            .into_iter()
            .map(|l| (l.specifier.clone(), l))
            .collect()
    }
}

/// A downloaded installer plus its parsed profile.
#[derive(Debug, Clone)]
pub struct InstallerBundle {
    pub kind: LoaderKind,
    pub version: String,
    pub archive: PathBuf,
    pub profile: InstallProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> InstallProfile {
        serde_json::from_value(serde_json::json!({
            "spec": 1,
            "version": "1.20.1-forge-47.2.0",
            "json": "/version.json",
            "minecraft": "1.20.1",
            "data": {
                "MAPPINGS": {"client": "[de.oceanlabs.mcp:mcp_config:1.20.1-20230612.114412:mappings@txt]", "server": "[x:y:1]"},
                "PATCHED": {"client": "[net.minecraftforge:forge:1.20.1-47.2.0:client]", "server": "[x:y:1]"},
                "BINPATCH": {"client": "/data/client.lzma", "server": "/data/server.lzma"}
            },
            "processors": [
                {"sides": ["server"], "jar": "a:server-only:1", "args": []},
                {"jar": "a:both:1", "classpath": ["a:dep:1"], "args": ["--x"]},
                {"sides": ["client"], "jar": "a:client-only:1", "args": []}
            ],
            "libraries": [{"name": "a:both:1", "downloads": {"artifact": {"path": "a/both/1/both-1.jar", "url": "https://m/a/both/1/both-1.jar", "sha1": "aa", "size": 1}}}]
        }))
        .unwrap()
    }

    #[test]
    fn client_processors_keep_declared_order() {
        let p = profile();
        let jars: Vec<String> = p.client_processors().map(|s| s.jar.artifact.clone()).collect();
        assert_eq!(jars, vec!["both", "client-only"]);
    }

    #[test]
    fn patched_marker_is_a_library_coordinate() {
        let p = profile();
        let patched = p.patched_output().unwrap().unwrap();
        assert_eq!(
            patched.path(),
            "net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-client.jar"
        );
        assert!(p.data_specifier("BINPATCH").unwrap().is_none());
        assert_eq!(p.version_json_entry(), "version.json");
    }

    #[test]
    fn profile_libraries_are_installer_only() {
        let map = profile().library_map();
        let lib = map.values().next().unwrap();
        assert_eq!(lib.origin, LibraryOrigin::Installer);
    }
}
