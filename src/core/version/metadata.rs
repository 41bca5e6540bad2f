// ─── Version Metadata ───
// The merged, validated view of one game version plus an optional loader.

use tracing::debug;

use super::arguments::{legacy_templates, ArgumentTemplate};
use super::version_file::{AssetIndexRef, VersionJson};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::libraries::{Artifact, Library, LibraryOrigin};
use crate::core::loaders::LoaderKind;
use crate::core::maven::LibrarySpecifier;

#[derive(Debug, Clone, PartialEq)]
pub struct VersionMetadata {
    pub id: String,
    pub version_type: String,
    pub main_class: String,
    pub jvm_args: Vec<ArgumentTemplate>,
    pub game_args: Vec<ArgumentTemplate>,
    pub asset_index: AssetIndexRef,
    /// `downloads.client` of the base game.
    pub client: Option<Artifact>,
    pub libraries: Vec<Library>,
    pub loader: LoaderKind,
    pub loader_id: Option<String>,
    pub java_major: Option<u32>,
}

/// What a loader contributes on top of the base game.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderMetadata {
    pub kind: LoaderKind,
    pub id: String,
    pub main_class: Option<String>,
    pub jvm_args: Vec<ArgumentTemplate>,
    pub game_args: Vec<ArgumentTemplate>,
    pub libraries: Vec<Library>,
    /// Base version the profile declares it extends.
    pub inherits_from: Option<String>,
}

impl VersionMetadata {
    pub fn from_json(json: VersionJson) -> LauncherResult<Self> {
        let main_class = json
            .main_class
            .filter(|m| !m.is_empty())
            .ok_or_else(|| LauncherError::InvalidVersion(format!("{}: missing mainClass", json.id)))?;
        let asset_index = json
            .asset_index
            .ok_or_else(|| LauncherError::InvalidVersion(format!("{}: missing assetIndex", json.id)))?;

        let (jvm_args, game_args) = match (json.arguments, json.minecraft_arguments) {
            (Some(args), _) => (args.jvm, args.game),
            (None, legacy) => (
                default_legacy_jvm_args(),
                legacy.as_deref().map(legacy_templates).unwrap_or_default(),
            ),
        };

        let client = json
            .downloads
            .and_then(|d| d.client)
            .map(|c| c.to_artifact(client_jar_path(&json.id)));

        Ok(Self {
            libraries: json
                .libraries
                .into_iter()
                .map(|l| l.into_library(LibraryOrigin::Base))
                .collect(),
            id: json.id,
            version_type: json.version_type.unwrap_or_else(|| "release".into()),
            main_class,
            jvm_args,
            game_args,
            asset_index,
            client,
            loader: LoaderKind::Vanilla,
            loader_id: None,
            java_major: json.java_version.map(|j| j.major_version),
        })
    }

    /// The base client jar as a library, so it is classified and downloaded
    /// like any other file.
    pub fn client_library(&self) -> Option<Library> {
        let artifact = self.client.clone()?;
        let specifier = LibrarySpecifier {
            group: "com.mojang".into(),
            artifact: "minecraft".into(),
            version: self.id.clone(),
            classifier: None,
            extension: "jar".into(),
        };
        Some(Library::simple(specifier, artifact, LibraryOrigin::Base))
    }

    /// Loader main class replaces the base one, non-empty loader JVM args
    /// replace the base ones, game args and libraries are appended.
    pub fn merge(mut self, loader: LoaderMetadata) -> Self {
        debug!(
            "Merging {} ({} libraries) into {}",
            loader.id,
            loader.libraries.len(),
            self.id
        );

        if let Some(main_class) = loader.main_class.filter(|m| !m.is_empty()) {
            self.main_class = main_class;
        }
        if !loader.jvm_args.is_empty() {
            self.jvm_args = loader.jvm_args;
        }
        self.game_args.extend(loader.game_args);
        self.libraries.extend(loader.libraries);
        self.loader = loader.kind;
        self.loader_id = Some(loader.id);
        self
    }
}

impl LoaderMetadata {
    /// Reads a loader profile or installer `version.json`.
    pub fn from_json(kind: LoaderKind, json: VersionJson, origin: LibraryOrigin) -> Self {
        let (jvm_args, game_args) = match (json.arguments, json.minecraft_arguments) {
            (Some(args), _) => (args.jvm, args.game),
            // Pre-1.13 installers restate the full legacy argument string,
            // which is a superset of the base one.
            (None, Some(legacy)) => (Vec::new(), legacy_templates(&legacy)),
            (None, None) => (Vec::new(), Vec::new()),
        };

        Self {
            kind,
            id: json.id,
            inherits_from: json.inherits_from,
            main_class: json.main_class,
            jvm_args,
            game_args,
            libraries: json
                .libraries
                .into_iter()
                .map(|l| l.into_library(origin))
                .collect(),
        }
    }

    /// A profile built for another game version must not be merged onto `base_id`.
    pub fn check_parent(&self, base_id: &str) -> LauncherResult<()> {
        match &self.inherits_from {
            Some(parent) if parent != base_id => Err(LauncherError::InvalidVersion(format!(
                "{} inherits from {}, not {}",
                self.id, parent, base_id
            ))),
            _ => Ok(()),
        }
    }
}

/// `com/mojang/minecraft/<id>/<id>.jar`
pub fn client_jar_path(id: &str) -> String {
    format!("com/mojang/minecraft/{id}/{id}.jar")
}

fn default_legacy_jvm_args() -> Vec<ArgumentTemplate> {
    ["-Djava.library.path=${natives_directory}", "-cp", "${classpath}"]
        .into_iter()
        .map(|s| ArgumentTemplate::Plain(s.to_string()))
        .collect()
}
