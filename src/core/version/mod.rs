pub mod arguments;
pub mod manifest;
pub mod metadata;
pub mod rules;
pub mod version_file;

pub use arguments::{expand_templates, ArgumentTemplate, ArgumentValue};
pub use manifest::{LatestVersions, VersionEntry, VersionManifest};
pub use metadata::{client_jar_path, LoaderMetadata, VersionMetadata};
pub use rules::{rules_allow, Arch, OsName, Platform, PlatformRule};
pub use version_file::{AssetIndexRef, LibraryEntry, VersionJson};
