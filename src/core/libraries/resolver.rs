// ─── Library Resolver ───
// Turns the merged library list into a classified runtime set.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument};

use super::hotfix::{apply_hotfix, drop_redundant_asm};
use super::model::{Library, LibraryOrigin, RuntimeLibrary};
use crate::core::cache::ResourceCache;
use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::LoaderKind;
use crate::core::maven::LibrarySpecifier;
use crate::core::state::{EngineConfig, LauncherPaths};
use crate::core::version::{Platform, VersionMetadata};

/// A runtime library plus its installedness at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    pub library: RuntimeLibrary,
    pub installed: bool,
}

/// Every platform-passing library in declared order, each either installed
/// or required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySet {
    entries: Vec<ResolvedLibrary>,
}

impl LibrarySet {
    pub fn from_entries(entries: Vec<ResolvedLibrary>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ResolvedLibrary] {
        &self.entries
    }

    pub fn installed(&self) -> impl Iterator<Item = &RuntimeLibrary> {
        self.entries.iter().filter(|e| e.installed).map(|e| &e.library)
    }

    pub fn required(&self) -> impl Iterator<Item = &RuntimeLibrary> {
        self.entries.iter().filter(|e| !e.installed).map(|e| &e.library)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn required_count(&self) -> usize {
        self.required().count()
    }

    pub fn download_tasks(&self, paths: &LauncherPaths) -> Vec<DownloadTask> {
        self.required()
            .filter_map(|l| l.artifact.download_task(paths))
            .collect()
    }

    /// Classpath entries in declared order. Natives and installer-only jars
    /// are left out.
    pub fn classpath(&self, paths: &LauncherPaths) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| &e.library)
            .filter(|l| l.on_classpath())
            .map(|l| l.runtime_path(paths))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    /// Legacy natives jars to extract before launch.
    pub fn natives(&self) -> impl Iterator<Item = &RuntimeLibrary> {
        self.entries.iter().map(|e| &e.library).filter(|l| l.native)
    }
}

/// Filters, fixes and classifies the libraries of `metadata`, with the
/// client jar appended last.
#[instrument(skip_all, fields(version = %metadata.id))]
pub async fn resolve_libraries(
    config: &EngineConfig,
    cache: &ResourceCache,
    platform: &Platform,
    metadata: &VersionMetadata,
) -> LauncherResult<LibrarySet> {
    let mut libraries = metadata.libraries.clone();
    if let Some(client) = metadata.client_library() {
        libraries.push(client);
    }

    if metadata.loader == LoaderKind::Fabric {
        drop_redundant_asm(&mut libraries);
    }
    let libraries = dedup_libraries(libraries);

    let mut runtime = Vec::new();
    for library in &libraries {
        if !library.should_install(platform)? {
            debug!("Skipping {} on {:?}", library.specifier, platform.os);
            continue;
        }
        runtime.extend(library.expand(platform));
    }

    let mut fixed = Vec::with_capacity(runtime.len());
    for library in runtime {
        fixed.push(apply_hotfix(library, platform, config, cache).await);
    }

    let paths = &config.paths;
    let entries: Vec<ResolvedLibrary> = stream::iter(fixed)
        .map(|library| async move {
            let installed = classify(&library, paths).await?;
            Ok::<_, LauncherError>(ResolvedLibrary { library, installed })
        })
        .buffered(cache.downloader().concurrency())
        .try_collect()
        .await?;

    let set = LibrarySet::from_entries(entries);
    info!(
        "Libraries: {} total, {} required",
        set.len(),
        set.required_count()
    );
    Ok(set)
}

/// A library without a download URL is provided by something else and is
/// treated as installed.
async fn classify(library: &RuntimeLibrary, paths: &LauncherPaths) -> LauncherResult<bool> {
    if library.artifact.url.is_none() {
        return Ok(true);
    }
    ResourceCache::installed(&library.artifact.cache_entry(paths)).await
}

/// Launch-classpath libraries win over installer-only ones, and loader
/// libraries win over everything.
fn precedence(origin: LibraryOrigin) -> u8 {
    match origin {
        LibraryOrigin::Loader => 2,
        LibraryOrigin::Base => 1,
        LibraryOrigin::Installer => 0,
    }
}

/// Drops base-game libraries that a loader library supersedes, and keeps a
/// single entry per coordinate: the first one with the strongest origin.
pub fn dedup_libraries(libraries: Vec<Library>) -> Vec<Library> {
    let loader_keys: HashSet<String> = libraries
        .iter()
        .filter(|l| l.origin == LibraryOrigin::Loader)
        .map(|l| l.specifier.dedup_key())
        .collect();

    let mut strongest: HashMap<LibrarySpecifier, LibraryOrigin> = HashMap::new();
    for l in &libraries {
        strongest
            .entry(l.specifier.clone())
            .and_modify(|origin| {
                if precedence(l.origin) > precedence(*origin) {
                    *origin = l.origin;
                }
            })
            .or_insert(l.origin);
    }

    let mut seen = HashSet::new();
    libraries
        .into_iter()
        .filter(|l| {
            if l.origin == LibraryOrigin::Base && loader_keys.contains(&l.specifier.dedup_key()) {
                debug!("{} superseded by loader", l.specifier);
                return false;
            }
            strongest.get(&l.specifier) == Some(&l.origin) && seen.insert(l.specifier.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::Downloader;
    use crate::core::http::build_http_client;
    use crate::core::libraries::model::Artifact;
    use crate::core::state::LauncherSettings;
    use crate::core::version::{Arch, OsName, PlatformRule, VersionJson};
    use sha1::{Digest, Sha1};

    const LINUX: Platform = Platform {
        os: OsName::Linux,
        arch: Arch::X86_64,
    };

    fn lib(coord: &str, origin: LibraryOrigin) -> Library {
        let spec = LibrarySpecifier::parse(coord).unwrap();
        let artifact = Artifact {
            path: spec.path(),
            url: Some(spec.url("https://libraries.example")),
            sha1: None,
            size: None,
        };
        Library::simple(spec, artifact, origin)
    }

    fn setup(root: &std::path::Path) -> (EngineConfig, ResourceCache) {
        let config = EngineConfig::new(LauncherPaths::new(root), LauncherSettings::default());
        let cache = ResourceCache::new(Downloader::new(build_http_client().unwrap()));
        (config, cache)
    }

    fn metadata(libraries: Vec<Library>) -> VersionMetadata {
        let json: VersionJson = serde_json::from_value(serde_json::json!({
            "id": "1.20.4",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": {"id": "12", "url": "https://x/12.json", "sha1": "ab"},
            "downloads": {"client": {"url": "https://x/client.jar", "sha1": "00", "size": 3}}
        }))
        .unwrap();
        let mut meta = VersionMetadata::from_json(json).unwrap();
        meta.libraries = libraries;
        meta
    }

    #[test]
    fn loader_library_supersedes_base_with_same_key() {
        let out = dedup_libraries(vec![
            lib("org.ow2.asm:asm:9.3", LibraryOrigin::Base),
            lib("com.google.guava:guava:32.1.2-jre", LibraryOrigin::Base),
            lib("org.ow2.asm:asm:9.6", LibraryOrigin::Loader),
            lib("org.ow2.asm:asm:9.6", LibraryOrigin::Loader),
        ]);
        let names: Vec<String> = out.iter().map(|l| l.specifier.to_string()).collect();
        assert_eq!(names, vec!["com.google.guava:guava:32.1.2-jre", "org.ow2.asm:asm:9.6"]);
    }

    #[test]
    fn shared_coordinate_keeps_one_entry_with_the_strongest_origin() {
        let out = dedup_libraries(vec![
            lib("net.minecraftforge:installertools:1.4.1", LibraryOrigin::Installer),
            lib("net.sf.jopt-simple:jopt-simple:5.0.4", LibraryOrigin::Base),
            lib("net.minecraftforge:fmlloader:1.20.1-47.2.0", LibraryOrigin::Installer),
            lib("net.minecraftforge:fmlloader:1.20.1-47.2.0", LibraryOrigin::Loader),
            lib("net.sf.jopt-simple:jopt-simple:5.0.4", LibraryOrigin::Installer),
        ]);
        let kept: Vec<(String, LibraryOrigin)> = out
            .iter()
            .map(|l| (l.specifier.artifact.clone(), l.origin))
            .collect();
        assert_eq!(
            kept,
            vec![
                ("installertools".to_string(), LibraryOrigin::Installer),
                ("jopt-simple".to_string(), LibraryOrigin::Base),
                ("fmlloader".to_string(), LibraryOrigin::Loader),
            ]
        );
    }

    #[tokio::test]
    async fn classification_partitions_the_filtered_set() {
        let dir = tempfile::tempdir().unwrap();
        let (config, cache) = setup(dir.path());

        let present = lib("com.example:present:1.0", LibraryOrigin::Base);
        let mut hashed = lib("com.example:hashed:1.0", LibraryOrigin::Base);
        let corrupt = lib("com.example:corrupt:1.0", LibraryOrigin::Base);
        let missing = lib("com.example:missing:1.0", LibraryOrigin::Base);
        let mut mac_only = lib("com.example:mac:1.0", LibraryOrigin::Base);
        mac_only.rules = vec![PlatformRule::allow_os("osx")];

        let body = b"hashed jar";
        hashed.artifact.as_mut().unwrap().sha1 = Some(hex::encode(Sha1::digest(body)));

        for (l, content) in [(&present, &b"x"[..]), (&hashed, &body[..]), (&corrupt, &b"y"[..])] {
            let path = config.paths.library_file(&l.artifact.as_ref().unwrap().path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
        }
        let mut corrupt = corrupt;
        corrupt.artifact.as_mut().unwrap().sha1 = Some("0".repeat(40));

        let meta = metadata(vec![present, hashed, corrupt, missing, mac_only]);
        let set = resolve_libraries(&config, &cache, &LINUX, &meta).await.unwrap();

        let installed: Vec<String> = set.installed().map(|l| l.specifier.artifact.clone()).collect();
        let required: Vec<String> = set.required().map(|l| l.specifier.artifact.clone()).collect();
        assert_eq!(installed, vec!["present", "hashed"]);
        assert_eq!(required, vec!["corrupt", "missing", "minecraft"]);
        assert_eq!(set.len(), installed.len() + required.len());
        assert_eq!(set.download_tasks(&config.paths).len(), 3);
    }

    #[tokio::test]
    async fn installer_libraries_and_natives_stay_off_classpath() {
        let dir = tempfile::tempdir().unwrap();
        let (config, cache) = setup(dir.path());

        let mut provided = lib("net.minecraftforge:forge:1.20.1-47.2.0:client", LibraryOrigin::Loader);
        provided.artifact.as_mut().unwrap().url = None;
        let installer = lib("net.minecraftforge:installertools:1.3.0", LibraryOrigin::Installer);

        let mut meta = metadata(vec![provided, installer]);
        meta.client = None;
        let set = resolve_libraries(&config, &cache, &LINUX, &meta).await.unwrap();

        assert_eq!(set.installed().count(), 1);
        let cp = set.classpath(&config.paths);
        assert_eq!(cp.len(), 1);
        assert!(cp[0].ends_with("forge-1.20.1-47.2.0-client.jar"));
    }
}
