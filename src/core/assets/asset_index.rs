use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::core::cache::{is_satisfied, CacheEntry, ResourceCache};
use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::{EngineConfig, LauncherPaths};
use crate::core::version::AssetIndexRef;

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    fn validate(&self, name: &str) -> LauncherResult<()> {
        if self.hash.len() != 40 || !self.hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LauncherError::InvalidAssetObject {
                name: name.to_string(),
                reason: format!("malformed hash {:?}", self.hash),
            });
        }
        Ok(())
    }

    /// `<hh>/<hash>`, shared by the local object tree and the resources host.
    pub fn sharded(&self) -> String {
        format!("{}/{}", &self.hash[..2], self.hash)
    }

    pub fn runtime_path(&self, paths: &LauncherPaths) -> PathBuf {
        paths.asset_objects().join(&self.hash[..2]).join(&self.hash)
    }
}

/// One named asset with its installedness at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub name: String,
    pub object: AssetObject,
    pub installed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    pub index_id: String,
    entries: Vec<ResolvedAsset>,
}

impl AssetSet {
    pub fn entries(&self) -> &[ResolvedAsset] {
        &self.entries
    }

    pub fn installed(&self) -> impl Iterator<Item = &ResolvedAsset> {
        self.entries.iter().filter(|a| a.installed)
    }

    pub fn required(&self) -> impl Iterator<Item = &ResolvedAsset> {
        self.entries.iter().filter(|a| !a.installed)
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

    /// One task per distinct required object; several names may share a hash.
    pub fn download_tasks(&self, paths: &LauncherPaths, resources_base: &str) -> Vec<DownloadTask> {
        let mut seen = HashSet::new();
        self.required()
            .filter(|a| seen.insert(a.object.hash.clone()))
            .map(|a| DownloadTask {
                url: format!(
                    "{}/{}",
                    resources_base.trim_end_matches('/'),
                    a.object.sharded()
                ),
                dest: a.object.runtime_path(paths),
                sha1: Some(a.object.hash.clone()),
                size: Some(a.object.size),
            })
            .collect()
    }
}

/// Fetches the index referenced by the metadata and classifies every object.
#[instrument(skip_all, fields(index = %index_ref.id))]
pub async fn resolve_assets(
    config: &EngineConfig,
    cache: &ResourceCache,
    index_ref: &AssetIndexRef,
) -> LauncherResult<AssetSet> {
    let entry = CacheEntry::verified(
        config.paths.asset_indexes().join(format!("{}.json", index_ref.id)),
        &index_ref.url,
        &index_ref.sha1,
    );
    let index: AssetIndex = cache.resolve_json(&entry).await?;

    for (name, object) in &index.objects {
        object.validate(name)?;
    }

    let paths = &config.paths;
    let entries: Vec<ResolvedAsset> = stream::iter(index.objects)
        .map(|(name, object)| async move {
            let installed =
                is_satisfied(&object.runtime_path(paths), Some(object.hash.as_str())).await?;
            Ok::<_, LauncherError>(ResolvedAsset {
                name,
                object,
                installed,
            })
        })
        .buffered(cache.downloader().concurrency())
        .try_collect()
        .await?;

    let set = AssetSet {
        index_id: index_ref.id.clone(),
        entries,
    };
    info!(
        "Assets: {} objects, {} required",
        set.len(),
        set.required_count()
    );
    Ok(set)
}
