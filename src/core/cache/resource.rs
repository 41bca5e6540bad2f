use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::{CacheEntry, CachePolicy};
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};

/// Local/remote reconciliation over the on-disk cache tree.
#[derive(Clone)]
pub struct ResourceCache {
    downloader: Downloader,
}

impl ResourceCache {
    pub fn new(downloader: Downloader) -> Self {
        Self { downloader }
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// True iff the entry needs no fetch: the file exists and either no hash
    /// is recorded or the recomputed hash matches.
    pub async fn installed(entry: &CacheEntry) -> LauncherResult<bool> {
        is_satisfied(&entry.local_path, entry.sha1.as_deref()).await
    }

    /// Makes sure the entry's file is on disk and returns its path.
    #[instrument(skip(self, entry), fields(path = %entry.local_path.display()))]
    pub async fn ensure(&self, entry: &CacheEntry) -> LauncherResult<PathBuf> {
        match entry.policy {
            CachePolicy::Validated => self.ensure_validated(entry).await?,
            CachePolicy::BestEffort => self.ensure_best_effort(entry).await?,
        }
        Ok(entry.local_path.clone())
    }

    /// Resolves the entry and returns its bytes.
    pub async fn resolve(&self, entry: &CacheEntry) -> LauncherResult<Vec<u8>> {
        let path = self.ensure(entry).await?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    pub async fn resolve_json<T: DeserializeOwned>(&self, entry: &CacheEntry) -> LauncherResult<T> {
        let bytes = self.resolve(entry).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn ensure_validated(&self, entry: &CacheEntry) -> LauncherResult<()> {
        if Self::installed(entry).await? {
            debug!("Cache hit: {:?}", entry.local_path);
            return Ok(());
        }

        let Some(url) = entry.url.as_deref() else {
            return Err(LauncherError::NotCached {
                url: entry.source_label(),
                source: Box::new(LauncherError::Other("no remote source".into())),
            });
        };

        match self
            .downloader
            .download_file(url, &entry.local_path, entry.sha1.as_deref())
            .await
        {
            Ok(_) => Ok(()),
            Err(LauncherError::Cancelled) => Err(LauncherError::Cancelled),
            Err(err) => Err(LauncherError::NotCached {
                url: url.to_string(),
                source: Box::new(err),
            }),
        }
    }

    async fn ensure_best_effort(&self, entry: &CacheEntry) -> LauncherResult<()> {
        let local_exists = tokio::fs::try_exists(&entry.local_path)
            .await
            .unwrap_or(false);

        let Some(url) = entry.url.as_deref() else {
            if local_exists {
                return Ok(());
            }
            return Err(LauncherError::NotCached {
                url: entry.source_label(),
                source: Box::new(LauncherError::Other("no remote source".into())),
            });
        };

        match self
            .downloader
            .download_file(url, &entry.local_path, entry.sha1.as_deref())
            .await
        {
            Ok(_) => Ok(()),
            Err(LauncherError::Cancelled) => Err(LauncherError::Cancelled),
            Err(err) if local_exists => {
                warn!(
                    "Refreshing {} failed ({}), using cached copy {:?}",
                    url, err, entry.local_path
                );
                Ok(())
            }
            Err(err) => Err(LauncherError::NotCached {
                url: url.to_string(),
                source: Box::new(err),
            }),
        }
    }
}

/// Invariant shared by every installedness check in the engine.
pub async fn is_satisfied(path: &Path, sha1: Option<&str>) -> LauncherResult<bool> {
    match sha1 {
        Some(expected) => Downloader::validate_sha1(path, expected).await,
        None => Ok(tokio::fs::try_exists(path).await.unwrap_or(false)),
    }
}
