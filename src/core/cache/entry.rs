use std::path::PathBuf;

/// How a cache entry reconciles its local copy with the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Reuse the local copy iff it exists and, when a hash is recorded, the
    /// recomputed hash matches. Otherwise fetch; a failed fetch is `NotCached`.
    Validated,
    /// Always try the remote first. If the fetch fails, an existing local copy
    /// is returned as degraded data.
    BestEffort,
}

/// The unit the remote resource cache operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub local_path: PathBuf,
    pub url: Option<String>,
    pub sha1: Option<String>,
    pub policy: CachePolicy,
}

impl CacheEntry {
    /// Hash-validated entry.
    pub fn verified(local_path: PathBuf, url: impl Into<String>, sha1: impl Into<String>) -> Self {
        Self {
            local_path,
            url: Some(url.into()),
            sha1: Some(sha1.into()),
            policy: CachePolicy::Validated,
        }
    }

    /// Validated entry with no recorded hash: any existing local copy is
    /// reused. Suits immutable, version-addressed documents.
    pub fn immutable(local_path: PathBuf, url: impl Into<String>) -> Self {
        Self {
            local_path,
            url: Some(url.into()),
            sha1: None,
            policy: CachePolicy::Validated,
        }
    }

    pub fn best_effort(local_path: PathBuf, url: impl Into<String>) -> Self {
        Self {
            local_path,
            url: Some(url.into()),
            sha1: None,
            policy: CachePolicy::BestEffort,
        }
    }

    /// Human readable source used in error messages.
    pub fn source_label(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| self.local_path.display().to_string())
    }
}
