use tracing::debug;

use super::LibrarySpecifier;
use crate::core::cache::{CacheEntry, ResourceCache};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::LauncherPaths;

/// A remote Maven repository addressed by base URL.
#[derive(Debug, Clone, Copy)]
pub struct MavenRepository<'a> {
    base: &'a str,
}

impl<'a> MavenRepository<'a> {
    pub fn new(base: &'a str) -> Self {
        Self { base }
    }

    pub fn artifact_url(&self, specifier: &LibrarySpecifier) -> String {
        specifier.url(self.base)
    }

    /// SHA-1 of an artifact from its `.sha1` sidecar. The sidecar is cached
    /// next to where the artifact itself will live.
    pub async fn checksum(
        &self,
        cache: &ResourceCache,
        paths: &LauncherPaths,
        specifier: &LibrarySpecifier,
    ) -> LauncherResult<String> {
        let relative = format!("{}.sha1", specifier.path());
        let entry = CacheEntry::immutable(
            paths.library_file(&relative),
            format!("{}.sha1", self.artifact_url(specifier)),
        );
        let bytes = cache.resolve(&entry).await?;
        let text = String::from_utf8_lossy(&bytes);
        // Some repositories append the file name after the digest.
        let digest = text.split_whitespace().next().unwrap_or_default();
        if digest.len() != 40 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LauncherError::Other(format!(
                "malformed checksum for {}: {:?}",
                specifier, text
            )));
        }
        debug!("Checksum for {}: {}", specifier, digest);
        Ok(digest.to_ascii_lowercase())
    }
}
