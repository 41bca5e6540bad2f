use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::CancelToken;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::DEFAULT_DOWNLOAD_CONCURRENCY;

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

/// Called with `(completed, total)` after every successful task.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Per-task outcome of a batch. Failures never cancel sibling tasks.
#[derive(Debug)]
pub struct BatchReport {
    pub total: usize,
    pub completed: usize,
    pub bytes: u64,
    pub failed: Vec<(DownloadTask, LauncherError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Collapses the report for callers that need every task to succeed.
    pub fn into_result(mut self) -> LauncherResult<usize> {
        if self.failed.is_empty() {
            return Ok(self.completed);
        }
        if self
            .failed
            .iter()
            .any(|(_, err)| matches!(err, LauncherError::Cancelled))
        {
            return Err(LauncherError::Cancelled);
        }
        let failed = self.failed.len();
        let (task, first) = self.failed.remove(0);
        warn!("{} downloads failed, first was {}", failed, task.url);
        Err(LauncherError::BatchFailed {
            failed,
            total: self.total,
            first: Box::new(first),
        })
    }
}

/// Concurrent, SHA-1 validated downloader.
///
/// Bytes are streamed into a hidden sibling of the destination and renamed
/// into place only after the hash has been verified, so readers never see a
/// partially written file.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    // ── Single file download ────────────────────────────

    /// Download a single file to `dest`, optionally validating SHA-1.
    /// Returns the number of bytes written.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<u64> {
        self.cancel.check()?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LauncherError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let partial = partial_path(dest);
        let written = match self
            .stream_to_file(response, url, &partial, dest, sha1_expected)
            .await
        {
            Ok(written) => written,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(LauncherError::io(dest, e));
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }

    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        url: &str,
        partial: &Path,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<u64> {
        let mut hasher = Sha1::new();
        let mut written = 0_u64;

        // The handle must be closed before the rename on Windows.
        {
            let mut file = tokio::fs::File::create(partial)
                .await
                .map_err(|e| LauncherError::io(partial, e))?;
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                self.cancel.check()?;
                let chunk = chunk.map_err(|e| LauncherError::from_transport(url, e))?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(partial, e))?;
                written += chunk.len() as u64;
            }
            file.flush()
                .await
                .map_err(|e| LauncherError::io(partial, e))?;
        }

        if let Some(expected) = sha1_expected {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::ChecksumMismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        Ok(written)
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`.
    ///
    /// At most `concurrency` transfers are in flight regardless of batch
    /// size. Every task runs to completion; failures are collected.
    pub async fn download_batch(&self, tasks: Vec<DownloadTask>) -> BatchReport {
        let total = tasks.len();
        info!(
            "Starting batch download: {} files, concurrency={}",
            total, self.concurrency
        );

        let completed = AtomicUsize::new(0);
        let results: Vec<_> = stream::iter(tasks)
            .map(|task| {
                let completed = &completed;
                async move {
                    let result = self
                        .download_file(&task.url, &task.dest, task.sha1.as_deref())
                        .await;
                    if result.is_ok() {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(progress) = &self.progress {
                            progress(done, total);
                        }
                    }
                    (task, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport {
            total,
            completed: 0,
            bytes: 0,
            failed: Vec::new(),
        };
        for (task, result) in results {
            match result {
                Ok(bytes) => {
                    report.completed += 1;
                    report.bytes += bytes;
                }
                Err(err) => {
                    debug!("Download failed for {}: {}", task.url, err);
                    report.failed.push((task, err));
                }
            }
        }

        info!(
            "Batch finished: {}/{} ok, {} failed",
            report.completed,
            total,
            report.failed.len()
        );
        report
    }

    /// Validate an existing file's SHA-1. A missing file is simply invalid.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        match sha1_file(path).await {
            Ok(actual) => Ok(actual.eq_ignore_ascii_case(expected)),
            Err(LauncherError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Hex SHA-1 of a file, read in fixed-size chunks.
pub async fn sha1_file(path: &Path) -> LauncherResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0_u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
}
