use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the whole engine.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("network unavailable for {url}: {source}")]
    NetworkUnavailable {
        url: String,
        source: reqwest::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Cache ───────────────────────────────────────────
    #[error("not cached: {url}: {source}")]
    NotCached {
        url: String,
        source: Box<LauncherError>,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Metadata ────────────────────────────────────────
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("unsupported platform rule: {0}")]
    UnsupportedPlatformRule(String),

    #[error("invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("invalid asset object {name}: {reason}")]
    InvalidAssetObject { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Installer pipeline ──────────────────────────────
    #[error("unresolved library specifier: {0}")]
    UnresolvedLibrarySpecifier(String),

    #[error("unknown processor variable: {{{0}}}")]
    UnknownProcessorVariable(String),

    #[error("malformed processor argument: {0}")]
    InvalidProcessorArgument(String),

    #[error("missing Main-Class in processor jar {jar:?}")]
    MissingProcessorMainClass { jar: PathBuf },

    #[error("processor {jar} failed (code {code:?}): {stderr}")]
    ProcessorExecutionFailed {
        jar: String,
        code: Option<i32>,
        stderr: String,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("entry {entry} not found in archive {archive:?}")]
    ArchiveEntryNotFound { archive: PathBuf, entry: String },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Control ─────────────────────────────────────────
    #[error("operation cancelled")]
    Cancelled,

    #[error("{failed} of {total} downloads failed, first: {first}")]
    BatchFailed {
        failed: usize,
        total: usize,
        first: Box<LauncherError>,
    },

    #[error("{stage}: {source}")]
    Context {
        stage: String,
        source: Box<LauncherError>,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Strips stage context and returns the error that actually happened.
    pub fn root(&self) -> &LauncherError {
        let mut current = self;
        while let LauncherError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies a transport error. Connection and timeout failures mean the
    /// remote could not be reached at all.
    pub fn from_transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_connect() || source.is_timeout() {
            LauncherError::NetworkUnavailable {
                url: url.to_string(),
                source,
            }
        } else {
            LauncherError::Http(source)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            LauncherError::DownloadFailed {
                status: 400 | 404,
                ..
            }
        ) || matches!(self.root(), LauncherError::NotCached { source, .. } if source.is_not_found())
    }
}

/// Attaches stage context to an error on its way up.
pub trait ResultExt<T> {
    fn stage(self, stage: &str) -> LauncherResult<T>;
}

impl<T> ResultExt<T> for LauncherResult<T> {
    fn stage(self, stage: &str) -> LauncherResult<T> {
        self.map_err(|source| LauncherError::Context {
            stage: stage.to_string(),
            source: Box::new(source),
        })
    }
}
