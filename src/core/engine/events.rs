use std::sync::Arc;

use serde::Serialize;

use crate::core::loaders::LoaderKind;

/// Progress notifications emitted while resolving and installing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstallEvent {
    MetadataResolved {
        version_id: String,
        loader: LoaderKind,
    },
    LibrariesResolved {
        total: usize,
        required: usize,
    },
    AssetsResolved {
        total: usize,
        required: usize,
    },
    Downloading {
        completed: usize,
        total: usize,
    },
    /// The patched client is already present.
    InstallerSkipped {
        version: String,
    },
    ProcessorStarted {
        index: usize,
        total: usize,
        jar: String,
    },
    Finished {
        version_id: String,
    },
}

pub type EventSink = Arc<dyn Fn(InstallEvent) + Send + Sync>;

pub(crate) fn emit(sink: Option<&EventSink>, event: InstallEvent) {
    if let Some(sink) = sink {
        sink(event);
    }
}
