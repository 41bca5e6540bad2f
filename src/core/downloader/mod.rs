mod cancel;
mod client;

pub use cancel::CancelToken;
pub use client::{sha1_file, BatchReport, DownloadTask, Downloader, ProgressFn};
