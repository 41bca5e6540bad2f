use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::downloader::CancelToken;
use crate::core::error::{LauncherError, LauncherResult};

/// Age after which a lock whose owner cannot be checked is considered stale.
const ROOT_LOCK_STALE_SECS: i64 = 60 * 10;
/// Age after which an unreadable lock file is considered abandoned.
const ROOT_LOCK_CORRUPT_GRACE: Duration = Duration::from_secs(30);
const ROOT_LOCK_POLL: Duration = Duration::from_millis(250);

/// Advisory lock over a cache root, held for one engine operation.
/// The lock file is removed when the guard drops.
#[derive(Debug)]
pub struct RootLockGuard {
    path: PathBuf,
}

impl RootLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLockGuard {
    fn drop(&mut self) {
        if let Err(source) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove lock {:?}: {}", self.path, source);
        }
    }
}

/// Waits until `lock_path` can be claimed exclusively. Locks left behind by
/// dead processes are cleared while waiting.
///
/// The owner record is written to a private sibling first and then linked
/// into place, so a visible lock file is always complete.
pub async fn acquire_root_lock(
    lock_path: &Path,
    cancel: &CancelToken,
) -> LauncherResult<RootLockGuard> {
    if let Some(parent) = lock_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| LauncherError::io(parent, source))?;
    }

    let mut attempts = 0_u32;
    loop {
        cancel.check()?;
        attempts += 1;
        if try_claim(lock_path).await? {
            debug!("Acquired root lock {:?}", lock_path);
            return Ok(RootLockGuard {
                path: lock_path.to_path_buf(),
            });
        }
        cleanup_stale_lock(lock_path).await;
        if attempts % 20 == 0 {
            info!("Waiting for root lock at {:?}", lock_path);
        }
        tokio::time::sleep(ROOT_LOCK_POLL).await;
    }
}

/// `Ok(false)` when another owner holds the lock.
async fn try_claim(lock_path: &Path) -> LauncherResult<bool> {
    let name = lock_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lock".to_string());
    let staging = lock_path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));

    let payload = serde_json::json!({
        "pid": std::process::id(),
        "timestamp": Utc::now().timestamp(),
    });
    tokio::fs::write(&staging, payload.to_string())
        .await
        .map_err(|source| LauncherError::io(&staging, source))?;

    let linked = tokio::fs::hard_link(&staging, lock_path).await;
    if let Err(source) = tokio::fs::remove_file(&staging).await {
        warn!("Failed to remove staged lock {:?}: {}", staging, source);
    }
    match linked {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(LauncherError::io(lock_path, source)),
    }
}

/// Whether the recorded owner is still running, when that can be known.
fn owner_alive(pid: u32) -> Option<bool> {
    if pid == std::process::id() {
        return Some(true);
    }
    if pid == 0 {
        return None;
    }
    #[cfg(target_os = "linux")]
    {
        Some(PathBuf::from(format!("/proc/{pid}")).exists())
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

async fn cleanup_stale_lock(lock_path: &Path) {
    let Ok(content) = tokio::fs::read_to_string(lock_path).await else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&content) else {
        // Never produced by `try_claim`; only clear it once it has sat untouched.
        let abandoned = tokio::fs::metadata(lock_path)
            .await
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > ROOT_LOCK_CORRUPT_GRACE);
        if abandoned {
            warn!("Removing unreadable lock {:?}", lock_path);
            let _ = tokio::fs::remove_file(lock_path).await;
        }
        return;
    };

    let pid = value
        .get("pid")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default();
    let timestamp = value
        .get("timestamp")
        .and_then(|v| v.as_i64())
        .unwrap_or_default();

    let stale = match owner_alive(pid) {
        Some(alive) => !alive,
        None => Utc::now().timestamp().saturating_sub(timestamp) > ROOT_LOCK_STALE_SECS,
    };
    if stale {
        warn!("Removing stale lock {:?} (pid {})", lock_path, pid);
        let _ = tokio::fs::remove_file(lock_path).await;
    }
}
