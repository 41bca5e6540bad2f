// ─── Natives Extraction ───
// Unpacks legacy natives jars next to the game before launch.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::resolver::LibrarySet;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::LauncherPaths;

/// Extracts every legacy natives jar of `libraries` into
/// `natives/<version_id>`. Files already present are left alone, so repeated
/// calls are no-ops.
pub async fn extract_natives(
    libraries: &LibrarySet,
    paths: &LauncherPaths,
    version_id: &str,
) -> LauncherResult<PathBuf> {
    let natives_dir = paths.natives_for(version_id);
    tokio::fs::create_dir_all(&natives_dir)
        .await
        .map_err(|e| LauncherError::io(&natives_dir, e))?;

    let jars: Vec<PathBuf> = libraries.natives().map(|l| l.runtime_path(paths)).collect();
    if jars.is_empty() {
        return Ok(natives_dir);
    }

    let dest_dir = natives_dir.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        let mut total = 0;
        for jar in &jars {
            total += extract_jar(jar, &dest_dir)?;
        }
        Ok::<_, LauncherError>(total)
    })
    .await
    .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))??;

    info!("Extracted {} native files into {:?}", extracted, natives_dir);
    Ok(natives_dir)
}

fn extract_jar(jar: &Path, dest_dir: &Path) -> LauncherResult<usize> {
    let file = std::fs::File::open(jar).map_err(|e| LauncherError::io(jar, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if entry.is_dir() || name.starts_with("META-INF/") {
            continue;
        }

        // Entries are flattened; natives are loaded from a single directory.
        let Some(base) = Path::new(&name).file_name() else {
            continue;
        };
        let dest = dest_dir.join(base);
        if dest.exists() {
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        std::fs::write(&dest, bytes).map_err(|e| LauncherError::io(&dest, e))?;
        debug!("Extracted native: {}", name);
        written += 1;
    }

    Ok(written)
}
