use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::core::error::{LauncherError, LauncherResult};

/// Random-access view over an installer jar.
pub struct InstallerArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl InstallerArchive {
    pub fn open(path: &Path) -> LauncherResult<Self> {
        let file = File::open(path).map_err(|e| LauncherError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive: ZipArchive::new(file)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_bytes(&mut self, entry: &str) -> LauncherResult<Vec<u8>> {
        let mut file = match self.archive.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(LauncherError::ArchiveEntryNotFound {
                    archive: self.path.clone(),
                    entry: entry.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| LauncherError::io(&self.path, e))?;
        Ok(bytes)
    }

    pub fn read_json<T: DeserializeOwned>(&mut self, entry: &str) -> LauncherResult<T> {
        let bytes = self.read_bytes(entry)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes an embedded file to `dest`, creating parent directories.
    pub fn extract_to(&mut self, entry: &str, dest: &Path) -> LauncherResult<()> {
        let bytes = self.read_bytes(entry)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        std::fs::write(dest, bytes).map_err(|e| LauncherError::io(dest, e))?;
        debug!("Extracted {} -> {:?}", entry, dest);
        Ok(())
    }
}

/// Reads `Main-Class` from a jar manifest, following continuation lines.
pub fn read_main_class(jar: &Path) -> LauncherResult<String> {
    let missing = || LauncherError::MissingProcessorMainClass {
        jar: jar.to_path_buf(),
    };

    let file = File::open(jar).map_err(|e| LauncherError::io(jar, e))?;
    let mut archive = ZipArchive::new(file)?;
    let mut manifest = match archive.by_name("META-INF/MANIFEST.MF") {
        Ok(manifest) => manifest,
        Err(ZipError::FileNotFound) => return Err(missing()),
        Err(e) => return Err(e.into()),
    };

    let mut text = String::new();
    manifest
        .read_to_string(&mut text)
        .map_err(|e| LauncherError::io(jar, e))?;

    let mut main_class: Option<String> = None;
    let mut current_key: Option<String> = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if current_key.as_deref() == Some("Main-Class") {
                if let Some(value) = &mut main_class {
                    value.push_str(rest.trim_end());
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            current_key = Some(key.trim().to_string());
            if key.trim() == "Main-Class" {
                main_class = Some(value.trim().to_string());
            }
        }
    }

    main_class.filter(|m| !m.is_empty()).ok_or_else(missing)
}
