//! File system helpers with path-carrying errors.
//!
//! `write_atomic` uses the temp-file + fsync + rename pattern so readers never
//! observe a truncated target; `copy_new` refuses to replace existing files.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BrainiacError, Result};

/// Read a UTF-8 text file
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| BrainiacError::io(path, e))
}

/// Replace `target` with `content` without exposing a partially written file.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| BrainiacError::io(&dir, e))?;

    let temp_path = temp_path_for(target, &dir);
    let result = write_and_sync(&temp_path, content)
        .and_then(|_| fs::rename(&temp_path, target).map_err(|e| BrainiacError::io(target, e)));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result?;

    debug!(path = %target.display(), bytes = content.len(), "Atomically replaced file");
    Ok(())
}

/// Create `dest` with `content`, failing with `FileConflict` if it exists.
pub fn copy_new(dest: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => BrainiacError::FileConflict {
                path: dest.to_path_buf(),
            },
            _ => BrainiacError::io(dest, e),
        })?;

    file.write_all(content.as_bytes())
        .map_err(|e| BrainiacError::io(dest, e))?;
    file.sync_all().map_err(|e| BrainiacError::io(dest, e))?;
    Ok(())
}

fn temp_path_for(target: &Path, dir: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    dir.join(format!(".{}.{}.tmp", name, std::process::id()))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|e| BrainiacError::io(path, e))?;
    file.write_all(content)
        .map_err(|e| BrainiacError::io(path, e))?;
    file.sync_all().map_err(|e| BrainiacError::io(path, e))
}
