use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::error;

use crate::Result;
use crate::StorageError;

fn path_error(
    path: &Path,
    source: std::io::Error,
) -> StorageError {
    StorageError::PathError {
        path: path.to_path_buf(),
        source,
    }
}

pub fn create_parent_dir_if_not_exist(path: &Path) -> Result<()> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            if let Err(e) = fs::create_dir_all(parent_dir) {
                error!("Failed to create parent directory {:?}: {:?}", parent_dir, e);
                return Err(path_error(parent_dir, e).into());
            }
        }
    }
    Ok(())
}

/// Reads the whole file; a missing file is `Ok(None)`, not an error
pub fn read_to_string_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("File {:?} does not exist yet", path);
            Ok(None)
        }
        Err(e) => Err(path_error(path, e).into()),
    }
}

/// Sibling path used as the staging file for `write_atomically`
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces `path` with `buf` so readers see either the old or the new
/// content, never a partial write
pub fn write_atomically(
    path: &Path,
    buf: &[u8],
) -> Result<()> {
    create_parent_dir_if_not_exist(path)?;

    let staging = staging_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)?;
        file.write_all(buf)?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&staging);
        return Err(path_error(&staging, e).into());
    }

    fs::rename(&staging, path).map_err(|e| {
        let _ = fs::remove_file(&staging);
        path_error(path, e)
    })?;
    debug!("Wrote {} bytes to {:?}", buf.len(), path);
    Ok(())
}
