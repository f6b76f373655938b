//! Reading and writing envelope files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::crypto::aead::secure_random;
use crate::error::{Error, Result};

/// Loads a whole envelope file into memory.
pub fn read(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Writes `data` to `path` so that readers see either the old file or the
/// complete new one, never a partial write.
///
/// The data goes to a uniquely named sibling temp file which is synced and
/// then renamed over the target. Parent directories are created as needed.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path)?;

    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)?;

    let written = tmp_file
        .write_all(data)
        .and_then(|_| tmp_file.sync_all());
    drop(tmp_file);

    if let Err(e) = written.and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    // persist the rename itself
    #[cfg(unix)]
    if let Some(parent) = parent {
        fs::File::open(parent)?.sync_all()?;
    }

    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// `name.tmp.<16 hex chars>` next to the target.
fn tmp_path_for(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidOptions(format!("{} is not a file path", path.display())))?
        .to_string_lossy();

    let mut buf = [0u8; 8];
    secure_random(&mut buf)?;
    let suffix: String = buf.iter().map(|b| format!("{b:02x}")).collect();

    Ok(path.with_file_name(format!("{file_name}.tmp.{suffix}")))
}
