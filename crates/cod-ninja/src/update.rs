//! Change-detecting atomic file writes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `contents` to `path` only if it differs from what is already there.
///
/// Parent directories are created as needed. The write goes through a
/// temporary file in the same directory followed by a rename, so concurrent
/// readers never observe a partially written file.
///
/// Returns `true` if the file was (re)written, `false` if it was already
/// up to date.
///
/// # Errors
/// Returns an error if the file or its parent directory cannot be written.
pub fn update_file(path: &Path, contents: &[u8]) -> io::Result<bool> {
    if let Ok(old) = fs::read(path) {
        if old == contents {
            return Ok(false);
        }
    }

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(true)
}
