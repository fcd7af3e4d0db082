//! Test-image discovery.
//!
//! Walks a directory tree top-down (each directory's files before its subdirectories) and
//! collects every path ending in the image suffix. Order follows the filesystem's directory
//! listing order and is not sorted. Symbolic links to directories are not followed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::HarnessError;

/// Suffix of raw test binaries.
pub const BIN_SUFFIX: &str = ".bin";

/// Lists every `.bin` file under `root`.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if `root` or any directory below it cannot be listed.
pub fn list_candidates(root: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    list_candidates_with_suffix(root, BIN_SUFFIX)
}

/// Lists every file under `root` whose path ends with `suffix`.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if `root` or any directory below it cannot be listed.
pub fn list_candidates_with_suffix(
    root: &Path,
    suffix: &str,
) -> Result<Vec<PathBuf>, HarnessError> {
    let mut found = Vec::new();
    walk(root, suffix, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, suffix: &str, found: &mut Vec<PathBuf>) -> Result<(), HarnessError> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))? {
        let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| HarnessError::io(&path, e))?;

        if file_type.is_dir() {
            subdirs.push(path);
        } else if path.to_string_lossy().ends_with(suffix)
            && !(file_type.is_symlink() && path.is_dir())
        {
            found.push(path);
        }
    }
    for sub in subdirs {
        walk(&sub, suffix, found)?;
    }
    Ok(())
}
