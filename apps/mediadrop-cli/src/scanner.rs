//! Expands command-line paths into file handles.
//!
//! Directories are walked recursively. Files found inside a directory are
//! named by their path relative to it, with `/` separators, and sorted.

use std::path::{Path, PathBuf};

use mediadrop_transfer::{RawFile, TransferError};

/// Opens every file named by `paths`, expanding directories.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<RawFile>, TransferError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(scan_dir(path)?);
        } else {
            files.push(RawFile::from_path(path)?);
        }
    }
    Ok(files)
}

/// Scans a directory recursively, returning files sorted by relative path.
pub fn scan_dir(root: &Path) -> Result<Vec<RawFile>, TransferError> {
    let mut found = Vec::new();
    walk_dir(root, root, &mut found)?;
    found.sort_by(|a, b| a.0.cmp(&b.0));

    found
        .into_iter()
        .map(|(rel, path)| RawFile::from_path(&path).map(|f| f.with_name(rel)))
        .collect()
}

fn walk_dir(
    root: &Path,
    current: &Path,
    found: &mut Vec<(String, PathBuf)>,
) -> Result<(), TransferError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk_dir(root, &path, found)?;
        } else if metadata.is_file() {
            let rel = path
                .strip_prefix(root)
                .map_err(|e| TransferError::InvalidPath(e.to_string()))?;
            found.push((rel.to_string_lossy().replace('\\', "/"), path));
        }
    }
    Ok(())
}
