/*
File: grassup-aio/src/fs.rs
Purpose: Primitive synchronous filesystem operations.
*/
use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use grassup_common::error::{GrassupError, Result};
use tracing::{debug, error, trace};
use walkdir::WalkDir;

/// Files touched by a gap-filling copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: usize,
}

impl CopyStats {
    pub fn add(&mut self, other: CopyStats) {
        self.copied += other.copied;
        self.skipped += other.skipped;
    }
}

/// Creates a directory and all its parent components if they are missing.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        GrassupError::from(e)
    })
}

/// Checks if a path exists without following symlinks.
pub fn check_symlink_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Copies `src` to `dst` unless something already exists at `dst`.
/// Returns `true` when the file was copied.
pub fn copy_file_if_absent(src: &Path, dst: &Path) -> Result<bool> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut input = File::open(src)?;
    let mut out = match OpenOptions::new().write(true).create_new(true).open(dst) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            trace!("Keeping existing file {}", dst.display());
            return Ok(false);
        }
        Err(e) => {
            error!("Failed create file {}: {}", dst.display(), e);
            return Err(e.into());
        }
    };
    let copied = io::copy(&mut input, &mut out)
        .and_then(|_| input.metadata())
        .and_then(|meta| fs::set_permissions(dst, meta.permissions()));
    if let Err(e) = copied {
        // Never leave a partial file that later runs would keep.
        drop(out);
        if let Err(rm) = fs::remove_file(dst) {
            error!("Failed to remove partial {}: {}", dst.display(), rm);
        }
        return Err(e.into());
    }
    trace!("Copied {} -> {}", src.display(), dst.display());
    Ok(true)
}

/// Mirrors the tree at `src` under `dst`, creating directories as needed and
/// copying only files that do not exist yet. Nothing under `dst` is removed
/// or overwritten.
pub fn copy_tree_if_absent(src: &Path, dst: &Path) -> Result<CopyStats> {
    debug!(
        "Copying tree {} -> {} (skip existing)",
        src.display(),
        dst.display()
    );
    let mut stats = CopyStats::default();
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            GrassupError::Generic(format!("Failed to walk {}: {}", src.display(), e))
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| GrassupError::Generic(format!("Unexpected walk path: {e}")))?;
        let target: PathBuf = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            if copy_file_if_absent(entry.path(), &target)? {
                stats.copied += 1;
            } else {
                stats.skipped += 1;
            }
        } else {
            debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }
    Ok(stats)
}

/// Removes a file, symlink or directory tree. Returns `false` when nothing
/// was there.
pub fn remove_path_recursive(path: &Path) -> io::Result<bool> {
    let metadata = match path.symlink_metadata() {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    debug!("Removing {}", path.display());
    let result = if metadata.file_type().is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
