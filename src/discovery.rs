//! File discovery for experiment directories.
//!
//! An experiment series is laid out as:
//! ```text
//! experiment/
//!   info.txt
//!   Data/
//!     ps10_run.DTA
//!     ps50_run.DTA
//! ```
//! and a multi-series study as a base directory holding several of those.

use crate::error::{EchemError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files directly in `dir` whose extension matches `extension`, ignoring
/// case, sorted by name
pub fn discover_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = direct_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file() && has_extension(path, extension))
        .collect();
    files.sort();

    debug!(
        "Found {} .{} files in {}",
        files.len(),
        extension,
        dir.display()
    );
    Ok(files)
}

/// Sub-directories directly below `base`, sorted by name
pub fn discover_subdirectories(base: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = direct_entries(base)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    debug!("Found {} sub-directories in {}", dirs.len(), base.display());
    Ok(dirs)
}

fn direct_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EchemError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        match entry {
            Ok(entry) => entries.push(entry.into_path()),
            Err(e) => warn!("Error reading directory {}: {}", dir.display(), e),
        }
    }
    Ok(entries)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}
