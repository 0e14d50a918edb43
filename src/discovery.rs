//! Candidate module discovery
//!
//! Every directory under the polyfill root is a candidate; whether it is a
//! module is decided later by the presence of a config file. Directories
//! whose name starts with [`RESERVED_PREFIX`] (build output, fixtures) are
//! skipped along with everything beneath them.

use crate::error::DiscoveryError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories with this prefix are never modules
pub const RESERVED_PREFIX: &str = "__";

fn is_reserved(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with(RESERVED_PREFIX))
}

/// Relative paths of every candidate directory under `root`, sorted
///
/// The root itself is not a candidate.
pub fn discover_module_dirs(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut dirs = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_reserved(entry));

    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Traversal {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            dirs.push(relative.to_path_buf());
        }
    }

    debug!(root = %root.display(), candidates = dirs.len(), "Discovery complete");
    Ok(dirs)
}
