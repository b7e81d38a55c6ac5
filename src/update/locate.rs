//! Finding the application bundle inside an extracted archive.
//!
//! Release archives do not share a fixed layout, so the bundle directory is
//! identified by the marker executable it must contain. Search order, first
//! match wins:
//!
//! 1. `<root>/<payload_dir_name>` containing the marker
//! 2. the first directory named `<payload_dir_name>` anywhere in the tree
//!    that contains the marker
//! 3. the parent of the first marker file found anywhere in the tree
//!
//! Walks visit entries sorted by file name, so the result is deterministic.

use crate::core::{Result, UpdateError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Locates the payload directory in an extracted tree.
#[derive(Debug, Clone)]
pub struct PayloadLocator {
    marker_file: String,
    payload_dir_name: String,
}

impl PayloadLocator {
    pub fn new(marker_file: impl Into<String>, payload_dir_name: impl Into<String>) -> Self {
        Self {
            marker_file: marker_file.into(),
            payload_dir_name: payload_dir_name.into(),
        }
    }

    /// Return the payload directory under `extraction_root`.
    ///
    /// Fails with [`UpdateError::PayloadNotFound`] when no directory holds
    /// the marker.
    pub fn locate(&self, extraction_root: &Path) -> Result<PathBuf> {
        let found = self
            .direct_payload_dir(extraction_root)
            .or_else(|| self.find_named_payload_dir(extraction_root))
            .or_else(|| self.find_marker_parent(extraction_root));

        match found {
            Some(path) => {
                info!(payload = %path.display(), "Located application payload");
                Ok(path)
            }
            None => Err(UpdateError::PayloadNotFound {
                root: extraction_root.to_path_buf(),
                marker: self.marker_file.clone(),
            }),
        }
    }

    fn contains_marker(&self, dir: &Path) -> bool {
        dir.join(&self.marker_file).is_file()
    }

    fn direct_payload_dir(&self, root: &Path) -> Option<PathBuf> {
        let candidate = root.join(&self.payload_dir_name);
        self.contains_marker(&candidate).then_some(candidate)
    }

    fn find_named_payload_dir(&self, root: &Path) -> Option<PathBuf> {
        walk(root)
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.file_name() == self.payload_dir_name.as_str())
            .map(DirEntry::into_path)
            .find(|dir| self.contains_marker(dir))
    }

    fn find_marker_parent(&self, root: &Path) -> Option<PathBuf> {
        let marker = walk(root).find(|entry| {
            entry.file_type().is_file() && entry.file_name() == self.marker_file.as_str()
        })?;
        debug!(marker = %marker.path().display(), "Marker found outside a payload directory");
        marker.path().parent().map(Path::to_path_buf)
    }
}

/// Sorted walk below `root` that logs and skips unreadable subtrees.
fn walk(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry during payload search");
                None
            }
        })
}
