//! Test utilities for the updater
//!
//! Helpers shared by unit tests and the integration suite:
//! - [`init_test_logging`] - once-only tracing setup using the test writer
//! - [`ArchiveFixture`] - builds real 7z archives at test time
//! - [`FailingCopier`] - a tree copier that fails after a set number of files
//! - [`snapshot_tree`] - captures a directory tree for before/after comparison

pub mod fixtures;

pub use fixtures::{ArchiveFixture, FailingCopier};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// With `Some(level)` that level is used; otherwise `RUST_LOG` is honoured and
/// nothing is logged when it is unset. Only the first call has any effect.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Contents of a directory tree keyed by relative path.
///
/// Directories map to `None`, files to their bytes. Two trees are
/// byte-identical exactly when their snapshots are equal.
pub fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.expect("walk test tree"))
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).expect("entry under root").to_path_buf();
            let content = entry
                .file_type()
                .is_file()
                .then(|| std::fs::read(entry.path()).expect("read test file"));
            (relative, content)
        })
        .collect()
}
