//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Directory copy with mode preservation, atomic writes
//! - [`path_validation`] - Archive entry path checks
//! - [`progress`] - Progress bars for the command-line front end

pub mod fs;
pub mod path_validation;
pub mod progress;

pub use fs::{atomic_write, copy_dir, ensure_dir, remove_dir_all};
pub use progress::ProgressBar;
