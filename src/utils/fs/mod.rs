//! File system utilities used by the install transaction and the extractor
//!
//! - [`dirs`] - recursive copy with mode preservation, removal, mode setting
//! - [`atomic`] - temp-and-rename writes for small metadata files

pub mod atomic;
pub mod dirs;

pub use atomic::atomic_write;
pub use dirs::{
    CopyStats, copy_dir, copy_dir_with, ensure_dir, ensure_parent_dir, list_top_level,
    remove_dir_all, remove_tree, set_mode,
};
