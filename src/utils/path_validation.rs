//! Path validation for archive entry names.
//!
//! Entry names come from an untrusted archive. Before one is joined with the
//! extraction directory it must be a plain relative path that cannot climb out
//! of that directory.

use crate::core::{Result, UpdateError};
use std::path::{Component, Path, PathBuf};

/// Validates an archive entry name and converts it into a relative path.
///
/// Both `/` and `\` are accepted as separators. `.` segments are dropped.
///
/// # Errors
/// Returns [`UpdateError::Archive`] if the name:
/// - is empty (or only `.` segments)
/// - is absolute (leading separator)
/// - carries a drive prefix such as `C:`
/// - contains a parent directory reference (`..`)
///
/// # Examples
///
/// ```rust
/// use portable_updater::utils::path_validation::validate_entry_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     validate_entry_path("core\\app\\floorp.exe").unwrap(),
///     PathBuf::from("core").join("app").join("floorp.exe"),
/// );
/// assert!(validate_entry_path("../evil").is_err());
/// ```
pub fn validate_entry_path(name: &str) -> Result<PathBuf> {
    let reject = |why: &str| UpdateError::archive(format!("Unsafe entry path '{name}': {why}"));

    if has_drive_prefix(name) {
        return Err(reject("drive prefix"));
    }
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(reject("absolute path"));
    }

    let mut relative = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(reject("parent directory reference")),
            _ => relative.push(segment),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(reject("empty path"));
    }

    validate_no_traversal(&relative)?;
    Ok(relative)
}

/// Rejects paths that could leave the directory they are joined onto.
///
/// Used as a final check on the platform-parsed form of an entry path.
pub fn validate_no_traversal(path: &Path) -> Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(UpdateError::archive(format!(
                    "Path escapes the extraction directory: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(())
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
