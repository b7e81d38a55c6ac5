//! Directory operations for creating, copying, and removing directory trees.
//!
//! Failures are reported as [`UpdateError::Filesystem`] carrying the path that
//! failed, so the install transaction can roll back and the CLI can tell the
//! user which file was in the way. [`remove_tree`] returns the raw I/O error
//! for the rollback path.

use crate::core::{Result, UpdateError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Counters returned by a recursive copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Regular files copied
    pub files: u64,
    /// Directories created below the destination root
    pub dirs: u64,
    /// Total bytes copied
    pub bytes: u64,
}

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// Returns an error if the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| UpdateError::fs("create directory", path, e))?;
    } else if !path.is_dir() {
        return Err(UpdateError::fs(
            "create directory",
            path,
            io::Error::new(io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        ));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    Ok(())
}

/// Recursively copies a directory tree, preserving file and directory modes.
///
/// The destination must already exist. Subdirectories are created as needed and
/// receive the permissions of their source counterpart only after the whole
/// tree has been copied, so a copy that fails partway leaves a tree that can
/// still be removed. Symlinks and special files are skipped.
///
/// # Examples
///
/// ```rust,no_run
/// use portable_updater::utils::fs::copy_dir;
/// use std::path::Path;
///
/// # fn example() -> portable_updater::core::Result<()> {
/// let stats = copy_dir(Path::new("extract/app"), Path::new("live/app"))?;
/// println!("copied {} files", stats.files);
/// # Ok(())
/// # }
/// ```
pub fn copy_dir(src: &Path, dst: &Path) -> Result<CopyStats> {
    copy_dir_with(src, dst, &mut |_| Ok(()))
}

/// Same as [`copy_dir`], invoking `before_file` with each source file path
/// before it is copied.
///
/// An error from the hook aborts the copy like any other I/O failure. The
/// install transaction uses this seam to report progress, and tests use it to
/// inject failures at a chosen file.
pub fn copy_dir_with(
    src: &Path,
    dst: &Path,
    before_file: &mut dyn FnMut(&Path) -> io::Result<()>,
) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    let mut deferred = Vec::new();
    copy_recursive(src, dst, before_file, &mut stats, &mut deferred)?;

    for (dir, permissions) in deferred {
        fs::set_permissions(&dir, permissions)
            .map_err(|e| UpdateError::fs("set permissions", &dir, e))?;
    }
    Ok(stats)
}

fn copy_recursive(
    src: &Path,
    dst: &Path,
    before_file: &mut dyn FnMut(&Path) -> io::Result<()>,
    stats: &mut CopyStats,
    deferred: &mut Vec<(PathBuf, fs::Permissions)>,
) -> Result<()> {
    let mut entries = fs::read_dir(src)
        .map_err(|e| UpdateError::fs("read directory", src, e))?
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| UpdateError::fs("read directory", src, e))?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type =
            entry.file_type().map_err(|e| UpdateError::fs("inspect entry", &src_path, e))?;

        if file_type.is_dir() {
            fs::create_dir(&dst_path)
                .map_err(|e| UpdateError::fs("create directory", &dst_path, e))?;
            stats.dirs += 1;
            let permissions = fs::metadata(&src_path)
                .map_err(|e| UpdateError::fs("read permissions", &src_path, e))?
                .permissions();
            copy_recursive(&src_path, &dst_path, before_file, stats, deferred)?;
            deferred.push((dst_path, permissions));
        } else if file_type.is_file() {
            before_file(&src_path).map_err(|e| UpdateError::fs("copy file", &src_path, e))?;
            // fs::copy carries the permission bits over on every platform
            let bytes = fs::copy(&src_path, &dst_path)
                .map_err(|e| UpdateError::fs("copy file", &dst_path, e))?;
            stats.files += 1;
            stats.bytes += bytes;
        } else {
            debug!(path = %src_path.display(), "Skipping non-regular file");
        }
    }

    Ok(())
}

/// Recursively removes a directory. A missing directory is not an error.
///
/// See [`remove_tree`] for how read-only entries are handled.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    remove_tree(path).map_err(|e| UpdateError::fs("remove directory", path, e))
}

/// Recursively removes a directory, reporting the raw I/O error.
///
/// When the removal is refused, the tree is made writable (directories on
/// Unix, read-only files on Windows) and the removal is retried once. A
/// missing directory is not an error.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "Removal refused, clearing read-only permissions");
            make_writable(path)?;
            fs::remove_dir_all(path)
        }
        Err(e) => Err(e),
    }
}

fn make_writable(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if metadata.is_dir() && mode & 0o700 != 0o700 {
            fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o700))?;
        }
    }

    #[cfg(not(unix))]
    {
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            fs::set_permissions(path, permissions)?;
        }
    }

    if metadata.is_dir() {
        for entry in fs::read_dir(path)? {
            make_writable(&entry?.path())?;
        }
    }
    Ok(())
}

/// Applies Unix-style mode bits to a path.
///
/// On Windows only the owner-write bit is meaningful and maps to the
/// read-only attribute.
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
    }

    #[cfg(not(unix))]
    {
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(path, permissions)
    }
}

/// Lists the names of the immediate children of a directory, sorted.
///
/// Unreadable directories yield an empty list and a warning; the result is
/// only used for diagnostics.
pub fn list_top_level(path: &Path) -> Vec<String> {
    match fs::read_dir(path) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not list directory");
            Vec::new()
        }
    }
}
