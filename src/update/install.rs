//! Swapping the live installation for a new payload.
//!
//! The live directory is renamed aside to `<live>.bak`, an empty live
//! directory is created, and the payload is copied in. The backup is deleted
//! on success and renamed back on any failure, so once [`InstallTransaction::install`]
//! returns exactly one complete bundle sits at the live path. The single
//! exception is [`UpdateError::RollbackFailed`], which names the backup so it
//! can be restored by hand.
//!
//! The sequence of renames is not atomic as a whole. A crash between the
//! rename-aside and the final cleanup leaves a `.bak` directory behind; a later
//! install refuses to start until it is dealt with.

use crate::constants::BACKUP_SUFFIX;
use crate::core::{Result, UpdateError};
use crate::utils::fs::{CopyStats, copy_dir, remove_dir_all, remove_tree};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const RESTORE_ATTEMPTS: u32 = 3;
const RESTORE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Copies a payload tree into a fresh directory.
///
/// The default [`FsCopier`] preserves directory structure and file modes.
/// Alternative implementations exist to exercise the rollback paths.
pub trait TreeCopier: Send + Sync {
    /// Copy the contents of `src` into the existing, empty directory `dst`.
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<CopyStats>;
}

/// [`TreeCopier`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl TreeCopier for FsCopier {
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<CopyStats> {
        copy_dir(src, dst)
    }
}

/// Path of the backup kept for `live_dir` during an install.
#[must_use]
pub fn backup_path(live_dir: &Path) -> PathBuf {
    let mut name = OsString::from(live_dir.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Backup-and-swap installer.
#[derive(Clone)]
pub struct InstallTransaction {
    copier: Arc<dyn TreeCopier>,
}

impl Default for InstallTransaction {
    fn default() -> Self {
        Self::new(Arc::new(FsCopier))
    }
}

impl std::fmt::Debug for InstallTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallTransaction").finish_non_exhaustive()
    }
}

impl InstallTransaction {
    pub fn new(copier: Arc<dyn TreeCopier>) -> Self {
        Self { copier }
    }

    /// Replace the contents of `live_dir` with the contents of `payload`.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Filesystem`] if a stale backup exists, or if a step
    ///   fails and the previous installation was restored
    /// - [`UpdateError::RollbackFailed`] if restoring the previous
    ///   installation failed as well
    pub fn install(&self, payload: &Path, live_dir: &Path) -> Result<CopyStats> {
        let backup = backup_path(live_dir);

        if backup.exists() {
            return Err(UpdateError::fs(
                "check for stale backup",
                &backup,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "a backup from an interrupted update exists; restore or remove it first",
                ),
            ));
        }

        info!(live = %live_dir.display(), backup = %backup.display(), "Moving current installation aside");
        fs::rename(live_dir, &backup)
            .map_err(|e| UpdateError::fs("move installation aside", live_dir, e))?;

        if let Err(e) = fs::create_dir(live_dir) {
            let cause = UpdateError::fs("create installation directory", live_dir, e);
            return Err(self.roll_back(live_dir, &backup, cause));
        }

        let stats = match self.copier.copy_tree(payload, live_dir) {
            Ok(stats) => stats,
            Err(cause) => {
                warn!(error = %cause, "Copy failed, removing partial installation");
                return Err(self.roll_back(live_dir, &backup, cause));
            }
        };

        if let Err(e) = remove_dir_all(&backup) {
            // The new bundle is live; a leftover backup only blocks the next update
            warn!(backup = %backup.display(), error = %e, "Could not remove backup");
        }

        info!(files = stats.files, bytes = stats.bytes, "Installation replaced");
        Ok(stats)
    }

    /// Restore `backup` to `live_dir` and return the error to report.
    ///
    /// Returns `cause` unchanged when the restore succeeds.
    fn roll_back(&self, live_dir: &Path, backup: &Path, cause: UpdateError) -> UpdateError {
        warn!(live = %live_dir.display(), "Rolling back to previous installation");

        let mut attempt = 1;
        loop {
            match restore(live_dir, backup) {
                Ok(()) => {
                    info!("Previous installation restored");
                    return cause;
                }
                Err(e) if attempt < RESTORE_ATTEMPTS => {
                    warn!(attempt, error = %e, "Restore attempt failed, retrying");
                    std::thread::sleep(RESTORE_RETRY_DELAY);
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        live = %live_dir.display(),
                        backup = %backup.display(),
                        install_error = %cause,
                        rollback_error = %e,
                        "Rollback failed; previous installation left at backup path"
                    );
                    return UpdateError::RollbackFailed {
                        live: live_dir.to_path_buf(),
                        backup: backup.to_path_buf(),
                        install_error: error_chain(&cause),
                        source: e,
                    };
                }
            }
        }
    }
}

fn restore(live_dir: &Path, backup: &Path) -> io::Result<()> {
    remove_tree(live_dir)?;
    debug!(live = %live_dir.display(), "Removed partial installation");
    fs::rename(backup, live_dir)
}

fn error_chain(error: &UpdateError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
