//! Atomic file write operations using a temp-and-rename strategy.
//!
//! Readers of the target never observe a half-written file: content goes to
//! a sibling temporary file which is synced and renamed over the target.

use crate::core::{Result, UpdateError};
use crate::utils::fs::dirs::ensure_parent_dir;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `content` to `path` atomically, creating parent directories.
///
/// # Examples
///
/// ```rust,no_run
/// use portable_updater::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> portable_updater::core::Result<()> {
/// atomic_write(Path::new("portapp.json"), b"{\n  \"version\": \"11.23.1\"\n}")?;
/// # Ok(())
/// # }
/// ```
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut file = fs::File::create(&temp_path)
            .map_err(|e| UpdateError::fs("create temp file", &temp_path, e))?;
        file.write_all(content).map_err(|e| UpdateError::fs("write temp file", &temp_path, e))?;
        file.sync_all().map_err(|e| UpdateError::fs("sync temp file", &temp_path, e))?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(UpdateError::fs("replace file", path, e));
    }

    Ok(())
}
