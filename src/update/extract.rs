//! 7z archive extraction.
//!
//! Entries are streamed straight from the archive into the destination
//! directory; nothing is buffered beyond the copy buffer. Directory entries
//! are skipped and parents are created on demand, so archives that omit
//! directory entries extract the same as ones that carry them.
//!
//! Entry names are untrusted. Each one is validated before it is joined with
//! the destination (see [`validate_entry_path`]).

use crate::core::{Result, UpdateError};
use crate::utils::fs::set_mode;
use crate::utils::path_validation::validate_entry_path;
use sevenz_rust::{Password, SevenZArchiveEntry, SevenZReader};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Set in the Windows attribute word when the high 16 bits carry a Unix mode.
const UNIX_EXTENSION_FLAG: u32 = 0x8000;

/// One archive member, as seen during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Validated path relative to the destination directory
    pub relative_path: PathBuf,
    pub is_directory: bool,
    /// Unix mode bits recorded in the archive, if any
    pub mode: Option<u32>,
    pub size: u64,
}

impl ArchiveEntry {
    fn from_sevenz(entry: &SevenZArchiveEntry) -> Result<Self> {
        Ok(Self {
            relative_path: validate_entry_path(entry.name())?,
            is_directory: entry.is_directory(),
            mode: unix_mode(entry.has_windows_attributes, entry.windows_attributes),
            size: entry.size(),
        })
    }
}

/// Decode the Unix mode stored in a 7z attribute word.
///
/// Archivers on Unix store `(mode << 16) | 0x8000` alongside the Windows
/// attribute bits. Without the flag there is no mode to restore.
#[must_use]
pub fn unix_mode(has_attributes: bool, attributes: u32) -> Option<u32> {
    if has_attributes && attributes & UNIX_EXTENSION_FLAG != 0 {
        let mode = attributes >> 16;
        (mode != 0).then_some(mode)
    } else {
        None
    }
}

/// Totals for one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: u64,
    pub directories: u64,
    pub bytes: u64,
}

/// Extract the 7z archive at `archive_path` into `destination_dir`.
///
/// File contents are copied byte for byte and recorded mode bits are applied.
/// Failing to apply a mode is logged and ignored. Any other failure aborts
/// extraction with [`UpdateError::Archive`], keeping the I/O cause for entry
/// copy failures; files already written are left for the caller to discard
/// along with the scratch directory.
pub fn extract(archive_path: &Path, destination_dir: &Path) -> Result<ExtractSummary> {
    info!(
        archive = %archive_path.display(),
        destination = %destination_dir.display(),
        "Extracting archive"
    );

    fs::create_dir_all(destination_dir).map_err(|e| {
        UpdateError::archive_io(format!("Cannot create {}", destination_dir.display()), e)
    })?;

    let mut reader = SevenZReader::open(archive_path, Password::empty()).map_err(|e| {
        UpdateError::archive(format!("Cannot open archive {}: {e}", archive_path.display()))
    })?;

    let mut summary = ExtractSummary::default();
    let mut failure: Option<UpdateError> = None;

    let walk = reader.for_each_entries(|entry, content| {
        match extract_entry(entry, content, destination_dir, &mut summary) {
            Ok(()) => Ok(true),
            Err(e) => {
                failure = Some(e);
                Ok(false)
            }
        }
    });

    if let Some(e) = failure {
        return Err(e);
    }
    walk.map_err(|e| {
        UpdateError::archive(format!("Cannot read archive {}: {e}", archive_path.display()))
    })?;

    info!(files = summary.files, bytes = summary.bytes, "Extraction complete");
    Ok(summary)
}

fn extract_entry(
    entry: &SevenZArchiveEntry,
    content: &mut dyn Read,
    destination_dir: &Path,
    summary: &mut ExtractSummary,
) -> Result<()> {
    let entry = ArchiveEntry::from_sevenz(entry)?;

    if entry.is_directory {
        summary.directories += 1;
        return Ok(());
    }

    let entry_error = |what: &str, e: io::Error| {
        UpdateError::archive_io(format!("Cannot {what} {}", entry.relative_path.display()), e)
    };

    let target = destination_dir.join(&entry.relative_path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| entry_error("create parent directory of", e))?;
    }
    let mut file = File::create(&target).map_err(|e| entry_error("create", e))?;
    let written = io::copy(content, &mut file).map_err(|e| entry_error("extract", e))?;
    drop(file);

    if written != entry.size {
        debug!(
            path = %entry.relative_path.display(),
            expected = entry.size,
            written,
            "Entry size differs from header"
        );
    }

    if let Some(mode) = entry.mode {
        if let Err(e) = set_mode(&target, mode) {
            warn!(path = %target.display(), mode = %format!("{mode:o}"), error = %e, "Could not set file mode");
        }
    }

    summary.files += 1;
    summary.bytes += written;
    Ok(())
}
