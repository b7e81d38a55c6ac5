//! Builders for test data: 7z archives and fault-injecting copiers.

use crate::core::Result as UpdateResult;
use crate::update::install::TreeCopier;
use crate::utils::fs::{CopyStats, copy_dir_with};
use anyhow::{Context, Result};
use sevenz_rust::{SevenZArchiveEntry, SevenZWriter};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

const UNIX_EXTENSION_FLAG: u32 = 0x8000;
const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x20;

#[derive(Clone, Debug)]
enum FixtureEntry {
    Dir(String),
    File {
        name: String,
        content: Vec<u8>,
        mode: Option<u32>,
    },
}

/// Builder for 7z archives with explicit entry names.
///
/// Entry names are written exactly as given, including unsafe ones such as
/// `../escape.txt`, so extraction hardening can be tested.
///
/// ```rust,no_run
/// use portable_updater::test_utils::ArchiveFixture;
/// use std::path::Path;
///
/// ArchiveFixture::new()
///     .file("core/app/floorp.exe", b"MZ")
///     .write_to(Path::new("/tmp/bundle.7z"))
///     .unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct ArchiveFixture {
    entries: Vec<FixtureEntry>,
}

impl ArchiveFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A typical release layout: `core/app/<marker>` plus a few resources.
    pub fn release_bundle(marker: &str, version: &str) -> Self {
        Self::new()
            .dir("core")
            .dir("core/app")
            .file(&format!("core/app/{marker}"), format!("binary {version}").as_bytes())
            .file(
                "core/app/application.ini",
                format!("[App]\nName=Floorp\nVersion={version}\n").as_bytes(),
            )
            .file("core/app/browser/omni.ja", format!("omni {version}").as_bytes())
            .file("setup.exe", b"installer stub")
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Dir(name.to_string()));
        self
    }

    pub fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            content: content.to_vec(),
            mode: None,
        });
        self
    }

    /// Add a file carrying Unix mode bits (e.g. `0o100755`).
    pub fn file_with_mode(mut self, name: &str, content: &[u8], mode: u32) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            content: content.to_vec(),
            mode: Some(mode),
        });
        self
    }

    /// Write the archive to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = SevenZWriter::create(path)
            .with_context(|| format!("Failed to create archive {}", path.display()))?;

        for entry in &self.entries {
            match entry {
                FixtureEntry::Dir(name) => {
                    let mut header = SevenZArchiveEntry::default();
                    header.name = name.clone();
                    header.is_directory = true;
                    writer
                        .push_archive_entry::<&[u8]>(header, None)
                        .with_context(|| format!("Failed to add directory {name}"))?;
                }
                FixtureEntry::File {
                    name,
                    content,
                    mode,
                } => {
                    let mut header = SevenZArchiveEntry::default();
                    header.name = name.clone();
                    if let Some(mode) = mode {
                        header.has_windows_attributes = true;
                        header.windows_attributes =
                            (mode << 16) | UNIX_EXTENSION_FLAG | FILE_ATTRIBUTE_ARCHIVE;
                    }
                    writer
                        .push_archive_entry(header, Some(content.as_slice()))
                        .with_context(|| format!("Failed to add file {name}"))?;
                }
            }
        }

        writer.finish().with_context(|| format!("Failed to finish archive {}", path.display()))?;
        Ok(())
    }

    /// Serialize the archive into memory, e.g. to serve it over HTTP.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("fixture.7z");
        self.write_to(&path)?;
        Ok(std::fs::read(&path)?)
    }
}

/// [`TreeCopier`] that copies `limit` files and then fails.
///
/// Files are visited in sorted order, so a given limit always fails at the
/// same file.
#[derive(Debug)]
pub struct FailingCopier {
    limit: usize,
    attempts: AtomicUsize,
}

impl FailingCopier {
    pub fn after(limit: usize) -> Self {
        Self {
            limit,
            attempts: AtomicUsize::new(0),
        }
    }

    /// How many files the copier has attempted so far, including the failing one.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl TreeCopier for FailingCopier {
    fn copy_tree(&self, src: &Path, dst: &Path) -> UpdateResult<CopyStats> {
        let mut copied = 0;
        copy_dir_with(src, dst, &mut |_| {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if copied == self.limit {
                return Err(io::Error::other("injected copy failure"));
            }
            copied += 1;
            Ok(())
        })
    }
}
