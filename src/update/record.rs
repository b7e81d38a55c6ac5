//! Local version record.
//!
//! A small JSON object stored next to the launcher. Only the `version` key
//! belongs to the updater; every other key is preserved untouched, in its
//! original order, when the record is rewritten.

use crate::core::{Result, UpdateError};
use crate::utils::fs::atomic_write;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const VERSION_KEY: &str = "version";

/// Reads and writes the installed-version record.
#[derive(Debug, Clone)]
pub struct VersionRecordStore {
    path: PathBuf,
}

impl VersionRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded version.
    ///
    /// A missing file, invalid JSON, or a missing or non-string `version`
    /// field all yield [`UpdateError::VersionUnknown`].
    pub fn read_version(&self) -> Result<String> {
        let unknown = |reason: String| UpdateError::VersionUnknown { reason };

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| unknown(format!("cannot read {}: {e}", self.path.display())))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| unknown(format!("invalid JSON in {}: {e}", self.path.display())))?;

        match value.get(VERSION_KEY).and_then(Value::as_str) {
            Some(version) if !version.is_empty() => Ok(version.to_string()),
            _ => Err(unknown(format!("no version field in {}", self.path.display()))),
        }
    }

    /// Persist `new_version`, keeping every other field of the record.
    ///
    /// A missing record is created. An existing record that is not a JSON
    /// object is left alone and reported as [`UpdateError::RecordWrite`]. The
    /// file is written atomically with two-space indentation.
    pub fn record_version(&self, new_version: &str) -> Result<()> {
        let mut record = self.read_object()?;
        record.insert(VERSION_KEY.to_string(), Value::String(new_version.to_string()));

        let mut content =
            serde_json::to_string_pretty(&Value::Object(record)).map_err(|e| UpdateError::RecordWrite {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        content.push('\n');

        atomic_write(&self.path, content.as_bytes()).map_err(|e| UpdateError::RecordWrite {
            path: self.path.clone(),
            reason: match std::error::Error::source(&e) {
                Some(cause) => format!("{e}: {cause}"),
                None => e.to_string(),
            },
        })?;

        info!(version = new_version, path = %self.path.display(), "Version record updated");
        Ok(())
    }

    fn read_object(&self) -> Result<Map<String, Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No version record yet, creating one");
                return Ok(Map::new());
            }
            Err(e) => {
                return Err(UpdateError::RecordWrite {
                    path: self.path.clone(),
                    reason: format!("cannot read existing record: {e}"),
                });
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(UpdateError::RecordWrite {
                path: self.path.clone(),
                reason: "existing record is not a JSON object".to_string(),
            }),
            Err(e) => Err(UpdateError::RecordWrite {
                path: self.path.clone(),
                reason: format!("existing record is not valid JSON: {e}"),
            }),
        }
    }
}
