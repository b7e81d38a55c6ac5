//! Per-user updater configuration.
//!
//! Stored as TOML at `~/.papp-updater/config.toml` (`%LOCALAPPDATA%\papp-updater\config.toml`
//! on Windows). Every field has a default, so a missing file or a partial file
//! is always valid.
//!
//! # Example
//!
//! ```toml
//! check_for_updates = true
//! releases_api_url = "https://api.github.com/repos/Floorp-Projects/Floorp/releases/latest"
//! artifact_name = "floorp-win64.installer.exe"
//! marker_file = "floorp.exe"
//! app_path = "app"
//! record_path = "portapp.json"
//! launcher_path = "FloorpPortable.exe"
//! download_timeout_secs = 600
//! ```
//!
//! Relative paths resolve against the launcher directory, the directory
//! holding the running executable. `~` is expanded.

use crate::constants::{
    DEFAULT_ARTIFACT_NAME, DEFAULT_MARKER_FILE, DEFAULT_PAYLOAD_DIR, DEFAULT_RECORD_FILE,
    DEFAULT_RELEASE_PAGE_URL, DEFAULT_RELEASES_API_URL, DEFAULT_USER_AGENT, DOWNLOAD_TIMEOUT,
    METADATA_TIMEOUT,
};
use crate::core::{Result, UpdateError};
use crate::update::UpdaterOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Updater configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Whether launches should look for a new release.
    pub check_for_updates: bool,

    /// Endpoint returning the latest release as JSON.
    pub releases_api_url: String,

    /// Human-facing release page. Informational only.
    pub release_page_url: String,

    /// User-Agent sent with every request.
    pub user_agent: String,

    /// File name of the release artifact.
    pub artifact_name: String,

    /// Executable that marks a directory as a runnable bundle.
    pub marker_file: String,

    /// Conventional name of the bundle directory.
    pub payload_dir_name: String,

    /// Live installation directory. Defaults to `<launcher dir>/<payload_dir_name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_path: Option<PathBuf>,

    /// Version record file. Defaults to `<launcher dir>/portapp.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_path: Option<PathBuf>,

    /// Executable started after a successful update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launcher_path: Option<PathBuf>,

    pub metadata_timeout_secs: u64,

    pub download_timeout_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            check_for_updates: true,
            releases_api_url: DEFAULT_RELEASES_API_URL.to_string(),
            release_page_url: DEFAULT_RELEASE_PAGE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            marker_file: DEFAULT_MARKER_FILE.to_string(),
            payload_dir_name: DEFAULT_PAYLOAD_DIR.to_string(),
            app_path: None,
            record_path: None,
            launcher_path: None,
            metadata_timeout_secs: METADATA_TIMEOUT.as_secs(),
            download_timeout_secs: DOWNLOAD_TIMEOUT.as_secs(),
        }
    }
}

impl UpdaterConfig {
    /// Load from `path`, or from [`Self::default_path`] when `None`.
    ///
    /// A missing file yields the defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| UpdateError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        toml::from_str(&content).map_err(|e| UpdateError::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write configuration to {}", path.display()))
    }

    /// Default configuration file location.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| UpdateError::Config {
                    message: "Unable to determine local data directory".to_string(),
                })?
                .join("papp-updater")
        } else {
            dirs::home_dir()
                .ok_or_else(|| UpdateError::Config {
                    message: "Unable to determine home directory".to_string(),
                })?
                .join(".papp-updater")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Directory holding the running executable.
    pub fn launcher_dir() -> Result<PathBuf> {
        let exe = std::env::current_exe()
            .map_err(|e| UpdateError::fs("locate current executable", PathBuf::new(), e))?;
        Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
    }

    /// Live installation directory, resolved against `base`.
    #[must_use]
    pub fn app_dir(&self, base: &Path) -> PathBuf {
        match &self.app_path {
            Some(path) => resolve_path(path, base),
            None => base.join(&self.payload_dir_name),
        }
    }

    /// Version record file, resolved against `base`.
    #[must_use]
    pub fn record_file(&self, base: &Path) -> PathBuf {
        match &self.record_path {
            Some(path) => resolve_path(path, base),
            None => base.join(DEFAULT_RECORD_FILE),
        }
    }

    /// Executable to start after an update, resolved against `base`.
    #[must_use]
    pub fn launcher_executable(&self, base: &Path) -> Option<PathBuf> {
        self.launcher_path.as_ref().map(|path| resolve_path(path, base))
    }

    /// Pipeline options with every path resolved against `base`.
    #[must_use]
    pub fn to_options(&self, base: &Path) -> UpdaterOptions {
        UpdaterOptions {
            releases_api_url: self.releases_api_url.clone(),
            user_agent: self.user_agent.clone(),
            artifact_name: self.artifact_name.clone(),
            marker_file: self.marker_file.clone(),
            payload_dir_name: self.payload_dir_name.clone(),
            app_dir: self.app_dir(base),
            record_path: self.record_file(base),
            metadata_timeout: Duration::from_secs(self.metadata_timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
        }
    }
}

/// Expand `~` and anchor relative paths at `base`.
fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    if expanded.is_absolute() { expanded } else { base.join(expanded) }
}
