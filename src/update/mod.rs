//! Self-update pipeline for the portable launcher.
//!
//! An update runs six stages in order, each depending on the one before:
//!
//! 1. [`VersionResolver`] compares the recorded version with the latest release
//! 2. [`ArtifactFetcher`] streams the release archive to a scratch directory
//! 3. [`extract`] unpacks the 7z archive next to it
//! 4. [`PayloadLocator`] finds the bundle directory inside the extracted tree
//! 5. [`InstallTransaction`] swaps the live installation for the bundle
//! 6. [`VersionRecordStore`] records the new version
//!
//! A failure in any of stages 2-4 leaves the live installation untouched.
//! Stage 5 rolls itself back on failure. A failure in stage 6 is only logged:
//! the new bundle is already live.
//!
//! Blocking filesystem work runs on the blocking thread pool and is awaited
//! immediately, so stages never overlap. Scratch directories are removed on
//! every exit path.
//!
//! # Example
//!
//! ```rust,no_run
//! use portable_updater::update::{LogReporter, UpdateOutcome, Updater, UpdaterOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let updater = Updater::new(UpdaterOptions::default())?;
//! match updater.run_update(&LogReporter).await? {
//!     UpdateOutcome::Installed { version } => println!("now on {version}, restarting"),
//!     UpdateOutcome::UpToDate { current } => println!("{current} is current"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod fetch;
pub mod install;
pub mod locate;
pub mod progress;
pub mod record;
pub mod release;
pub mod version;


pub use extract::{ArchiveEntry, ExtractSummary, extract};
pub use fetch::ArtifactFetcher;
pub use install::{FsCopier, InstallTransaction, TreeCopier, backup_path};
pub use locate::PayloadLocator;
pub use progress::{ChannelReporter, LogReporter, ProgressEvent, ProgressReporter, UpdateStage};
pub use record::VersionRecordStore;
pub use release::{ReleaseClient, ReleaseInfo};
pub use version::{VersionCheck, VersionResolver, compare_versions, read_bundle_version};

use crate::constants::{
    DEFAULT_ARTIFACT_NAME, DEFAULT_MARKER_FILE, DEFAULT_PAYLOAD_DIR, DEFAULT_RECORD_FILE,
    DEFAULT_RELEASES_API_URL, DEFAULT_USER_AGENT, DOWNLOAD_TIMEOUT, METADATA_TIMEOUT,
    UPDATE_COMPLETE_MESSAGE,
};
use crate::core::{Result, UpdateError};
use crate::utils::fs::list_top_level;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Everything the pipeline needs to know, with paths already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterOptions {
    pub releases_api_url: String,
    pub user_agent: String,
    pub artifact_name: String,
    pub marker_file: String,
    pub payload_dir_name: String,
    /// Live installation directory
    pub app_dir: PathBuf,
    /// Version record file
    pub record_path: PathBuf,
    pub metadata_timeout: Duration,
    pub download_timeout: Duration,
}

impl Default for UpdaterOptions {
    fn default() -> Self {
        Self {
            releases_api_url: DEFAULT_RELEASES_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            marker_file: DEFAULT_MARKER_FILE.to_string(),
            payload_dir_name: DEFAULT_PAYLOAD_DIR.to_string(),
            app_dir: PathBuf::from(DEFAULT_PAYLOAD_DIR),
            record_path: PathBuf::from(DEFAULT_RECORD_FILE),
            metadata_timeout: METADATA_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

/// Result of a pipeline run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The new bundle is live. The caller should relaunch and exit.
    Installed {
        version: String,
    },
    /// Nothing to do: already current, or a version could not be resolved.
    UpToDate {
        current: String,
    },
}

/// Drives the update pipeline.
#[derive(Debug, Clone)]
pub struct Updater {
    options: UpdaterOptions,
    resolver: VersionResolver,
    fetcher: ArtifactFetcher,
    locator: PayloadLocator,
    installer: InstallTransaction,
    record: VersionRecordStore,
}

impl Updater {
    /// Build an updater with HTTP clients configured from `options`.
    pub fn new(options: UpdaterOptions) -> Result<Self> {
        let record = VersionRecordStore::new(&options.record_path);
        let releases = ReleaseClient::new(
            &options.releases_api_url,
            &options.user_agent,
            options.metadata_timeout,
        )?;

        Ok(Self {
            resolver: VersionResolver::new(record.clone(), releases),
            fetcher: ArtifactFetcher::new(&options.user_agent, options.download_timeout)?,
            locator: PayloadLocator::new(&options.marker_file, &options.payload_dir_name),
            installer: InstallTransaction::default(),
            record,
            options,
        })
    }

    /// Replace the tree copier used by the install stage.
    #[must_use]
    pub fn with_copier(mut self, copier: Arc<dyn TreeCopier>) -> Self {
        self.installer = InstallTransaction::new(copier);
        self
    }

    pub fn options(&self) -> &UpdaterOptions {
        &self.options
    }

    /// Resolve the installed and latest versions. Never fails.
    pub async fn check(&self) -> VersionCheck {
        self.resolver.resolve_versions().await
    }

    /// Check for an update and install it if one is available.
    pub async fn run_update(&self, reporter: &dyn ProgressReporter) -> Result<UpdateOutcome> {
        let check = self.check().await;
        match check.release {
            Some(release) if check.update_available => self.install_release(&release, reporter).await,
            _ => Ok(UpdateOutcome::UpToDate {
                current: check.current,
            }),
        }
    }

    /// Download, unpack, and install `release`, then record its version.
    ///
    /// Used directly when the caller has already checked and confirmed the
    /// update with the user.
    pub async fn install_release(
        &self,
        release: &ReleaseInfo,
        reporter: &dyn ProgressReporter,
    ) -> Result<UpdateOutcome> {
        let version = release.version().to_string();
        info!(version = %version, "Starting update");
        reporter.report(&ProgressEvent::new(UpdateStage::Starting, "Preparing update"));

        let scratch = TempDir::new()
            .map_err(|e| UpdateError::fs("create scratch directory", std::env::temp_dir(), e))?;
        let archive = scratch.path().join(&self.options.artifact_name);
        let extract_root = scratch.path().join("extracted");

        reporter.report(&ProgressEvent::new(
            UpdateStage::Downloading,
            format!("Downloading {version}"),
        ));
        let url = release.download_url(&self.options.artifact_name);
        self.fetcher.download(&url, &archive).await?;
        let size = fetch::ensure_non_empty(&archive).await?;
        debug!(bytes = size, "Artifact ready");

        reporter.report(&ProgressEvent::new(UpdateStage::Extracting, "Extracting update"));
        let payload = {
            let archive = archive.clone();
            let extract_root = extract_root.clone();
            let locator = self.locator.clone();
            run_blocking("extract update", move || {
                extract(&archive, &extract_root)?;
                debug!(entries = ?list_top_level(&extract_root), "Extracted top-level entries");
                locator.locate(&extract_root)
            })
            .await?
        };

        reporter.report(&ProgressEvent::new(UpdateStage::Installing, "Installing update"));
        {
            let installer = self.installer.clone();
            let app_dir = self.options.app_dir.clone();
            run_blocking("install update", move || installer.install(&payload, &app_dir)).await?;
        }

        if let Err(e) = self.record.record_version(&version) {
            warn!(error = %e, "Update installed but the version record was not written");
        }

        reporter.report(&ProgressEvent::new(UpdateStage::Complete, UPDATE_COMPLETE_MESSAGE));

        if let Err(e) = scratch.close() {
            debug!(error = %e, "Could not remove scratch directory");
        }

        Ok(UpdateOutcome::Installed { version })
    }
}

/// Run blocking filesystem work on the blocking pool and wait for it.
async fn run_blocking<T, F>(operation: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        UpdateError::fs(operation, PathBuf::new(), io::Error::other(e.to_string()))
    })?
}
