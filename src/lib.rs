//! portable-updater - self-update engine for portable application launchers
//!
//! Keeps a portable application bundle in sync with the latest upstream
//! release without an installer or elevated privileges. The installed bundle
//! is always left runnable: every failure either happens before the live
//! directory is touched or is rolled back.
//!
//! # Architecture Overview
//!
//! An update is a strictly sequential pipeline:
//!
//! ```text
//! version check -> download -> extract (7z) -> locate payload -> install -> record version
//! ```
//!
//! - The version check never fails; an unresolvable version simply means no
//!   update is offered.
//! - Download, extraction, and payload lookup happen in a scratch directory
//!   that is removed afterwards.
//! - The install step renames the live directory aside, copies the payload
//!   in, and restores the backup if anything goes wrong.
//!
//! # Core Modules
//!
//! - [`update`] - The pipeline and its stages
//! - [`config`] - Per-user TOML configuration
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - The `papp-update` command-line front end
//! - [`utils`] - Filesystem helpers, path validation, progress bars
//! - [`constants`] - Timeouts, defaults, and sentinel values
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use portable_updater::config::UpdaterConfig;
//! use portable_updater::update::{LogReporter, UpdateOutcome, Updater};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpdaterConfig::load_with_optional(None).await?;
//! let base = UpdaterConfig::launcher_dir()?;
//! let updater = Updater::new(config.to_options(&base))?;
//!
//! let check = updater.check().await;
//! if check.update_available {
//!     if let UpdateOutcome::Installed { version } = updater.run_update(&LogReporter).await? {
//!         println!("Installed {version}; relaunch now");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod update;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
