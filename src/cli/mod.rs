//! Command-line interface for the portable updater.
//!
//! # Commands
//!
//! - `check` - Compare the installed version with the latest release
//! - `status` - Show what is installed and where
//! - `update` - Download and install the latest release
//! - `config` - Create or inspect the configuration file
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only
//! - `--config` / `-c` - Configuration file (also `PAPP_UPDATER_CONFIG`)
//! - `--no-progress` - Hide progress bars (also `PAPP_NO_PROGRESS`)
//!
//! # Examples
//!
//! ```bash
//! # Launcher start-up check, machine readable
//! papp-update check --json
//!
//! # Interactive update, relaunching the application afterwards
//! papp-update update --restart
//!
//! # Unattended update
//! papp-update --no-progress update --yes
//! ```

mod check;
mod common;
mod config;
mod status;
mod update;


use crate::constants::NO_PROGRESS_ENV;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `RUST_LOG` takes precedence when set
    pub log_level: String,
    /// Whether to hide progress bars
    pub no_progress: bool,
    /// Configuration file override
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Export settings that deeper layers read from the environment.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: called once at start-up before any other thread is spawned
            unsafe {
                std::env::set_var(NO_PROGRESS_ENV, "1");
            }
        }
    }

    /// Install the global tracing subscriber, writing to stderr.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "papp-update",
    about = "Keep a portable application installation up to date",
    version,
    author,
    long_about = "Checks upstream releases and replaces the portable installation in place, \
                  restoring the previous installation if anything goes wrong."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "PAPP_UPDATER_CONFIG")]
    config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a newer release is available
    Check(check::CheckCommand),

    /// Show the installed version and installation paths
    Status(status::StatusCommand),

    /// Download and install the latest release
    Update(update::UpdateCommand),

    /// Manage the configuration file
    Config(config::ConfigCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply_to_env();
        config.init_logging();

        match self.command {
            Commands::Check(cmd) => cmd.execute(config.config_path).await,
            Commands::Status(cmd) => cmd.execute(config.config_path).await,
            Commands::Update(cmd) => cmd.execute(config.config_path).await,
            Commands::Config(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
