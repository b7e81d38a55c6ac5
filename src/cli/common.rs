//! Shared setup for commands that operate on an installation.

use crate::config::UpdaterConfig;
use crate::update::{Updater, UpdaterOptions};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// Loaded configuration plus the directory relative paths resolve against.
pub struct CommandContext {
    pub config: UpdaterConfig,
    pub base_dir: PathBuf,
}

impl CommandContext {
    pub async fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = UpdaterConfig::load_with_optional(config_path)
            .await
            .context("Failed to load updater configuration")?;
        let base_dir = UpdaterConfig::launcher_dir()?;
        debug!(base = %base_dir.display(), "Resolving paths against launcher directory");

        Ok(Self { config, base_dir })
    }

    pub fn options(&self) -> UpdaterOptions {
        self.config.to_options(&self.base_dir)
    }

    pub fn updater(&self) -> Result<Updater> {
        Updater::new(self.options()).context("Failed to initialise updater")
    }

    pub fn launcher_executable(&self) -> Option<PathBuf> {
        self.config.launcher_executable(&self.base_dir)
    }
}
