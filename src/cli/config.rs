//! Create and inspect the updater configuration file.

use crate::config::UpdaterConfig;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration and resolved paths
    Show,

    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let path = match config_path {
            Some(path) => path,
            None => UpdaterConfig::default_path()?,
        };

        match self.command {
            Some(ConfigSubcommands::Init { force }) => Self::init(path, force).await,
            Some(ConfigSubcommands::Show) | None => Self::show(path).await,
            Some(ConfigSubcommands::Path) => {
                println!("{}", path.display());
                Ok(())
            }
        }
    }

    async fn init(path: PathBuf, force: bool) -> Result<()> {
        if path.exists() && !force {
            println!("Configuration already exists at: {}", path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        let config = UpdaterConfig::default();
        config.save_to(&path).await?;

        println!("{} {}", "Created configuration at:".green(), path.display());
        Ok(())
    }

    async fn show(path: PathBuf) -> Result<()> {
        let exists = path.exists();
        let config = UpdaterConfig::load_with_optional(Some(path.clone())).await?;
        let base = UpdaterConfig::launcher_dir()?;
        let options = config.to_options(&base);

        println!("{}", "Updater Configuration".bold());
        if exists {
            println!("Location: {}\n", path.display());
        } else {
            println!("Location: {} (not created, showing defaults)\n", path.display());
        }
        println!("{}", toml::to_string_pretty(&config)?);

        println!("{}", "Resolved paths".bold());
        println!("  Install dir:    {}", options.app_dir.display());
        println!("  Version record: {}", options.record_path.display());
        if let Some(launcher) = config.launcher_executable(&base) {
            println!("  Launcher:       {}", launcher.display());
        }
        Ok(())
    }
}
