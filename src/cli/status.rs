//! Show what is installed and where.

use super::common::CommandContext;
use crate::constants::UNKNOWN_VERSION;
use crate::update::{VersionRecordStore, backup_path, read_bundle_version};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let ctx = CommandContext::load(config_path).await?;
        let options = ctx.options();

        let recorded = VersionRecordStore::new(&options.record_path)
            .read_version()
            .unwrap_or_else(|_| UNKNOWN_VERSION.to_string());
        let bundle = read_bundle_version(&options.app_dir, &options.marker_file)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        let installed = options.app_dir.join(&options.marker_file).is_file();

        println!("{}", "Portable installation".bold());
        println!("  Recorded version: {recorded}");
        println!("  Bundle version:   {bundle}");
        println!("  Install dir:      {}", options.app_dir.display());
        println!("  Version record:   {}", options.record_path.display());
        println!("  Release page:     {}", ctx.config.release_page_url);
        println!(
            "  Update checks:    {}",
            if ctx.config.check_for_updates { "enabled" } else { "disabled" }
        );

        if !installed {
            println!(
                "{}",
                format!("warning: {} not found in the install dir", options.marker_file).yellow()
            );
        }

        let backup = backup_path(&options.app_dir);
        if backup.exists() {
            println!(
                "{}",
                format!(
                    "warning: a backup from an interrupted update exists at {}; updates are blocked until it is removed",
                    backup.display()
                )
                .yellow()
            );
        }

        Ok(())
    }
}
