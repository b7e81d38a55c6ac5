//! Compare the installed version with the latest release.

use super::common::CommandContext;
use crate::update::VersionCheck;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Check even if update checks are disabled in the configuration
    #[arg(long)]
    force: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl CheckCommand {
    /// Failures to resolve either version are not errors: they are shown as
    /// `unknown` and no update is offered.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let ctx = CommandContext::load(config_path).await?;

        if !ctx.config.check_for_updates && !self.force {
            if self.json {
                println!("{}", serde_json::json!({ "enabled": false, "update_available": false }));
            } else {
                println!("{}", "Update checks are disabled in the configuration".yellow());
            }
            return Ok(());
        }

        let check = ctx.updater()?.check().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&to_json(&check))?);
        } else {
            print_check(&check);
        }
        Ok(())
    }
}

fn to_json(check: &VersionCheck) -> serde_json::Value {
    serde_json::json!({
        "enabled": true,
        "current": check.current,
        "latest": check.latest,
        "update_available": check.update_available,
        "release_url": check.release.as_ref().map(|r| r.detail_page_url.clone()),
    })
}

fn print_check(check: &VersionCheck) {
    println!("Installed: {}", check.current.bold());
    println!("Latest:    {}", check.latest.bold());

    if check.update_available {
        println!(
            "{}",
            format!("Update available: {} -> {}", check.current, check.latest).green()
        );
        println!("Run `papp-update update` to install it");
    } else if check.latest == crate::constants::UNKNOWN_VERSION {
        println!("{}", "Could not determine the latest release".yellow());
    } else {
        println!("{}", "You are on the latest version".green());
    }
}
