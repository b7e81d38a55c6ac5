//! Download and install the latest release.
//!
//! The update is offered only when both versions are known and the installed
//! one is older. Unless `--yes` is given the user confirms first. Progress is
//! shown as a single bar moving through the pipeline stages.
//!
//! On failure the error is reported prominently and whatever installation is
//! live stays in place. With `--restart` the application is started either
//! way, unless the rollback itself failed and the live directory may be gone.

use super::common::CommandContext;
use crate::constants::UPDATE_COMPLETE_MESSAGE;
use crate::core::UpdateError;
use crate::update::{ProgressEvent, UpdateOutcome, VersionCheck};
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Install without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Start the application after the update
    #[arg(long)]
    restart: bool,
}

impl UpdateCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let ctx = CommandContext::load(config_path).await?;
        let updater = ctx.updater()?;

        println!("{}", "Checking for updates...".cyan());
        let check = updater.check().await;

        let release = match &check.release {
            Some(release) if check.update_available => release.clone(),
            _ => {
                report_no_update(&check);
                return self.finish(&ctx);
            }
        };

        if !self.yes && !confirm(&check)? {
            println!("Update cancelled");
            return self.finish(&ctx);
        }

        let bar = ProgressBar::new(100);
        let reporter = {
            let bar = bar.clone();
            move |event: &ProgressEvent| {
                bar.set_position(u64::from(event.percent));
                bar.set_message(event.message.clone());
            }
        };

        match updater.install_release(&release, &reporter).await {
            Ok(UpdateOutcome::Installed { version }) => {
                bar.finish_with_message(format!("Installed {version}"));
                println!("{}", UPDATE_COMPLETE_MESSAGE.green());
                self.finish(&ctx)
            }
            Ok(UpdateOutcome::UpToDate { current }) => {
                bar.finish_and_clear();
                println!("{}", format!("You are on the latest version ({current})").green());
                self.finish(&ctx)
            }
            Err(e) => {
                bar.abandon_with_message("Update failed");
                self.handle_failure(&ctx, e)
            }
        }
    }

    fn handle_failure(&self, ctx: &CommandContext, e: UpdateError) -> Result<()> {
        if e.is_fatal_rollback() {
            error!(error = %e, "Installation could not be restored");
        } else if self.restart {
            eprintln!("{}", "Update failed; starting the existing installation".yellow());
            if let Err(launch) = self.finish(ctx) {
                warn!(error = %launch, "Could not restart the application");
            }
        }

        Err(anyhow::Error::from(e).context("Update failed"))
    }

    /// Relaunch the application if requested.
    fn finish(&self, ctx: &CommandContext) -> Result<()> {
        if !self.restart {
            return Ok(());
        }
        match ctx.launcher_executable() {
            Some(path) => relaunch(&path),
            None => {
                warn!("--restart given but no launcher_path is configured");
                println!("{}", "No launcher_path configured; start the application manually".yellow());
                Ok(())
            }
        }
    }
}

fn report_no_update(check: &VersionCheck) {
    if check.release.is_none() {
        println!("{}", "Could not determine the latest release; nothing to do".yellow());
    } else if !crate::update::version::is_known(&check.current) {
        println!(
            "{}",
            format!("Installed version is unknown; not updating to {}", check.latest).yellow()
        );
    } else {
        println!("{}", format!("You are on the latest version ({})", check.current).green());
    }
}

fn confirm(check: &VersionCheck) -> Result<bool> {
    print!(
        "A new version is available (current: {}, latest: {}). Do you want to update now? [y/N] ",
        check.current, check.latest
    );
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer).context("Failed to read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Start `path` detached from this process.
fn relaunch(path: &Path) -> Result<()> {
    info!(path = %path.display(), "Restarting application");
    let mut command = std::process::Command::new(path);
    if let Some(dir) = path.parent() {
        command.current_dir(dir);
    }
    command
        .spawn()
        .with_context(|| format!("Failed to start {}", path.display()))?;
    Ok(())
}
