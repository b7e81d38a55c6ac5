//! Progress indicators for the command-line front end
//!
//! Wraps `indicatif` with a consistent style. Bars are hidden when the
//! `PAPP_NO_PROGRESS` environment variable is set (the `--no-progress` flag
//! sets it), which keeps output clean in scripts and CI logs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use portable_updater::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(100);
//! progress.set_message("Downloading update");
//! progress.set_position(20);
//! progress.finish_with_message("Done");
//! ```

use crate::constants::NO_PROGRESS_ENV;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Checks if progress bars should be disabled.
///
/// Any value of `PAPP_NO_PROGRESS`, including the empty string, disables them.
pub fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// Cloning yields a handle to the same bar, so it can be moved into the
/// progress reporter while the caller keeps one to finish it.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Create a bar of `len` steps, hidden when progress is disabled.
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(percent_style());
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        };
        Self { inner: bar }
    }

    /// Create a bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Whether the bar is drawing to the terminal.
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn abandon_with_message(&self, msg: impl Into<String>) {
        self.inner.abandon_with_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn percent_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
}
