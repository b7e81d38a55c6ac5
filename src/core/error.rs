//! Error handling for the updater
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can branch on the failing stage
//! 2. **User-friendly messages** with actionable suggestions for the CLI
//!
//! # Architecture
//!
//! - [`UpdateError`] - one variant per failure kind of the update pipeline
//! - [`ErrorContext`] - wrapper that adds suggestions and details for display
//!
//! Every pipeline stage wraps the originating cause with `#[source]`, so the
//! full chain is available through [`std::error::Error::source`] and through
//! `anyhow`'s `{:#}` formatting at the CLI layer.
//!
//! # Severity
//!
//! | Variant | Fatal to the update | Touches the live installation |
//! |---------|---------------------|-------------------------------|
//! | [`UpdateError::VersionUnknown`] | no, degrades to "no update" | no |
//! | [`UpdateError::Network`] / [`UpdateError::HttpStatus`] | yes | no |
//! | [`UpdateError::EmptyArtifact`] | yes | no |
//! | [`UpdateError::Archive`] | yes | no |
//! | [`UpdateError::PayloadNotFound`] | yes | no |
//! | [`UpdateError::Filesystem`] | yes | rolled back |
//! | [`UpdateError::RollbackFailed`] | yes, operator must intervene | live dir missing |
//! | [`UpdateError::RecordWrite`] | no, logged only | no |
//!
//! # Examples
//!
//! ```rust,no_run
//! use portable_updater::core::{UpdateError, user_friendly_error};
//!
//! let error = UpdateError::EmptyArtifact {
//!     path: "/tmp/update.7z".into(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for updater operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

/// The main error type for update operations.
///
/// Variants map one-to-one onto the failure kinds of the update pipeline.
/// Variants that wrap a lower-level failure keep it as `source` so the
/// originating cause is never lost.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A version could not be determined.
    ///
    /// Never fatal: the version resolver converts it into the `"unknown"`
    /// sentinel and reports "no update available".
    #[error("Version unknown: {reason}")]
    VersionUnknown {
        /// Why the version could not be resolved
        reason: String,
    },

    /// Transport-level failure (DNS, connect, TLS, timeout, body read).
    #[error("Network error during {operation}: {url}")]
    Network {
        /// What was being done (e.g. "release lookup", "download")
        operation: String,
        /// The URL being requested
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus {
        /// The URL being requested
        url: String,
        /// The status code received
        status: reqwest::StatusCode,
    },

    /// The release metadata could not be parsed.
    #[error("Invalid release metadata from {url}")]
    InvalidRelease {
        /// The URL the metadata came from
        url: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The downloaded artifact has zero bytes.
    #[error("Downloaded file is empty: {}", path.display())]
    EmptyArtifact {
        /// Location of the empty download
        path: PathBuf,
    },

    /// The archive could not be opened or read, an entry is unsafe to unpack,
    /// or an entry's content could not be copied out.
    ///
    /// Every failure during extraction lands here; the live installation has
    /// not been touched yet.
    #[error("Archive error: {reason}")]
    Archive {
        /// What went wrong, including the archive reader's message
        reason: String,
        /// I/O failure while copying an entry, if that is what went wrong
        #[source]
        source: Option<std::io::Error>,
    },

    /// No directory in the extracted tree contains the marker executable.
    #[error("Could not find '{marker}' in extracted content under {}", root.display())]
    PayloadNotFound {
        /// Extraction root that was searched
        root: PathBuf,
        /// Marker file name that was searched for
        marker: String,
    },

    /// A filesystem operation failed (rename, mkdir, copy, remove).
    #[error("File system error during {operation}: {}", path.display())]
    Filesystem {
        /// The operation that failed
        operation: String,
        /// The path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Restoring the previous installation failed after an install error.
    ///
    /// This is the most severe condition: the live directory may be missing.
    /// The backup location is preserved so an operator can restore it by hand.
    #[error(
        "Rollback failed: installation at {} could not be restored from {} ({install_error})",
        live.display(),
        backup.display()
    )]
    RollbackFailed {
        /// Live installation directory
        live: PathBuf,
        /// Backup directory that still holds the previous installation
        backup: PathBuf,
        /// The install failure that triggered the rollback
        install_error: String,
        /// The failure that stopped the rollback
        #[source]
        source: std::io::Error,
    },

    /// The local version record could not be written.
    ///
    /// Non-fatal: the new bundle is already live, only the bookkeeping is stale.
    #[error("Failed to write version record {}: {reason}", path.display())]
    RecordWrite {
        /// Version record path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },
}

impl UpdateError {
    /// Build a [`UpdateError::Filesystem`] from an I/O error.
    pub fn fs(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Build a [`UpdateError::Archive`].
    pub fn archive(reason: impl Into<String>) -> Self {
        Self::Archive {
            reason: reason.into(),
            source: None,
        }
    }

    /// Build a [`UpdateError::Archive`] caused by an I/O failure on an entry.
    pub fn archive_io(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::Archive {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Whether this error leaves the live installation in an unknown state.
    #[must_use]
    pub const fn is_fatal_rollback(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps an error with an optional suggestion and optional details. This is
/// how a failed, user-confirmed update is reported before the launcher
/// carries on with whatever installation is live.
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold, with its cause chain
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {:#}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl fmt::Debug for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorContext")
            .field("error", &format_args!("{:#}", self.error))
            .field("suggestion", &self.suggestion)
            .field("details", &self.details)
            .finish()
    }
}

/// Convert any error into a user-friendly format with contextual suggestions
///
/// Looks for an [`UpdateError`] anywhere in the chain and attaches advice for
/// that failure kind. Unknown errors are passed through unchanged.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let kind = error.chain().find_map(|cause| cause.downcast_ref::<UpdateError>());

    let Some(kind) = kind else {
        return ErrorContext::new(error);
    };

    match kind {
        UpdateError::VersionUnknown { .. } => ErrorContext::new(error)
            .with_details("The installed or upstream version could not be determined")
            .with_suggestion("Check that the version record file exists and contains a \"version\" field"),
        UpdateError::Network { .. } | UpdateError::HttpStatus { .. } => ErrorContext::new(error)
            .with_details("The release server could not be reached or refused the request")
            .with_suggestion("Check your network connection and try again later"),
        UpdateError::InvalidRelease { .. } => ErrorContext::new(error)
            .with_details("The release metadata did not contain the expected tag and page URL")
            .with_suggestion("Verify 'releases_api_url' in the updater configuration"),
        UpdateError::EmptyArtifact { .. } => ErrorContext::new(error)
            .with_details("The server reported success but sent no data")
            .with_suggestion("Retry the update; the download may have been truncated"),
        UpdateError::Archive { .. } => ErrorContext::new(error)
            .with_details("The downloaded release archive could not be unpacked")
            .with_suggestion("Retry the update; if it keeps failing the release artifact may be corrupt"),
        UpdateError::PayloadNotFound { marker, .. } => {
            let marker = marker.clone();
            ErrorContext::new(error)
                .with_details(format!(
                    "No directory in the archive contains '{marker}', so the layout is not recognised"
                ))
                .with_suggestion("Check 'artifact_name' and 'marker_file' in the updater configuration")
        }
        UpdateError::Filesystem { .. } => ErrorContext::new(error)
            .with_details("The live installation is unchanged or was restored from its backup")
            .with_suggestion("Make sure the application is not running and the directory is writable"),
        UpdateError::RollbackFailed { backup, live, .. } => {
            let hint = format!(
                "Restore manually by renaming '{}' to '{}'",
                backup.display(),
                live.display()
            );
            ErrorContext::new(error)
                .with_details("The installation directory could not be restored and may be missing")
                .with_suggestion(hint)
        }
        UpdateError::RecordWrite { .. } => ErrorContext::new(error)
            .with_details("The new version is installed but the version record is stale")
            .with_suggestion("The next update check will offer the same version again; this is harmless"),
        UpdateError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax in the updater configuration file"),
    }
}
