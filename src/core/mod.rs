//! Core types for the updater
//!
//! This module holds the error model shared by every stage of the update
//! pipeline and by the command-line front end.
//!
//! # Error Management
//!
//! - **Strongly-typed errors** ([`UpdateError`]) so callers can tell a network
//!   outage from a failed rollback
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions
//!   for CLI users
//! - [`user_friendly_error`] converts any `anyhow::Error` for display
//!
//! # Examples
//!
//! ```rust
//! use portable_updater::core::{UpdateError, user_friendly_error};
//!
//! fn example_operation() -> anyhow::Result<()> {
//!     Err(UpdateError::VersionUnknown {
//!         reason: "no version record".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, Result, UpdateError, user_friendly_error};
