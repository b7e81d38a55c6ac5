//! Integration test suite for the portable updater
//!
//! End-to-end tests against a local release server and real 7z archives.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: The update pipeline driven through the library API
//! - **cli**: The `papp-update` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod pipeline;
