//! Configuration for the updater
//!
//! A single per-user TOML file, [`UpdaterConfig`], controls where releases
//! come from and where the portable installation lives. See [`UpdaterConfig`] for
//! the file format.

mod global;

pub use global::UpdaterConfig;
