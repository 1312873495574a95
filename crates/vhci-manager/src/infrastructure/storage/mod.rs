//! Storage infrastructure: settings file persistence.
//!
//! The `config` sub-module reads the TOML settings file from the
//! platform-appropriate directory, writes changes back when the manager
//! exits, and supplies defaults on first run.

pub mod config;
