//! Parsing and validation of `trellis.toml` build configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`BuildConfig`] with explicit defaults for every field and validation at
//! load time. A missing or unreadable file degrades to the defaults.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_or_default};
pub use types::{BuildConfig, BuildSettings, CacheStrategy, ProjectPaths};
