//! Core configuration loading and management.
//!
//! Configuration lives in a single optional TOML file; every field has a
//! default derived from the platform data directory, so a missing file is
//! not an error.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::{CoreConfig, OcrConfig, RunnerConfig};
