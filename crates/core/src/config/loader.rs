//! Configuration file loader.
//!
//! Reads the optional `config.toml`. A missing file yields the default
//! configuration; a present but malformed file is an error (silently
//! ignoring a user's broken config hides real mistakes).

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::CoreConfig;
use std::path::Path;

/// Load core configuration from `path`.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or does
/// not parse as TOML.
pub fn load_config(path: &Path) -> ConfigResult<CoreConfig> {
    if !path.exists() {
        return Ok(CoreConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}
