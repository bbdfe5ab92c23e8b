//! Script and per-script configuration storage.
//!
//! Scripts are plain files written by the runner during recording; the
//! host only derives paths from names and manages the sibling JSON
//! configuration files. Both directories are shared with the external
//! runner, so path derivation is centralized here.

use crate::automation::error::AutomationError;
use rk_protocol::config_models::ScriptConfig;
use std::path::{Path, PathBuf};

/// File extension of recorded scripts.
pub const SCRIPT_EXT: &str = "macro";

/// Key-value style store mapping script names to files on disk.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    scripts_dir: PathBuf,
    config_dir: PathBuf,
}

impl ScriptStore {
    pub fn new(scripts_dir: PathBuf, config_dir: PathBuf) -> Self {
        Self {
            scripts_dir,
            config_dir,
        }
    }

    /// Create both storage directories if absent.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.scripts_dir).await?;
        tokio::fs::create_dir_all(&self.config_dir).await
    }

    /// Absolute path of the script file for `name`.
    ///
    /// Sentinel paths derive from this, so it is also the base of the
    /// signaling contract with the runner.
    pub fn script_path(&self, name: &str) -> Result<PathBuf, AutomationError> {
        validate_name(name)?;
        Ok(self.scripts_dir.join(format!("{name}.{SCRIPT_EXT}")))
    }

    /// Absolute path of the configuration file for `name`.
    pub fn config_path(&self, name: &str) -> Result<PathBuf, AutomationError> {
        validate_name(name)?;
        Ok(self.config_dir.join(format!("{name}.json")))
    }

    /// Names of all stored scripts, sorted.
    pub async fn list(&self) -> Result<Vec<String>, AutomationError> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.scripts_dir).await {
            Ok(entries) => entries,
            // Nothing recorded yet.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(err) => return Err(err.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete a script and its configuration.
    ///
    /// The configuration file is best-effort: a script without one is
    /// normal.
    pub async fn delete(&self, name: &str) -> Result<(), AutomationError> {
        let script = self.script_path(name)?;
        match tokio::fs::remove_file(&script).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AutomationError::ScriptNotFound {
                    name: name.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        }

        let config = self.config_path(name)?;
        match tokio::fs::remove_file(&config).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Stored configuration for `name`, or `None` when absent.
    pub async fn load_config(&self, name: &str) -> Result<Option<ScriptConfig>, AutomationError> {
        let path = self.config_path(name)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Persist configuration for `name`.
    pub async fn save_config(
        &self,
        name: &str,
        config: &ScriptConfig,
    ) -> Result<(), AutomationError> {
        self.ensure_dirs().await?;
        let path = self.config_path(name)?;
        let payload = serde_json::to_vec(config)?;
        tokio::fs::write(&path, payload).await?;
        Ok(())
    }

    /// Repeat count for playback. Absent or unreadable configuration
    /// means the default of 0 (repeat forever).
    pub async fn repeat_count(&self, name: &str) -> u32 {
        match self.load_config(name).await {
            Ok(Some(config)) => config.repeat_count,
            Ok(None) => 0,
            Err(err) => {
                tracing::warn!("unreadable config for script '{name}': {err}");
                0
            }
        }
    }
}

fn validate_name(name: &str) -> Result<(), AutomationError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(AutomationError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
