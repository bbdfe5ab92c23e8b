//! Configuration data models.

use serde::Deserialize;
use std::path::PathBuf;

/// Name of the OCR engine executable inside its installation directory.
#[cfg(windows)]
pub const OCR_EXECUTABLE: &str = "ocr-engine.exe";
#[cfg(not(windows))]
pub const OCR_EXECUTABLE: &str = "ocr-engine";

/// Interpreter binary name used for `which` lookup when no well-known
/// install path matches.
#[cfg(windows)]
pub const INTERPRETER_NAME: &str = "AutoHotkey.exe";
#[cfg(not(windows))]
pub const INTERPRETER_NAME: &str = "autohotkey";

/// Root configuration for the host core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Directory holding recorded script files. Sentinel files are
    /// written next to the scripts, so the runner must poll here too.
    pub scripts_dir: PathBuf,

    /// Directory holding per-script replay configuration JSON.
    pub script_config_dir: PathBuf,

    pub ocr: OcrConfig,
    pub runner: RunnerConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let root = data_root();
        Self {
            scripts_dir: root.join("scripts"),
            script_config_dir: root.join("script-config"),
            ocr: OcrConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

/// OCR engine process settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// Engine installation directory. The engine loads its model files
    /// relative to its own path, so this is also the working directory
    /// of the spawned process.
    pub engine_dir: PathBuf,

    /// Executable name inside `engine_dir`.
    pub executable: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine_dir: data_root().join("ocr-engine"),
            executable: OCR_EXECUTABLE.to_string(),
        }
    }
}

impl OcrConfig {
    /// Full path of the engine executable.
    pub fn executable_path(&self) -> PathBuf {
        self.engine_dir.join(&self.executable)
    }
}

/// Automation runner resolution settings.
///
/// The runner is replaceable: either a packaged, self-contained
/// executable, or a general-purpose script interpreter invoked with the
/// runner script as its first argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Packaged runner executable. Preferred when present on disk.
    pub runner_path: Option<PathBuf>,

    /// Ordered list of well-known interpreter install locations, probed
    /// before falling back to a `PATH` lookup.
    pub interpreter_candidates: Vec<PathBuf>,

    /// Interpreter binary name for the `PATH` lookup fallback.
    pub interpreter: String,

    /// Runner script handed to the interpreter as its first argument.
    pub runner_script: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            runner_path: Some(data_root().join("runner").join(runner_binary_name())),
            interpreter_candidates: default_interpreter_candidates(),
            interpreter: INTERPRETER_NAME.to_string(),
            runner_script: Some(data_root().join("runner").join("macro-runner.ahk")),
        }
    }
}

fn runner_binary_name() -> &'static str {
    if cfg!(windows) {
        "macro-runner.exe"
    } else {
        "macro-runner"
    }
}

fn default_interpreter_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("C:\\Program Files\\AutoHotkey\\AutoHotkey.exe"),
        PathBuf::from("C:\\Program Files (x86)\\AutoHotkey\\AutoHotkey.exe"),
        PathBuf::from("C:\\Program Files\\AutoHotkey\\v1.1\\AutoHotkey.exe"),
    ]
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("replay-kit")
}
