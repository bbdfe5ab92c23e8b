//! Error types for automation session management.

use rk_protocol::session_models::SessionMode;
use thiserror::Error;

/// Errors returned synchronously from session start/stop operations.
///
/// Failures occurring after a session is running never surface here;
/// they arrive asynchronously on the event channel.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// Neither the packaged runner executable nor a usable interpreter
    /// could be resolved. No process was spawned.
    #[error("no automation runtime found (packaged runner or interpreter)")]
    RuntimeNotFound,

    /// The named script does not exist in the script directory.
    #[error("script '{name}' not found")]
    ScriptNotFound { name: String },

    /// The script name would escape the script directory.
    #[error("invalid script name '{name}'")]
    InvalidName { name: String },

    /// The operation requires an active session and none exists.
    #[error("no active automation session")]
    NoActiveSession,

    /// The operation applies to the other session mode.
    #[error("active session is not in {expected:?} mode")]
    WrongMode { expected: SessionMode },

    /// Filesystem or process I/O failure.
    #[error("automation I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed per-script configuration JSON.
    #[error("script config error: {0}")]
    Config(#[from] serde_json::Error),
}
