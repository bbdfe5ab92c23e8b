//! Recording/playback session state models.
//!
//! At most one automation session exists at a time; starting a new one
//! implicitly terminates the previous process. These models describe the
//! session from the host's point of view so the UI can reconcile its
//! recording/playing flags against the event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;
use uuid::Uuid;

/// What the active session is doing. Recording and playback are mutually
/// exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    Recording,
    Playing,
}

/// Lifecycle phase of a live automation session.
///
/// Normal progression: `Starting -> Active`. `Starting` ends when the
/// first stdout line arrives (spawn is fire-and-forget, so liveness is
/// confirmed by output, not by the spawn call succeeding). `Stopping`
/// covers the grace window of a cooperative recording stop. "No session"
/// is the absence of a [`SessionInfo`], not a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Process spawned, no output observed yet.
    Starting,

    /// At least one stdout line has been observed.
    Active,

    /// Stop sentinel written, waiting out the grace period.
    Stopping,
}

/// Snapshot of the active session, as reported to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Unique id for this session.
    #[ts(type = "string")]
    pub id: Uuid,

    /// Recording or playing.
    pub mode: SessionMode,

    /// User-facing script name (no extension, no directory).
    pub script_name: String,

    /// Absolute path of the script file; sentinel paths derive from it.
    pub script_path: PathBuf,

    /// Current lifecycle phase.
    pub phase: SessionPhase,

    /// When the session process was spawned.
    #[ts(type = "string")]
    pub started_at: DateTime<Utc>,
}
