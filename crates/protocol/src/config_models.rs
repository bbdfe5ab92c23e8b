//! Persisted per-script replay configuration.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Replay configuration stored as a small JSON object per script name.
///
/// Written by the UI's configuration editor and read by the host right
/// before playback starts. An absent or unreadable file means defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    /// How many times playback repeats the script. `0` means repeat
    /// forever until stopped.
    #[serde(default)]
    pub repeat_count: u32,
}
