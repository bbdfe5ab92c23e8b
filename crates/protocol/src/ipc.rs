//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the UI (renderer) and the host core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the UI to the core
//! - `Event`: Status updates and replies sent from the core to the UI
//!
//! Communication is newline-delimited JSON over the host process's stdio,
//! allowing the UI to remain responsive while the core supervises the
//! engine processes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config_models::ScriptConfig;
use crate::ocr_models::OcrResult;
use crate::runner_events::Region;
use crate::session_models::SessionMode;

/// Payload of a resolved (or cancelled) recording breakpoint.
///
/// Cancellation is encoded as the zero region plus empty text rather than
/// as a distinct message: the runner always receives a resume sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResume {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Expected text typed by the user; empty on cancellation.
    pub text: String,
    /// Millisecond offset of the breakpoint within the recording, echoed
    /// back from the trigger event when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_trigger: Option<u64>,
}

impl BreakpointResume {
    /// The cancellation payload: zero region, empty text.
    pub fn cancelled(t_trigger: Option<u64>) -> Self {
        Self {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            text: String::new(),
            t_trigger,
        }
    }
}

/// Operations sent from the UI to the host core.
///
/// These represent user commands and requests for information.
/// The core processes these operations and responds with Events.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "startRecord",
///   "payload": { "name": "my-script" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Op {
    /// Begin recording a new script under the given name.
    ///
    /// Implicitly terminates any session already running.
    StartRecord { name: String },

    /// Cooperatively stop the active recording (stop sentinel, grace
    /// period, then force kill).
    StopRecord,

    /// Begin playing a named script, honoring its stored repeat count.
    StartPlay { name: String },

    /// Force-stop the active playback.
    StopPlay,

    /// Request the list of stored script names.
    ListScripts,

    /// Delete a stored script and its configuration.
    DeleteScript { name: String },

    /// Persist replay configuration for a script.
    SaveConfig { name: String, config: ScriptConfig },

    /// Request the stored replay configuration for a script.
    GetConfig { name: String },

    /// Run a one-shot recognition on UI-captured image data.
    Ocr { image_base64: String },

    /// Ask whether the OCR engine is installed.
    OcrStatus,

    /// Resolve the pending recording breakpoint with a user-selected
    /// region and expected text (or the cancellation payload).
    BreakpointResume { data: BreakpointResume },

    /// Verdict for an in-playback OCR checkpoint previously forwarded to
    /// the UI as [`Event::OcrRequest`].
    OcrResponse {
        request_id: String,
        text: String,
        matched: bool,
    },

    /// Shut down the host gracefully.
    ///
    /// Any running session and the OCR engine are terminated.
    Shutdown,
}

/// Events sent from the host core to the UI.
///
/// These carry both asynchronous session notifications and the replies to
/// request-style operations. Mid-session failures surface as `Status`
/// text in the same channel as normal progress updates; there is no
/// separate error channel.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Event {
    /// Opaque progress line from the runner, forwarded verbatim.
    ///
    /// The UI interprets sub-formats such as `STATUS|LOOP_START|n`.
    Status { message: String },

    /// A recording breakpoint was hit; the UI should open the region
    /// selection overlay and answer with [`Op::BreakpointResume`].
    BreakpointTriggered { t_trigger: u64 },

    /// An in-playback OCR checkpoint; the UI should capture the region,
    /// recognize it, and answer with [`Op::OcrResponse`].
    OcrRequest {
        request_id: String,
        index: u32,
        region: Region,
        expected_text: String,
    },

    /// The session process exited, expectedly or not. The UI must
    /// reconcile its recording/playing flags on this event.
    ProcessExited { mode: SessionMode },

    /// Reply to [`Op::ListScripts`].
    Scripts { names: Vec<String> },

    /// Reply to [`Op::GetConfig`]. `config` is `None` when no
    /// configuration has been stored for the script.
    Config {
        name: String,
        config: Option<ScriptConfig>,
    },

    /// Reply to [`Op::Ocr`].
    OcrCompleted {
        success: bool,
        result: Option<OcrResult>,
        error: Option<String>,
    },

    /// Reply to [`Op::OcrStatus`].
    OcrStatus { installed: bool },

    /// Acknowledgement for fire-and-forget operations (start/stop,
    /// delete, save). `op` echoes the camelCase operation name.
    CommandResult {
        op: String,
        success: bool,
        error: Option<String>,
    },
}
