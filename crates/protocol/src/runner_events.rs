//! Typed decoder for the automation runner's stdout protocol.
//!
//! The runner process emits one UTF-8 line per event. Three line shapes
//! exist on the wire:
//!
//! - `STATUS|<freeform>` (or any unrecognized line): opaque progress text
//! - `BREAKPOINT|<tTrigger>`: a recording breakpoint was hit
//! - `REQ|OCR|<id>|<index>|<x>|<y>|<w>|<h>|<expected...>`: an in-playback
//!   OCR checkpoint request
//!
//! All classification happens here, in a single exhaustive decoder, so
//! downstream code matches on [`RunnerEvent`] variants instead of sniffing
//! string prefixes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Line prefix for breakpoint trigger events.
pub const BREAKPOINT_MARKER: &str = "BREAKPOINT|";

/// Line prefix for in-playback OCR checkpoint requests.
pub const OCR_REQUEST_MARKER: &str = "REQ|OCR|";

/// Synthetic status line emitted when a breakpoint fires but the OCR
/// engine is not installed.
pub const STATUS_OCR_NOT_INSTALLED: &str = "STATUS|OCR_NOT_INSTALLED";

/// A rectangular screen region in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Region {
    /// The zero rectangle, used to encode a cancelled breakpoint.
    pub const ZERO: Region = Region {
        x: 0,
        y: 0,
        w: 0,
        h: 0,
    };
}

/// An in-playback OCR checkpoint request from the runner.
///
/// The runner blocks (polling for a sentinel file) until the host resolves
/// this request, so every decoded request must eventually be answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequestEvent {
    /// Unique per-session id, chosen by the runner. Never reused.
    pub request_id: String,
    /// Zero-based index of the checkpoint within the script.
    pub index: u32,
    /// Screen region to capture and recognize.
    pub region: Region,
    /// Text the runner expects to see in the region.
    pub expected_text: String,
}

/// One decoded line of runner stdout, plus the synthetic exit event.
///
/// `ProcessExit` is never produced by [`RunnerEvent::parse`]; the process
/// controller synthesizes it when the runner's stdout reaches end-of-file,
/// so that subscribers observe a terminal event even on unexpected crashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum RunnerEvent {
    /// Opaque progress line, forwarded to subscribers verbatim.
    Status(String),

    /// A recording breakpoint was hit at `t_trigger` milliseconds into
    /// the recording.
    BreakpointTrigger { t_trigger: u64 },

    /// An OCR checkpoint request that must be resolved via sentinel file.
    OcrRequest(OcrRequestEvent),

    /// The runner process exited (synthesized on stdout end-of-file).
    ProcessExit,
}

impl RunnerEvent {
    /// Decode one non-blank stdout line.
    ///
    /// Lines carrying a recognized marker but a malformed payload fall back
    /// to `Status` with the original line intact; the wire protocol has no
    /// fatal parse errors.
    pub fn parse(line: &str) -> RunnerEvent {
        if let Some(rest) = line.strip_prefix(BREAKPOINT_MARKER) {
            if let Ok(t_trigger) = rest.trim().parse::<u64>() {
                return RunnerEvent::BreakpointTrigger { t_trigger };
            }
        } else if let Some(rest) = line.strip_prefix(OCR_REQUEST_MARKER) {
            if let Some(request) = parse_ocr_request(rest) {
                return RunnerEvent::OcrRequest(request);
            }
        }

        RunnerEvent::Status(line.to_string())
    }
}

/// Parse the pipe-delimited fields after the `REQ|OCR|` marker.
///
/// Field order: `requestId|index|x|y|w|h|expectedText...`. The expected
/// text may itself contain `|`, so everything after the sixth delimiter is
/// rejoined verbatim.
fn parse_ocr_request(fields: &str) -> Option<OcrRequestEvent> {
    let mut parts = fields.splitn(7, '|');

    let request_id = parts.next()?.to_string();
    if request_id.is_empty() {
        return None;
    }
    let index = parts.next()?.parse::<u32>().ok()?;
    let x = parts.next()?.parse::<i32>().ok()?;
    let y = parts.next()?.parse::<i32>().ok()?;
    let w = parts.next()?.parse::<i32>().ok()?;
    let h = parts.next()?.parse::<i32>().ok()?;
    let expected_text = parts.next()?.to_string();

    Some(OcrRequestEvent {
        request_id,
        index,
        region: Region { x, y, w, h },
        expected_text,
    })
}
