//! OCR engine wire payloads and result classification.
//!
//! The OCR engine answers each request with a single JSON line carrying an
//! integer `code` and, for successful recognitions, a `data` array of
//! recognized items. Codes `100`, `200` and `201` are the non-error set:
//! `100` means text was found, `200` means the region contained no text
//! (not an error), and `201` is informational. Every other code is an
//! engine error surfaced to the caller together with the code.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Text was recognized; `data` carries the items.
pub const CODE_SUCCESS: i32 = 100;

/// Recognition ran but the region contained no text.
pub const CODE_SUCCESS_EMPTY: i32 = 200;

/// Informational response; payload is still usable.
pub const CODE_INFO: i32 = 201;

/// Whether an engine result code belongs to the non-error set.
pub fn is_success_code(code: i32) -> bool {
    matches!(code, CODE_SUCCESS | CODE_SUCCESS_EMPTY | CODE_INFO)
}

/// One recognized text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct OcrItem {
    /// The recognized text.
    pub text: String,

    /// Recognition confidence in `[0, 1]`, when the engine reports one.
    #[serde(default, rename = "score")]
    pub confidence: Option<f64>,

    /// Bounding quadrilateral as `[x, y]` corner points, when reported.
    #[serde(default, rename = "box")]
    pub bounds: Option<Vec<[i32; 2]>>,
}

/// A complete engine response for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct OcrResult {
    /// Engine result code. Always in the non-error set for values handed
    /// to callers; error codes are converted to errors by the supervisor.
    pub code: i32,

    /// Recognized items, in reading order. Empty for `200` responses.
    #[serde(default, rename = "data")]
    pub items: Vec<OcrItem>,
}

impl OcrResult {
    /// All recognized text concatenated in item order.
    pub fn text(&self) -> String {
        self.items.iter().map(|item| item.text.as_str()).collect()
    }
}
