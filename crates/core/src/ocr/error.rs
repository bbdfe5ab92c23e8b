//! Error types for OCR engine supervision.

use thiserror::Error;

/// Errors surfaced to `recognize` callers.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The engine executable is missing from its installation directory.
    ///
    /// Fails the affected request only; a later call retries the spawn,
    /// so installing the engine requires no restart.
    #[error("OCR engine is not installed")]
    NotInstalled,

    /// The engine answered with a code outside the non-error set.
    #[error("OCR engine returned error code {code}")]
    Engine { code: i32 },

    /// The engine process went away before this request could complete.
    #[error("OCR engine process exited before responding")]
    EngineCrashed,

    /// Failed to spawn or talk to the engine process.
    #[error("OCR engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}
