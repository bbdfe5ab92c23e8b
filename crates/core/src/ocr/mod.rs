//! OCR engine process supervision.
//!
//! The external OCR engine is a long-lived process answering one JSON
//! request per line on stdin with one JSON response per line on stdout.
//! [`OcrSupervisor`] owns the process, serializes all callers into a FIFO
//! queue, and respawns the engine on demand after an exit.

pub mod error;
pub mod supervisor;

pub use error::OcrError;
pub use supervisor::OcrSupervisor;

use async_trait::async_trait;

/// Installation probe for the OCR engine.
///
/// The automation controller gates breakpoint dispatch on this: a
/// breakpoint with no engine available is replaced by an informational
/// status instead of stalling the session on an impossible round trip.
#[async_trait]
pub trait EngineProbe: Send + Sync {
    async fn is_installed(&self) -> bool;
}

#[async_trait]
impl EngineProbe for OcrSupervisor {
    async fn is_installed(&self) -> bool {
        self.installed()
    }
}
