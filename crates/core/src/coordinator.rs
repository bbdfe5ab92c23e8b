//! OCR round-trip coordination.
//!
//! Mediates the in-playback OCR flow: the runner emits a checkpoint
//! request and then blocks, polling for a sentinel file; the host
//! forwards the request to the UI-level recognizer (screen capture,
//! preprocessing and the engine call all happen outside this crate) and
//! turns the verdict into exactly one sentinel.
//!
//! Per request id the state machine is `Issued -> Dispatched ->
//! Resolved`, terminal. The single resolution path (pending entry is
//! removed before the sentinel write, and per-request sentinels are
//! create-once) makes "both files" and "neither file" unrepresentable.
//! The one exception is the whole session dying, which
//! [`abandon_session`](OcrCoordinator::abandon_session) cleans up.

use crate::automation::sentinel;
use rk_protocol::runner_events::OcrRequestEvent;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;

/// Outcome of recognizing a checkpoint region.
///
/// Any pipeline failure (capture error, engine error) maps to
/// `Unmatched`: the runner must never be left polling forever, so the
/// default resolution is "condition not met, proceed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Expected text was found: halt the script at this checkpoint.
    Matched,
    /// Expected text was not found (or recognition failed): proceed.
    Unmatched,
}

/// Errors from the round-trip state machine.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// A request with this id is already pending; ids are unique for
    /// the lifetime of a session and never reused.
    #[error("OCR request '{request_id}' is already pending")]
    DuplicateRequest { request_id: String },

    /// No pending request with this id (never issued, or already
    /// resolved).
    #[error("unknown OCR request '{request_id}'")]
    UnknownRequest { request_id: String },

    /// Sentinel write failed.
    #[error("sentinel write failed: {0}")]
    Io(#[from] std::io::Error),
}

struct PendingCheckpoint {
    script_path: PathBuf,
}

/// Tracks pending OCR checkpoint requests and resolves each exactly
/// once.
#[derive(Default)]
pub struct OcrCoordinator {
    pending: Mutex<HashMap<String, PendingCheckpoint>>,
}

impl OcrCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checkpoint request before forwarding it to the
    /// recognizer.
    ///
    /// `script_path` is the active session's script file; the eventual
    /// sentinel derives from it.
    pub async fn begin(
        &self,
        script_path: PathBuf,
        request: &OcrRequestEvent,
    ) -> Result<(), CoordinatorError> {
        let mut pending = self.pending.lock().await;
        if pending.contains_key(&request.request_id) {
            return Err(CoordinatorError::DuplicateRequest {
                request_id: request.request_id.clone(),
            });
        }
        pending.insert(
            request.request_id.clone(),
            PendingCheckpoint { script_path },
        );
        Ok(())
    }

    /// Resolve a pending request with the recognizer's verdict, writing
    /// the corresponding sentinel.
    ///
    /// The pending entry is removed before the write, so a second
    /// resolution attempt fails with `UnknownRequest` instead of
    /// producing a second sentinel.
    pub async fn resolve(
        &self,
        request_id: &str,
        verdict: Verdict,
    ) -> Result<(), CoordinatorError> {
        let checkpoint = {
            let mut pending = self.pending.lock().await;
            pending
                .remove(request_id)
                .ok_or_else(|| CoordinatorError::UnknownRequest {
                    request_id: request_id.to_string(),
                })?
        };

        match verdict {
            Verdict::Matched => {
                sentinel::write_stop_script(&checkpoint.script_path, request_id).await?
            }
            Verdict::Unmatched => {
                sentinel::write_continue(&checkpoint.script_path, request_id).await?
            }
        }
        tracing::debug!("resolved OCR request '{request_id}' as {verdict:?}");
        Ok(())
    }

    /// Resolve every pending request as `Unmatched`.
    ///
    /// Called when the session process exits: nothing will poll the
    /// sentinels anymore, but leaving entries pending would poison the
    /// next session's duplicate detection. Returns the number of
    /// requests cleaned up.
    pub async fn abandon_session(&self) -> usize {
        let drained: Vec<(String, PendingCheckpoint)> = {
            let mut pending = self.pending.lock().await;
            pending.drain().collect()
        };

        let count = drained.len();
        for (request_id, checkpoint) in drained {
            // Best effort; the runner is already gone.
            if let Err(err) =
                sentinel::write_continue(&checkpoint.script_path, &request_id).await
            {
                tracing::debug!("abandon: continue sentinel for '{request_id}' failed: {err}");
            }
        }
        count
    }

    /// Number of requests currently awaiting a verdict.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
