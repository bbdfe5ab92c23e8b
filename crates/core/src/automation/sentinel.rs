//! Sentinel-file signaling to the automation runner.
//!
//! The runner cannot receive direct messages; it polls for files derived
//! from its script path. The naming scheme below is a strict contract
//! with the external runner: any deviation breaks interoperation. This
//! module is the only place in the tree that formats sentinel paths.
//!
//! Relative to the active script file `S`:
//! - `S.stop`: request graceful stop of a recording session
//! - `S.resume`: JSON payload of a resolved breakpoint
//! - `S.continue_<requestId>`: OCR checkpoint condition not met, proceed
//! - `S.stop_script_<requestId>`: OCR checkpoint condition met, halt
//!
//! The per-request sentinels are created with `create_new`, so a second
//! write for the same request id fails instead of silently overwriting:
//! each id is resolved at most once, by construction.

use rk_protocol::ipc::BreakpointResume;
use std::io;
use std::path::{Path, PathBuf};

const STOP_SUFFIX: &str = ".stop";
const RESUME_SUFFIX: &str = ".resume";
const CONTINUE_SUFFIX: &str = ".continue_";
const STOP_SCRIPT_SUFFIX: &str = ".stop_script_";

/// Append `suffix` to the full file name of `script`.
///
/// `Path::with_extension` would replace the script's extension; the
/// runner expects the suffix appended to the complete path.
fn with_suffix(script: &Path, suffix: &str) -> PathBuf {
    let mut name = script.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Path of the graceful-stop sentinel for `script`.
pub fn stop_path(script: &Path) -> PathBuf {
    with_suffix(script, STOP_SUFFIX)
}

/// Path of the breakpoint-resume sentinel for `script`.
pub fn resume_path(script: &Path) -> PathBuf {
    with_suffix(script, RESUME_SUFFIX)
}

/// Path of the continue sentinel for one OCR request.
pub fn continue_path(script: &Path, request_id: &str) -> PathBuf {
    with_suffix(script, &format!("{CONTINUE_SUFFIX}{request_id}"))
}

/// Path of the stop-script sentinel for one OCR request.
pub fn stop_script_path(script: &Path, request_id: &str) -> PathBuf {
    with_suffix(script, &format!("{STOP_SCRIPT_SUFFIX}{request_id}"))
}

/// Request graceful stop of a recording session.
///
/// The runner polls for existence, not content; an empty file suffices.
pub async fn write_stop(script: &Path) -> io::Result<()> {
    tokio::fs::write(stop_path(script), b"").await
}

/// Resolve the pending breakpoint with the user's selection.
///
/// Written once per breakpoint cycle; the runner consumes and deletes
/// the file, so a plain write is correct here.
pub async fn write_resume(script: &Path, data: &BreakpointResume) -> io::Result<()> {
    let payload = serde_json::to_vec(data).map_err(io::Error::other)?;
    tokio::fs::write(resume_path(script), payload).await
}

/// Signal "condition not met, proceed" for one OCR request.
///
/// Fails with `AlreadyExists` if the request was already resolved.
pub async fn write_continue(script: &Path, request_id: &str) -> io::Result<()> {
    create_once(&continue_path(script, request_id)).await
}

/// Signal "condition met, halt" for one OCR request.
///
/// Fails with `AlreadyExists` if the request was already resolved.
pub async fn write_stop_script(script: &Path, request_id: &str) -> io::Result<()> {
    create_once(&stop_script_path(script, request_id)).await
}

async fn create_once(path: &Path) -> io::Result<()> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map(|_| ())
}
