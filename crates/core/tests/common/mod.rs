//! Shared fixtures for core integration tests.
//!
//! The external engine and runner are stood in for by small shell
//! scripts, so these tests are unix-only. Each fixture returns the
//! configuration pointing at the script; the `TempDir` owns the files
//! and must be kept alive by the test.

#![allow(dead_code)]

use rk_core::config::{OcrConfig, RunnerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Generous upper bound for any single await in these tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(unix)]
pub fn write_executable(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Install a fake OCR engine script under `dir` and return the matching
/// configuration.
#[cfg(unix)]
pub fn fake_engine(dir: &Path, body: &str) -> OcrConfig {
    write_executable(&dir.join("ocr-engine"), body);
    engine_config(dir)
}

/// Configuration pointing at `dir` without installing anything.
pub fn engine_config(dir: &Path) -> OcrConfig {
    OcrConfig {
        engine_dir: dir.to_path_buf(),
        executable: "ocr-engine".to_string(),
    }
}

/// Install a fake runner script under `dir` and return a configuration
/// that resolves it as the packaged runner.
#[cfg(unix)]
pub fn fake_runner(dir: &Path, body: &str) -> RunnerConfig {
    let path = dir.join("runner.sh");
    write_executable(&path, body);
    runner_config(Some(path))
}

/// A runner configuration with no interpreter fallback.
pub fn runner_config(runner_path: Option<PathBuf>) -> RunnerConfig {
    RunnerConfig {
        runner_path,
        interpreter_candidates: Vec::new(),
        interpreter: "definitely-not-a-real-interpreter".to_string(),
        runner_script: None,
    }
}

/// Receive the next value from a channel, failing the test on timeout.
pub async fn recv_or_panic<T>(rx: &mut tokio::sync::mpsc::Receiver<T>) -> T {
    match tokio::time::timeout(TEST_TIMEOUT, rx.recv()).await {
        Ok(Some(value)) => value,
        Ok(None) => panic!("event channel closed"),
        Err(_) => panic!("timed out waiting for an event"),
    }
}
