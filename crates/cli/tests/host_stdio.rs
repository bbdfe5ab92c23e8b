//! Smoke tests for the host binary's stdio protocol loop.

use assert_cmd::Command;
use predicates::prelude::*;
use rk_protocol::ipc::Event;
use std::time::Duration;

fn host_command(dir: &std::path::Path) -> Command {
    let config = format!(
        r#"
scripts_dir = "{0}/scripts"
script_config_dir = "{0}/config"

[ocr]
engine_dir = "{0}/engine"
executable = "missing-engine"

[runner]
interpreter = "definitely-not-a-real-interpreter"
interpreter_candidates = []
"#,
        dir.display()
    );
    let config_path = dir.join("replay-kit.toml");
    std::fs::write(&config_path, config).unwrap();

    let mut cmd = Command::cargo_bin("replay-host").unwrap();
    cmd.arg("--config").arg(config_path);
    cmd.timeout(Duration::from_secs(10));
    cmd
}

/// Every stdout line must be a well-formed protocol event.
fn parse_events(stdout: &[u8]) -> Vec<Event> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .unwrap_or_else(|err| panic!("unparseable event line ({err}): {line}"))
        })
        .collect()
}

#[test]
fn test_shutdown_terminates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    host_command(dir.path())
        .write_stdin("{\"type\":\"shutdown\"}\n")
        .assert()
        .success();
}

#[test]
fn test_ops_produce_typed_events_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let assert = host_command(dir.path())
        .write_stdin(concat!(
            "{\"type\":\"ocrStatus\"}\n",
            "{\"type\":\"listScripts\"}\n",
            "{\"type\":\"shutdown\"}\n",
        ))
        .assert()
        .success();

    let events = parse_events(&assert.get_output().stdout);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::OcrStatus { installed: false })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Scripts { names } if names.is_empty())));
}

#[test]
fn test_stdin_eof_terminates_host() {
    let dir = tempfile::tempdir().unwrap();
    host_command(dir.path()).write_stdin("").assert().success();
}

#[test]
fn test_malformed_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("replay-kit.toml");
    std::fs::write(&config_path, "scripts_dir = [broken").unwrap();

    let mut cmd = Command::cargo_bin("replay-host").unwrap();
    cmd.arg("--config")
        .arg(config_path)
        .timeout(Duration::from_secs(10))
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}
