//! Integration tests for the automation controller, driven by fake
//! runner processes implemented as shell scripts.

#![cfg(unix)]

mod common;

use common::{fake_runner, recv_or_panic, runner_config, TEST_TIMEOUT};
use rk_core::automation::{
    AutomationController, AutomationError, ControllerEvent, ScriptStore,
};
use rk_core::ocr::EngineProbe;
use rk_protocol::config_models::ScriptConfig;
use rk_protocol::session_models::SessionMode;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

struct FixedProbe(bool);

#[async_trait::async_trait]
impl EngineProbe for FixedProbe {
    async fn is_installed(&self) -> bool {
        self.0
    }
}

fn controller_with(
    dir: &Path,
    runner_body: &str,
    engine_installed: bool,
) -> (AutomationController, mpsc::Receiver<ControllerEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let store = ScriptStore::new(dir.join("scripts"), dir.join("config"));
    let controller = AutomationController::new(
        fake_runner(dir, runner_body),
        store,
        Arc::new(FixedProbe(engine_installed)),
        tx,
    );
    (controller, rx)
}

/// Drain events until `matcher` accepts one, failing after a bounded
/// number of events or on timeout.
async fn wait_for(
    rx: &mut mpsc::Receiver<ControllerEvent>,
    matcher: impl Fn(&ControllerEvent) -> bool,
) -> ControllerEvent {
    for _ in 0..32 {
        let event = recv_or_panic(rx).await;
        if matcher(&event) {
            return event;
        }
    }
    panic!("expected event never arrived");
}

#[tokio::test]
async fn test_status_lines_become_events_and_exit_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "STATUS|READY"
echo "STATUS|RECORDING"
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    controller.start_recording("take-1").await.unwrap();

    let first = recv_or_panic(&mut rx).await;
    assert_eq!(first, ControllerEvent::Status("STATUS|READY".to_string()));
    let second = recv_or_panic(&mut rx).await;
    assert_eq!(
        second,
        ControllerEvent::Status("STATUS|RECORDING".to_string())
    );
    let exit = recv_or_panic(&mut rx).await;
    assert_eq!(
        exit,
        ControllerEvent::ProcessExited {
            mode: SessionMode::Recording
        }
    );
    assert!(controller.session_info().await.is_none());
}

#[tokio::test]
async fn test_ocr_request_line_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    // Expected text containing the delimiter must survive intact.
    let runner = r#"#!/bin/sh
echo "REQ|OCR|req-1|2|10|20|30|40|YOU|WIN"
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    let script = controller.store().script_path("take-1").unwrap();
    controller.store().ensure_dirs().await.unwrap();
    std::fs::write(&script, b"").unwrap();
    controller.start_playing("take-1").await.unwrap();

    let event = wait_for(&mut rx, |e| matches!(e, ControllerEvent::OcrRequest(_))).await;
    let ControllerEvent::OcrRequest(request) = event else {
        unreachable!()
    };
    assert_eq!(request.request_id, "req-1");
    assert_eq!(request.index, 2);
    assert_eq!(request.region.x, 10);
    assert_eq!(request.region.h, 40);
    assert_eq!(request.expected_text, "YOU|WIN");
}

#[tokio::test]
async fn test_breakpoint_forwarded_when_engine_installed() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "BREAKPOINT|4200"
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    controller.start_recording("take-1").await.unwrap();

    let event = wait_for(&mut rx, |e| {
        matches!(e, ControllerEvent::BreakpointTriggered { .. })
    })
    .await;
    assert_eq!(
        event,
        ControllerEvent::BreakpointTriggered { t_trigger: 4200 }
    );
}

#[tokio::test]
async fn test_breakpoint_degrades_to_status_without_engine() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "BREAKPOINT|4200"
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, false);

    controller.start_recording("take-1").await.unwrap();

    let event = recv_or_panic(&mut rx).await;
    assert_eq!(
        event,
        ControllerEvent::Status("STATUS|OCR_NOT_INSTALLED".to_string())
    );
}

#[tokio::test]
async fn test_stop_recording_is_cooperative() {
    let dir = tempfile::tempdir().unwrap();
    // Polls for the stop sentinel and records a clean exit.
    let runner = r#"#!/bin/sh
echo "STATUS|RECORDING"
while [ ! -f "$2.stop" ]; do sleep 0.05; done
touch "$2.clean"
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    controller.start_recording("take-1").await.unwrap();
    let script = controller.active_script_path().await.unwrap();
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::Status(_))).await;

    controller.stop_recording().await.unwrap();
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::ProcessExited { .. })).await;

    let mut clean = script.into_os_string();
    clean.push(".clean");
    assert!(
        Path::new(&clean).exists(),
        "runner should have observed the sentinel before exiting"
    );
}

#[tokio::test]
async fn test_stop_recording_force_kills_unresponsive_runner() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "STATUS|RECORDING"
sleep 60
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    controller.start_recording("take-1").await.unwrap();
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::Status(_))).await;

    tokio::time::timeout(TEST_TIMEOUT, controller.stop_recording())
        .await
        .unwrap()
        .unwrap();
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::ProcessExited { .. })).await;
}

#[tokio::test]
async fn test_play_passes_script_and_repeat_count() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "STATUS|ARGS|$1|$2|$3"
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    controller.store().ensure_dirs().await.unwrap();
    let script = controller.store().script_path("boss-run").unwrap();
    std::fs::write(&script, b"").unwrap();
    controller
        .store()
        .save_config("boss-run", &ScriptConfig { repeat_count: 5 })
        .await
        .unwrap();

    controller.start_playing("boss-run").await.unwrap();

    let event = recv_or_panic(&mut rx).await;
    let expected = format!("STATUS|ARGS|play|{}|5", script.display());
    assert_eq!(event, ControllerEvent::Status(expected));
}

#[tokio::test]
async fn test_play_missing_script_fails_without_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _rx) = controller_with(dir.path(), "#!/bin/sh\n", true);

    let err = controller.start_playing("ghost").await.unwrap_err();
    assert!(matches!(err, AutomationError::ScriptNotFound { .. }));
    assert!(controller.session_info().await.is_none());
}

#[tokio::test]
async fn test_unresolvable_runtime_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, _rx) = mpsc::channel(8);
    let store = ScriptStore::new(dir.path().join("scripts"), dir.path().join("config"));
    let controller =
        AutomationController::new(runner_config(None), store, Arc::new(FixedProbe(true)), tx);

    let err = controller.start_recording("take-1").await.unwrap_err();
    assert!(matches!(err, AutomationError::RuntimeNotFound));
}

#[tokio::test]
async fn test_new_session_replaces_running_one() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "STATUS|UP|$2"
sleep 60
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    controller.start_recording("first").await.unwrap();
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::Status(_))).await;
    let first_info = controller.session_info().await.unwrap();

    controller.start_recording("second").await.unwrap();
    let second_info = controller.session_info().await.unwrap();
    assert_ne!(first_info.id, second_info.id);
    assert_eq!(second_info.script_name, "second");

    // The replaced session's reader observes the kill and reports it.
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::ProcessExited { .. })).await;

    controller.terminate().await;
}

#[tokio::test]
async fn test_stop_mode_mismatches() {
    let dir = tempfile::tempdir().unwrap();
    let runner = r#"#!/bin/sh
echo "STATUS|RECORDING"
sleep 60
"#;
    let (controller, mut rx) = controller_with(dir.path(), runner, true);

    let err = controller.stop_recording().await.unwrap_err();
    assert!(matches!(err, AutomationError::NoActiveSession));

    controller.start_recording("take-1").await.unwrap();
    wait_for(&mut rx, |e| matches!(e, ControllerEvent::Status(_))).await;

    let err = controller.stop_playing().await.unwrap_err();
    assert!(matches!(
        err,
        AutomationError::WrongMode {
            expected: SessionMode::Playing
        }
    ));

    controller.terminate().await;
}
