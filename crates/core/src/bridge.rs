//! Host bridge between the UI and the core components.
//!
//! This module owns the Op/Event loop: newline-delimited JSON operations
//! arrive on a reader (the host process's stdin in production), events
//! leave on a writer. One operation may produce zero, one, or many
//! events, and session events arrive unsolicited, so the two directions
//! are fully decoupled: a dedicated writer task serializes events from a
//! channel while the read loop dispatches operations.

use crate::automation::{AutomationController, ControllerEvent, ScriptStore};
use crate::config::CoreConfig;
use crate::coordinator::{OcrCoordinator, Verdict};
use crate::ocr::{EngineProbe, OcrSupervisor};
use anyhow::Result;
use rk_protocol::ipc::{Event, Op};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// The assembled host core.
///
/// Construction wires the OCR supervisor, the automation controller, and
/// the round-trip coordinator together; [`Host::run`] then drives them
/// from a line-delimited JSON operation stream until `shutdown` or
/// end-of-file.
pub struct Host {
    supervisor: Arc<OcrSupervisor>,
    controller: Arc<AutomationController>,
    coordinator: Arc<OcrCoordinator>,
    controller_events: mpsc::Receiver<ControllerEvent>,
}

impl Host {
    pub fn new(config: CoreConfig) -> Self {
        let supervisor = Arc::new(OcrSupervisor::new(config.ocr.clone()));
        let store = ScriptStore::new(config.scripts_dir.clone(), config.script_config_dir.clone());
        let (controller_tx, controller_events) = mpsc::channel(64);
        let controller = Arc::new(AutomationController::new(
            config.runner.clone(),
            store,
            Arc::clone(&supervisor) as Arc<dyn EngineProbe>,
            controller_tx,
        ));

        Self {
            supervisor,
            controller,
            coordinator: Arc::new(OcrCoordinator::new()),
            controller_events,
        }
    }

    /// Run the Op/Event loop to completion.
    ///
    /// Returns after [`Op::Shutdown`] or when the reader reaches
    /// end-of-file (the UI went away); both paths terminate the session
    /// process and the OCR engine before returning.
    ///
    /// # Errors
    ///
    /// Returns an error only for reader failures; malformed operation
    /// lines are logged and skipped.
    pub async fn run<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let Host {
            supervisor,
            controller,
            coordinator,
            controller_events,
        } = self;

        let (events_tx, events_rx) = mpsc::channel::<Event>(64);
        let writer_task = tokio::spawn(write_events(events_rx, writer));
        let pump_task = tokio::spawn(pump_controller_events(
            controller_events,
            Arc::clone(&controller),
            Arc::clone(&coordinator),
            events_tx.clone(),
        ));

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let op: Op = match serde_json::from_str(&line) {
                Ok(op) => op,
                Err(err) => {
                    tracing::warn!("malformed operation line ({err}): {line}");
                    continue;
                }
            };

            if matches!(op, Op::Shutdown) {
                break;
            }
            dispatch_op(op, &supervisor, &controller, &coordinator, &events_tx).await;
        }

        // Reader is done (shutdown op or UI end-of-file): tear down the
        // external processes before the event channel closes.
        controller.terminate().await;
        coordinator.abandon_session().await;
        supervisor.shutdown().await;

        // The pump holds an event sender and would keep the writer alive;
        // nobody is listening for session events anymore.
        pump_task.abort();
        drop(events_tx);
        let _ = writer_task.await;
        Ok(())
    }
}

/// Route one operation to the owning component and emit its reply.
async fn dispatch_op(
    op: Op,
    supervisor: &Arc<OcrSupervisor>,
    controller: &Arc<AutomationController>,
    coordinator: &Arc<OcrCoordinator>,
    events_tx: &mpsc::Sender<Event>,
) {
    match op {
        Op::StartRecord { name } => {
            let outcome = controller.start_recording(&name).await;
            send_command_result(events_tx, "startRecord", outcome).await;
        }
        Op::StopRecord => {
            let outcome = controller.stop_recording().await;
            send_command_result(events_tx, "stopRecord", outcome).await;
        }
        Op::StartPlay { name } => {
            let outcome = controller.start_playing(&name).await;
            send_command_result(events_tx, "startPlay", outcome).await;
        }
        Op::StopPlay => {
            let outcome = controller.stop_playing().await;
            send_command_result(events_tx, "stopPlay", outcome).await;
        }
        Op::ListScripts => {
            let event = match controller.store().list().await {
                Ok(names) => Event::Scripts { names },
                Err(err) => Event::CommandResult {
                    op: "listScripts".to_string(),
                    success: false,
                    error: Some(err.to_string()),
                },
            };
            let _ = events_tx.send(event).await;
        }
        Op::DeleteScript { name } => {
            let outcome = controller.store().delete(&name).await;
            send_command_result(events_tx, "deleteScript", outcome).await;
        }
        Op::SaveConfig { name, config } => {
            let outcome = controller.store().save_config(&name, &config).await;
            send_command_result(events_tx, "saveConfig", outcome).await;
        }
        Op::GetConfig { name } => {
            let event = match controller.store().load_config(&name).await {
                Ok(config) => Event::Config { name, config },
                Err(err) => Event::CommandResult {
                    op: "getConfig".to_string(),
                    success: false,
                    error: Some(err.to_string()),
                },
            };
            let _ = events_tx.send(event).await;
        }
        Op::Ocr { image_base64 } => {
            // Recognition serializes behind the engine; run it off the
            // dispatch loop so session commands stay responsive.
            let supervisor = Arc::clone(supervisor);
            let events_tx = events_tx.clone();
            tokio::spawn(async move {
                let event = match supervisor.recognize(&image_base64).await {
                    Ok(result) => Event::OcrCompleted {
                        success: true,
                        result: Some(result),
                        error: None,
                    },
                    Err(err) => Event::OcrCompleted {
                        success: false,
                        result: None,
                        error: Some(err.to_string()),
                    },
                };
                let _ = events_tx.send(event).await;
            });
        }
        Op::OcrStatus => {
            let _ = events_tx
                .send(Event::OcrStatus {
                    installed: supervisor.installed(),
                })
                .await;
        }
        Op::BreakpointResume { data } => {
            let outcome = controller.resume_breakpoint(&data).await;
            send_command_result(events_tx, "breakpointResume", outcome).await;
        }
        Op::OcrResponse {
            request_id,
            text,
            matched,
        } => {
            let verdict = if matched {
                Verdict::Matched
            } else {
                Verdict::Unmatched
            };
            tracing::debug!("OCR response for '{request_id}': matched={matched}, text={text:?}");
            let outcome = coordinator.resolve(&request_id, verdict).await;
            send_command_result(events_tx, "ocrResponse", outcome).await;
        }
        // Handled by the read loop before dispatch.
        Op::Shutdown => {}
    }
}

async fn send_command_result<E: std::fmt::Display>(
    events_tx: &mpsc::Sender<Event>,
    op: &str,
    outcome: Result<(), E>,
) {
    let event = match outcome {
        Ok(()) => Event::CommandResult {
            op: op.to_string(),
            success: true,
            error: None,
        },
        Err(err) => Event::CommandResult {
            op: op.to_string(),
            success: false,
            error: Some(err.to_string()),
        },
    };
    let _ = events_tx.send(event).await;
}

/// Translate controller events into UI events, threading OCR checkpoint
/// requests and session exits through the coordinator on the way.
async fn pump_controller_events(
    mut controller_events: mpsc::Receiver<ControllerEvent>,
    controller: Arc<AutomationController>,
    coordinator: Arc<OcrCoordinator>,
    events_tx: mpsc::Sender<Event>,
) {
    while let Some(event) = controller_events.recv().await {
        let outgoing = match event {
            ControllerEvent::Status(message) => Event::Status { message },
            ControllerEvent::BreakpointTriggered { t_trigger } => {
                Event::BreakpointTriggered { t_trigger }
            }
            ControllerEvent::OcrRequest(request) => {
                let Some(script_path) = controller.active_script_path().await else {
                    tracing::warn!(
                        "OCR request '{}' with no active session, dropping",
                        request.request_id
                    );
                    continue;
                };
                if let Err(err) = coordinator.begin(script_path, &request).await {
                    // A duplicate id would double-resolve in the UI; the
                    // original pending entry stays authoritative.
                    tracing::warn!("rejected OCR request: {err}");
                    continue;
                }
                Event::OcrRequest {
                    request_id: request.request_id,
                    index: request.index,
                    region: request.region,
                    expected_text: request.expected_text,
                }
            }
            ControllerEvent::ProcessExited { mode } => {
                let abandoned = coordinator.abandon_session().await;
                if abandoned > 0 {
                    tracing::info!("session exit abandoned {abandoned} pending OCR request(s)");
                }
                Event::ProcessExited { mode }
            }
        };
        if events_tx.send(outgoing).await.is_err() {
            return;
        }
    }
}

/// Serialize events to the writer, one JSON document per line.
async fn write_events<W>(mut events_rx: mpsc::Receiver<Event>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events_rx.recv().await {
        let mut line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!("failed to serialize event: {err}");
                continue;
            }
        };
        line.push('\n');
        if writer.write_all(line.as_bytes()).await.is_err() {
            return;
        }
        if writer.flush().await.is_err() {
            return;
        }
    }
}
