//! Automation process controller.
//!
//! Owns the lifecycle of the external runner process. At most one
//! session (recording or playing) exists at a time; starting a new one
//! always force-kills the previous process first. The runner's stdout is
//! pumped through a [`LineFramer`](crate::framing::LineFramer) and every
//! line is decoded into a [`RunnerEvent`] at the boundary; subscribers
//! receive typed [`ControllerEvent`]s on a single channel.

use crate::automation::error::AutomationError;
use crate::automation::runtime::resolve_runtime;
use crate::automation::sentinel;
use crate::automation::store::ScriptStore;
use crate::config::RunnerConfig;
use crate::framing::LineFramer;
use crate::ocr::EngineProbe;
use chrono::Utc;
use rk_protocol::ipc::BreakpointResume;
use rk_protocol::runner_events::{OcrRequestEvent, RunnerEvent, STATUS_OCR_NOT_INSTALLED};
use rk_protocol::session_models::{SessionInfo, SessionMode, SessionPhase};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Grace period between writing the stop sentinel and force-killing a
/// recording session. The runner may be mid-write to its script file;
/// an abrupt kill risks a truncated script.
pub const STOP_GRACE: Duration = Duration::from_millis(500);

/// Typed events routed to the controller's subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Opaque runner progress line, forwarded verbatim.
    Status(String),

    /// A recording breakpoint was hit and the OCR engine is installed.
    BreakpointTriggered { t_trigger: u64 },

    /// An in-playback OCR checkpoint awaiting a sentinel resolution.
    OcrRequest(OcrRequestEvent),

    /// The runner process exited, expectedly or not.
    ProcessExited { mode: SessionMode },
}

struct ActiveSession {
    info: SessionInfo,
    child: Child,
}

/// Supervisor for the external automation runner.
pub struct AutomationController {
    runner: RunnerConfig,
    store: ScriptStore,
    probe: Arc<dyn EngineProbe>,
    events_tx: mpsc::Sender<ControllerEvent>,
    session: Arc<Mutex<Option<ActiveSession>>>,
}

impl AutomationController {
    /// Create a controller.
    ///
    /// # Arguments
    ///
    /// * `runner` - Runtime resolution settings
    /// * `store` - Script and configuration storage
    /// * `probe` - OCR engine installation probe, used to gate
    ///   breakpoint dispatch
    /// * `events_tx` - Channel on which all session events are delivered
    pub fn new(
        runner: RunnerConfig,
        store: ScriptStore,
        probe: Arc<dyn EngineProbe>,
        events_tx: mpsc::Sender<ControllerEvent>,
    ) -> Self {
        Self {
            runner,
            store,
            probe,
            events_tx,
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Start recording a script under `name`.
    ///
    /// Any session already running is force-killed first. The runner
    /// creates and writes the script file itself; the host only derives
    /// the path.
    pub async fn start_recording(&self, name: &str) -> Result<(), AutomationError> {
        let script_path = self.store.script_path(name)?;
        self.store.ensure_dirs().await?;
        self.spawn_session(SessionMode::Recording, name, script_path, None)
            .await
    }

    /// Start playing the named script, honoring its stored repeat count
    /// (0 repeats forever). Fails when the script does not exist.
    pub async fn start_playing(&self, name: &str) -> Result<(), AutomationError> {
        let script_path = self.store.script_path(name)?;
        if !script_path.exists() {
            return Err(AutomationError::ScriptNotFound {
                name: name.to_string(),
            });
        }
        let repeat_count = self.store.repeat_count(name).await;
        self.spawn_session(SessionMode::Playing, name, script_path, Some(repeat_count))
            .await
    }

    /// Cooperatively stop the active recording session.
    ///
    /// Writes the stop sentinel, waits out [`STOP_GRACE`] for the
    /// polling runner to exit on its own, then unconditionally
    /// force-kills whatever is left.
    pub async fn stop_recording(&self) -> Result<(), AutomationError> {
        let (session_id, script_path) = {
            let mut guard = self.session.lock().await;
            match guard.as_mut() {
                Some(active) if active.info.mode == SessionMode::Recording => {
                    active.info.phase = SessionPhase::Stopping;
                    (active.info.id, active.info.script_path.clone())
                }
                Some(_) => {
                    return Err(AutomationError::WrongMode {
                        expected: SessionMode::Recording,
                    })
                }
                None => return Err(AutomationError::NoActiveSession),
            }
        };

        sentinel::write_stop(&script_path).await?;
        tokio::time::sleep(STOP_GRACE).await;

        let mut guard = self.session.lock().await;
        if let Some(active) = guard.as_mut() {
            if active.info.id == session_id {
                tracing::info!("recording did not stop within grace period, killing runner");
                let _ = active.child.start_kill();
            }
        }
        Ok(())
    }

    /// Force-stop the active playback session. No graceful path exists
    /// for playback; the script file is not being written.
    pub async fn stop_playing(&self) -> Result<(), AutomationError> {
        let mut guard = self.session.lock().await;
        match guard.as_mut() {
            Some(active) if active.info.mode == SessionMode::Playing => {
                let _ = active.child.start_kill();
                Ok(())
            }
            Some(_) => Err(AutomationError::WrongMode {
                expected: SessionMode::Playing,
            }),
            None => Err(AutomationError::NoActiveSession),
        }
    }

    /// Resolve the pending breakpoint of the active session.
    ///
    /// Always writes exactly one resume sentinel; cancellation is the
    /// zero-region, empty-text payload, never a missing file.
    pub async fn resume_breakpoint(&self, data: &BreakpointResume) -> Result<(), AutomationError> {
        let script_path = self
            .active_script_path()
            .await
            .ok_or(AutomationError::NoActiveSession)?;
        sentinel::write_resume(&script_path, data).await?;
        Ok(())
    }

    /// The script and configuration store backing this controller.
    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    /// Script path of the active session, if any.
    pub async fn active_script_path(&self) -> Option<PathBuf> {
        let guard = self.session.lock().await;
        guard.as_ref().map(|active| active.info.script_path.clone())
    }

    /// Snapshot of the active session, if any.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        let guard = self.session.lock().await;
        guard.as_ref().map(|active| active.info.clone())
    }

    /// Kill the active session process, whatever its mode. Used on host
    /// shutdown; the reader task still emits `ProcessExited`.
    pub async fn terminate(&self) {
        let mut guard = self.session.lock().await;
        if let Some(active) = guard.as_mut() {
            let _ = active.child.start_kill();
        }
    }

    async fn spawn_session(
        &self,
        mode: SessionMode,
        name: &str,
        script_path: PathBuf,
        repeat_count: Option<u32>,
    ) -> Result<(), AutomationError> {
        // Mutual exclusion: a new request implicitly cancels a dangling
        // session of either mode.
        self.terminate().await;

        let runtime = resolve_runtime(&self.runner)?;

        let mut command = Command::new(&runtime.program);
        command.args(&runtime.base_args);
        match mode {
            SessionMode::Recording => {
                command.arg("record").arg(&script_path);
            }
            SessionMode::Playing => {
                command.arg("play").arg(&script_path);
                command.arg(repeat_count.unwrap_or(0).to_string());
            }
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let stdout = child.stdout.take().ok_or_else(|| {
            AutomationError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "runner stdout unavailable",
            ))
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "runner", "{line}");
                }
            });
        }

        let info = SessionInfo {
            id: Uuid::new_v4(),
            mode,
            script_name: name.to_string(),
            script_path,
            phase: SessionPhase::Starting,
            started_at: Utc::now(),
        };
        tracing::info!(
            "started {mode:?} session '{name}' via {}",
            runtime.program.display()
        );

        let session_id = info.id;
        {
            let mut guard = self.session.lock().await;
            // Replacing a still-registered session drops its Child;
            // kill_on_drop reaps the stray process.
            *guard = Some(ActiveSession { info, child });
        }

        tokio::spawn(pump_runner_stdout(
            stdout,
            session_id,
            mode,
            Arc::clone(&self.session),
            Arc::clone(&self.probe),
            self.events_tx.clone(),
        ));

        Ok(())
    }
}

/// Read runner stdout to end-of-file, routing decoded events, then emit
/// the terminal `ProcessExited` and clear the session reference.
async fn pump_runner_stdout(
    mut stdout: ChildStdout,
    session_id: Uuid,
    mode: SessionMode,
    session: Arc<Mutex<Option<ActiveSession>>>,
    probe: Arc<dyn EngineProbe>,
    events_tx: mpsc::Sender<ControllerEvent>,
) {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match stdout.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for line in framer.feed(&buf[..n]) {
            if line.trim().is_empty() {
                continue;
            }
            mark_active(&session, session_id).await;
            dispatch_line(&line, &probe, &events_tx).await;
        }
    }
    if let Some(line) = framer.finish() {
        if !line.trim().is_empty() {
            dispatch_line(&line, &probe, &events_tx).await;
        }
    }

    // Clear the session reference, but only if it is still ours; a new
    // session may already have replaced it.
    let taken = {
        let mut guard = session.lock().await;
        match guard.as_ref() {
            Some(active) if active.info.id == session_id => guard.take(),
            _ => None,
        }
    };
    if let Some(mut active) = taken {
        let _ = active.child.wait().await;
    }

    // Terminal event is emitted whether or not the exit was expected, so
    // the UI can reconcile its recording/playing flags after crashes.
    let _ = events_tx.send(ControllerEvent::ProcessExited { mode }).await;
}

/// First observed output confirms liveness: Starting -> Active.
async fn mark_active(session: &Arc<Mutex<Option<ActiveSession>>>, session_id: Uuid) {
    let mut guard = session.lock().await;
    if let Some(active) = guard.as_mut() {
        if active.info.id == session_id && active.info.phase == SessionPhase::Starting {
            active.info.phase = SessionPhase::Active;
        }
    }
}

async fn dispatch_line(
    line: &str,
    probe: &Arc<dyn EngineProbe>,
    events_tx: &mpsc::Sender<ControllerEvent>,
) {
    let event = match RunnerEvent::parse(line) {
        RunnerEvent::Status(text) => ControllerEvent::Status(text),
        RunnerEvent::BreakpointTrigger { t_trigger } => {
            if probe.is_installed().await {
                ControllerEvent::BreakpointTriggered { t_trigger }
            } else {
                // The runner is left waiting; it times out or gets
                // cancelled by the user.
                tracing::warn!("breakpoint hit but OCR engine is not installed");
                ControllerEvent::Status(STATUS_OCR_NOT_INSTALLED.to_string())
            }
        }
        RunnerEvent::OcrRequest(request) => ControllerEvent::OcrRequest(request),
        // Synthesized at end-of-file below, never parsed from a line.
        RunnerEvent::ProcessExit => return,
    };
    let _ = events_tx.send(event).await;
}
