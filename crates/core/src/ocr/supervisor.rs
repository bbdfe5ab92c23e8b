//! OCR engine process supervisor.
//!
//! All access to the engine is funneled through a single worker task: any
//! number of callers may invoke [`OcrSupervisor::recognize`] concurrently,
//! but exactly one request is ever in flight against the process, and
//! responses are matched to requests purely by FIFO position. The engine
//! protocol carries no request identifier, so positional matching is a
//! structural assumption of the wrapped engine; if it ever reordered or
//! dropped a response the wrong caller would be resolved. The worker keeps
//! the assumption honest by never writing a second request before the
//! first answer (or the process's death) arrives.
//!
//! An engine exit does not fail queued requests: the engine is routinely
//! killed between sessions, so the queue survives and the next drain
//! respawns the process and resends the head request.

use crate::config::OcrConfig;
use crate::framing::LineFramer;
use crate::ocr::error::OcrError;
use rk_protocol::ocr_models::{is_success_code, OcrResult};
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

/// Handle to the supervised OCR engine.
///
/// Cloneable-free by design: construct once and share behind an `Arc`.
pub struct OcrSupervisor {
    config: OcrConfig,
    cmd_tx: mpsc::Sender<Cmd>,
}

impl OcrSupervisor {
    /// Create the supervisor and start its worker task.
    ///
    /// The engine process itself is spawned lazily on the first
    /// `recognize` call.
    pub fn new(config: OcrConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let worker = Worker::new(config.clone(), cmd_tx.clone());
        tokio::spawn(worker.run(cmd_rx));
        Self { config, cmd_tx }
    }

    /// Recognize text in a base64-encoded image.
    ///
    /// Safe to call concurrently; requests are answered in submission
    /// order. A `data:` URI prefix on the image is stripped before the
    /// payload is written to the engine.
    ///
    /// # Errors
    ///
    /// - [`OcrError::NotInstalled`] when the engine executable is missing
    /// - [`OcrError::Engine`] when the engine answers with an error code
    /// - [`OcrError::EngineCrashed`] when the engine (or the supervisor)
    ///   went away before this request resolved
    pub async fn recognize(&self, image: &str) -> Result<OcrResult, OcrError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = Cmd::Recognize {
            image_base64: strip_data_uri(image).to_string(),
            reply: reply_tx,
        };
        if self.cmd_tx.send(cmd).await.is_err() {
            return Err(OcrError::EngineCrashed);
        }
        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(OcrError::EngineCrashed),
        }
    }

    /// Terminate the engine process if one is running.
    ///
    /// Idempotent; never fails when no engine is up. Requests still
    /// queued at shutdown resolve as [`OcrError::EngineCrashed`].
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(Cmd::Shutdown { ack: ack_tx }).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Whether the engine executable is present on disk.
    pub fn installed(&self) -> bool {
        self.config.executable_path().exists()
    }
}

enum Cmd {
    Recognize {
        image_base64: String,
        reply: oneshot::Sender<Result<OcrResult, OcrError>>,
    },
    /// One complete, non-blank line of engine stdout. The generation
    /// identifies which engine spawn produced it, so lines from a reader
    /// of an already-replaced process cannot resolve current requests.
    EngineLine { generation: u64, line: String },
    /// Engine stdout reached end-of-file (crash, exit, or kill).
    EngineExited { generation: u64 },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

struct PendingRequest {
    image_base64: String,
    reply: oneshot::Sender<Result<OcrResult, OcrError>>,
    /// Write attempts against a dying engine; bounds the respawn-retry
    /// loop for this request.
    failed_writes: u32,
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    generation: u64,
}

struct Worker {
    config: OcrConfig,
    cmd_tx: mpsc::Sender<Cmd>,
    queue: VecDeque<PendingRequest>,
    in_flight: bool,
    engine: Option<EngineProcess>,
    next_generation: u64,
}

impl Worker {
    fn new(config: OcrConfig, cmd_tx: mpsc::Sender<Cmd>) -> Self {
        Self {
            config,
            cmd_tx,
            queue: VecDeque::new(),
            in_flight: false,
            engine: None,
            next_generation: 0,
        }
    }

    fn current_generation(&self) -> Option<u64> {
        self.engine.as_ref().map(|engine| engine.generation)
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Cmd>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                Cmd::Recognize {
                    image_base64,
                    reply,
                } => {
                    self.queue.push_back(PendingRequest {
                        image_base64,
                        reply,
                        failed_writes: 0,
                    });
                    self.drain().await;
                }
                Cmd::EngineLine { generation, line } => {
                    if self.current_generation() != Some(generation) {
                        tracing::debug!("dropping line from replaced OCR engine: {line}");
                        continue;
                    }
                    self.complete_head(&line);
                    self.drain().await;
                }
                Cmd::EngineExited { generation } => {
                    if self.current_generation() != Some(generation) {
                        // A replaced engine's reader finished; the child was
                        // already reaped when it was dropped.
                        continue;
                    }
                    self.in_flight = false;
                    if let Some(mut engine) = self.engine.take() {
                        let _ = engine.child.wait().await;
                    }
                    tracing::info!("OCR engine exited");
                    // Queued requests survive; respawn and resend the head.
                    self.drain().await;
                }
                Cmd::Shutdown { ack } => {
                    self.kill_engine().await;
                    let _ = ack.send(());
                    // Dropping the worker closes all queued reply channels,
                    // which callers observe as EngineCrashed.
                    return;
                }
            }
        }
    }

    /// Advance the queue: spawn the engine if needed and write the head
    /// request. No-op while a request is in flight or the queue is empty.
    async fn drain(&mut self) {
        loop {
            if self.in_flight || self.queue.is_empty() {
                return;
            }

            if self.engine.is_none() {
                let generation = self.next_generation;
                match self.spawn_engine(generation) {
                    Ok(engine) => {
                        self.next_generation += 1;
                        self.engine = Some(engine);
                    }
                    Err(err) => {
                        // Fail the head request only; later calls may retry
                        // after the engine gets (re)installed.
                        if let Some(request) = self.queue.pop_front() {
                            let _ = request.reply.send(Err(err));
                        }
                        return;
                    }
                }
            }

            let payload = match self.queue.front() {
                Some(request) => {
                    let mut line =
                        serde_json::json!({ "image_base64": request.image_base64 }).to_string();
                    line.push('\n');
                    line
                }
                None => return,
            };

            let Some(engine) = self.engine.as_mut() else {
                return;
            };
            match engine.stdin.write_all(payload.as_bytes()).await {
                Ok(()) => {
                    self.in_flight = true;
                    return;
                }
                Err(err) => {
                    // Engine died under us; respawn and retry the head,
                    // but not indefinitely.
                    tracing::warn!("failed to write OCR request: {err}");
                    self.engine = None;
                    if let Some(head) = self.queue.front_mut() {
                        head.failed_writes += 1;
                        if head.failed_writes >= 2 {
                            if let Some(request) = self.queue.pop_front() {
                                let _ = request.reply.send(Err(OcrError::EngineCrashed));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Resolve the head-of-queue request with one engine output line.
    fn complete_head(&mut self, line: &str) {
        if !self.in_flight {
            tracing::warn!("OCR engine output with no request in flight: {line}");
            return;
        }

        // The engine occasionally emits non-protocol diagnostic text;
        // drop it and keep waiting for the real response.
        let result: OcrResult = match serde_json::from_str(line) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("unparseable OCR engine line ({err}): {line}");
                return;
            }
        };

        if let Some(request) = self.queue.pop_front() {
            self.in_flight = false;
            let outcome = if is_success_code(result.code) {
                Ok(result)
            } else {
                Err(OcrError::Engine { code: result.code })
            };
            let _ = request.reply.send(outcome);
        }
    }

    fn spawn_engine(&self, generation: u64) -> Result<EngineProcess, OcrError> {
        let exe = self.config.executable_path();
        if !exe.exists() {
            return Err(OcrError::NotInstalled);
        }

        // The engine loads model files relative to its own path, so the
        // working directory must be the installation directory.
        let mut child = Command::new(&exe)
            .current_dir(&self.config.engine_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            OcrError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "engine stdin unavailable",
            ))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            OcrError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "engine stdout unavailable",
            ))
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "ocr-engine", "{line}");
                }
            });
        }

        tokio::spawn(read_engine_stdout(stdout, generation, self.cmd_tx.clone()));
        tracing::info!("spawned OCR engine: {}", exe.display());

        Ok(EngineProcess {
            child,
            stdin,
            generation,
        })
    }

    async fn kill_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            let _ = engine.child.start_kill();
            let _ = engine.child.wait().await;
        }
        self.in_flight = false;
    }
}

/// Pump engine stdout through a line framer into worker commands.
async fn read_engine_stdout(mut stdout: ChildStdout, generation: u64, cmd_tx: mpsc::Sender<Cmd>) {
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
            if cmd_tx
                .send(Cmd::EngineLine { generation, line })
                .await
                .is_err()
            {
                return;
            }
        }
    }

    if let Some(line) = framer.finish() {
        if !line.trim().is_empty() {
            let _ = cmd_tx.send(Cmd::EngineLine { generation, line }).await;
        }
    }
    let _ = cmd_tx.send(Cmd::EngineExited { generation }).await;
}

/// Strip a `data:<mime>;base64,` prefix, if present.
fn strip_data_uri(image: &str) -> &str {
    if image.starts_with("data:") {
        match image.split_once("base64,") {
            Some((_, rest)) => rest,
            None => image,
        }
    } else {
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_data_uri_with_prefix() {
        assert_eq!(strip_data_uri("data:image/png;base64,AAAA"), "AAAA");
    }

    #[test]
    fn test_strip_data_uri_without_prefix() {
        assert_eq!(strip_data_uri("AAAA"), "AAAA");
    }

    #[test]
    fn test_strip_data_uri_malformed_prefix_left_alone() {
        assert_eq!(strip_data_uri("data:image/png"), "data:image/png");
    }

    #[tokio::test]
    async fn test_recognize_fails_when_engine_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = OcrConfig {
            engine_dir: dir.path().to_path_buf(),
            executable: "does-not-exist".to_string(),
        };
        let supervisor = OcrSupervisor::new(config);
        assert!(!supervisor.installed());

        let err = supervisor.recognize("AAAA").await.unwrap_err();
        assert!(matches!(err, OcrError::NotInstalled));
    }

    #[tokio::test]
    async fn test_shutdown_without_engine_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let config = OcrConfig {
            engine_dir: dir.path().to_path_buf(),
            executable: "does-not-exist".to_string(),
        };
        let supervisor = OcrSupervisor::new(config);
        supervisor.shutdown().await;
        supervisor.shutdown().await;
    }
}
