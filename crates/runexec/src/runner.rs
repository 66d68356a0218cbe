use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::{ProcessLauncher, SystemLauncher};
use crate::{RunError, RunSpec};

const STARTING_LINE: &str = "Starting build process...";
const SUCCESS_LINE: &str = "Build completed successfully.";

/// Lifecycle of a build job.
/// （建置工作的生命週期。）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl BuildState {
    pub fn is_running(self) -> bool {
        self == BuildState::Running
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Succeeded | BuildState::Failed)
    }
}

/// Why a finished build counts as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildFailure {
    ExitCode(i32),
    /// The process ended without an exit code, typically by a signal.
    Terminated,
    /// The build tool could not be started at all.
    Launch { not_found: bool, message: String },
    /// Reading output or waiting on the process failed.
    Io(String),
}

/// Rejections from [`BuildRunner::start`]; nothing about the current job changes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("a build is already running")]
    InProgress,
    #[error("no project is loaded")]
    NoProject,
}

/// The current (or last) build and its console log.
/// （目前或最近一次的建置工作與其輸出紀錄。）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    state: BuildState,
    working_dir: Option<PathBuf>,
    output: Vec<String>,
    exit_code: Option<i32>,
    failure: Option<BuildFailure>,
}

impl Default for BuildJob {
    fn default() -> Self {
        Self {
            state: BuildState::Idle,
            working_dir: None,
            output: Vec::new(),
            exit_code: None,
            failure: None,
        }
    }
}

impl BuildJob {
    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Set only once the job has left `Running`.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn failure(&self) -> Option<&BuildFailure> {
        self.failure.as_ref()
    }
}

/// Notification delivered on the interactive side, in subprocess order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Output(String),
    StateChanged(BuildState),
}

/// Receiver of console lines and state changes.
/// （接收主控台輸出與狀態變化的介面。）
pub trait OutputSink {
    fn clear(&mut self);

    fn append_line(&mut self, line: &str);

    fn state_changed(&mut self, _state: BuildState) {}
}

/// In-memory console, used by headless front ends and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleBuffer {
    pub lines: Vec<String>,
    pub states: Vec<BuildState>,
}

impl OutputSink for ConsoleBuffer {
    fn clear(&mut self) {
        self.lines.clear();
    }

    fn append_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn state_changed(&mut self, state: BuildState) {
        self.states.push(state);
    }
}

enum WorkerMessage {
    Line(String),
    Finished {
        exit_code: Option<i32>,
        failure: Option<BuildFailure>,
    },
}

/// Supervises at most one external build at a time.
/// （同一時間最多監控一個外部建置。）
///
/// The subprocess lives on a worker thread that only posts messages. Job state
/// is mutated exclusively by [`BuildRunner::poll`] / [`BuildRunner::wait`] on the
/// owning thread, so a finished process stays `Running` until drained.
pub struct BuildRunner {
    spec: RunSpec,
    launcher: Arc<dyn ProcessLauncher>,
    job: BuildJob,
    rx: Option<Receiver<WorkerMessage>>,
}

impl BuildRunner {
    pub fn new(spec: RunSpec) -> Self {
        Self::with_launcher(spec, Arc::new(SystemLauncher))
    }

    pub fn with_launcher(spec: RunSpec, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            spec,
            launcher,
            job: BuildJob::default(),
            rx: None,
        }
    }

    pub fn spec(&self) -> &RunSpec {
        &self.spec
    }

    pub fn job(&self) -> &BuildJob {
        &self.job
    }

    pub fn state(&self) -> BuildState {
        self.job.state
    }

    pub fn is_running(&self) -> bool {
        self.job.state.is_running()
    }

    /// Starts a build in `project_root` and returns immediately.
    /// （在 `project_root` 啟動建置並立即返回。）
    ///
    /// The previous job's log is cleared. Launch problems are not returned
    /// here; they arrive later as console lines and a `Failed` state.
    pub fn start(
        &mut self,
        project_root: Option<&Path>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), BuildError> {
        if self.job.state.is_running() {
            return Err(BuildError::InProgress);
        }
        let root = project_root.ok_or(BuildError::NoProject)?;

        self.job = BuildJob {
            state: BuildState::Running,
            working_dir: Some(root.to_path_buf()),
            ..BuildJob::default()
        };
        sink.clear();
        sink.state_changed(BuildState::Running);
        self.push_line(STARTING_LINE.to_string(), sink);

        let spec = self.spec.clone().with_working_dir(root);
        tracing::info!(
            command = %spec.display_command(),
            cwd = %root.display(),
            "starting build"
        );
        let launcher = Arc::clone(&self.launcher);
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("sitestudio-build".into())
            .spawn(move || run_worker(launcher.as_ref(), &spec, &tx));
        match spawned {
            Ok(_) => self.rx = Some(rx),
            Err(err) => {
                tracing::error!(error = %err, "could not spawn build worker");
                self.push_line(unexpected_error_line(&err), sink);
                self.finish(None, Some(BuildFailure::Io(err.to_string())), sink);
            }
        }
        Ok(())
    }

    /// Applies every message that has already arrived, without blocking.
    /// （不阻塞地套用所有已抵達的訊息。）
    pub fn poll(&mut self, sink: &mut dyn OutputSink) -> Vec<BuildEvent> {
        let mut events = Vec::new();
        while let Some(rx) = &self.rx {
            match rx.try_recv() {
                Ok(message) => self.apply(message, sink, &mut events),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.worker_vanished(sink, &mut events),
            }
        }
        events
    }

    /// Blocks until the current job reaches a terminal state.
    /// Meant for front ends without an event loop.
    pub fn wait(&mut self, sink: &mut dyn OutputSink) -> BuildState {
        let mut events = Vec::new();
        while let Some(rx) = &self.rx {
            match rx.recv() {
                Ok(message) => self.apply(message, sink, &mut events),
                Err(_) => self.worker_vanished(sink, &mut events),
            }
        }
        self.job.state
    }

    /// Like [`BuildRunner::wait`] but gives up after `timeout`, returning `None`.
    pub fn wait_timeout(
        &mut self,
        sink: &mut dyn OutputSink,
        timeout: Duration,
    ) -> Option<BuildState> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while let Some(rx) = &self.rx {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(message) => self.apply(message, sink, &mut events),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => self.worker_vanished(sink, &mut events),
            }
        }
        Some(self.job.state)
    }

    fn apply(
        &mut self,
        message: WorkerMessage,
        sink: &mut dyn OutputSink,
        events: &mut Vec<BuildEvent>,
    ) {
        match message {
            WorkerMessage::Line(line) => {
                events.push(BuildEvent::Output(line.clone()));
                self.push_line(line, sink);
            }
            WorkerMessage::Finished { exit_code, failure } => {
                let state = self.finish(exit_code, failure, sink);
                events.push(BuildEvent::StateChanged(state));
            }
        }
    }

    fn worker_vanished(&mut self, sink: &mut dyn OutputSink, events: &mut Vec<BuildEvent>) {
        let message = "build worker exited unexpectedly".to_string();
        let line = format!("An unexpected error occurred during build: {message}");
        events.push(BuildEvent::Output(line.clone()));
        self.push_line(line, sink);
        let state = self.finish(None, Some(BuildFailure::Io(message)), sink);
        events.push(BuildEvent::StateChanged(state));
    }

    fn push_line(&mut self, line: String, sink: &mut dyn OutputSink) {
        sink.append_line(&line);
        self.job.output.push(line);
    }

    fn finish(
        &mut self,
        exit_code: Option<i32>,
        failure: Option<BuildFailure>,
        sink: &mut dyn OutputSink,
    ) -> BuildState {
        let state = if failure.is_none() && exit_code == Some(0) {
            BuildState::Succeeded
        } else {
            BuildState::Failed
        };
        self.job.state = state;
        self.job.exit_code = exit_code;
        self.job.failure = failure;
        self.rx = None;
        match state {
            BuildState::Succeeded => tracing::info!("build succeeded"),
            _ => tracing::warn!(?exit_code, failure = ?self.job.failure, "build failed"),
        }
        sink.state_changed(state);
        state
    }
}

fn run_worker(launcher: &dyn ProcessLauncher, spec: &RunSpec, tx: &Sender<WorkerMessage>) {
    // A closed channel means the runner is gone; the process is still reaped.
    let send_line = |line: String| {
        let _ = tx.send(WorkerMessage::Line(line));
    };
    let finish = |exit_code: Option<i32>, failure: Option<BuildFailure>| {
        let _ = tx.send(WorkerMessage::Finished { exit_code, failure });
    };

    let mut process = match launcher.launch(spec) {
        Ok(process) => process,
        Err(err) => {
            tracing::warn!(error = %err, "build tool failed to launch");
            send_line(launch_error_line(spec, &err));
            finish(
                None,
                Some(BuildFailure::Launch {
                    not_found: err.is_not_found(),
                    message: err.to_string(),
                }),
            );
            return;
        }
    };

    let mut read_failure = None;
    if let Some(output) = process.take_output() {
        let mut reader = BufReader::new(output);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buffer);
                    send_line(text.trim_end_matches(['\n', '\r']).to_string());
                }
                Err(err) => {
                    let err = RunError::Output(err);
                    send_line(unexpected_error_line(&err));
                    read_failure = Some(BuildFailure::Io(err.to_string()));
                    break;
                }
            }
        }
    }

    match process.wait() {
        Ok(Some(0)) if read_failure.is_none() => {
            send_line(SUCCESS_LINE.to_string());
            finish(Some(0), None);
        }
        Ok(Some(code)) if read_failure.is_none() => {
            send_line(format!("Build failed with exit code: {code}"));
            finish(Some(code), Some(BuildFailure::ExitCode(code)));
        }
        Ok(None) if read_failure.is_none() => {
            send_line("Build failed: process terminated without an exit code".to_string());
            finish(None, Some(BuildFailure::Terminated));
        }
        Ok(code) => finish(code, read_failure),
        Err(err) => {
            let err = RunError::Wait(err);
            send_line(unexpected_error_line(&err));
            finish(None, Some(BuildFailure::Io(err.to_string())));
        }
    }
}

fn launch_error_line(spec: &RunSpec, err: &RunError) -> String {
    if !err.is_not_found() {
        return unexpected_error_line(err);
    }
    if spec.program == "npm" {
        "Error: 'npm' command not found. Is Node.js installed and in your PATH?".to_string()
    } else {
        format!(
            "Error: '{}' command not found. Is it installed and in your PATH?",
            spec.program
        )
    }
}

fn unexpected_error_line(err: &dyn std::fmt::Display) -> String {
    format!("An unexpected error occurred during build: {err}")
}
