//! Supervised process handles.
//!
//! A [`ProcessHandle`] owns one spawned child, tracks its lifecycle state,
//! forwards its stdout/stderr into the launcher's log stream, and records
//! its exit status once known. Handles are owned exclusively by the
//! supervisor and dropped as soon as the exit has been observed and logged.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use crate::supervisor::spawn::{ChildProcess, ProcessSpawner};
use crate::Result;

/// Which slot a supervised process occupies.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ProcessRole {
    /// The conversion HTTP service.
    Backend,
    /// The desktop application.
    Frontend,
}

impl ProcessRole {
    /// Lower-case role name used as the log tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl Display for ProcessRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one supervised process slot.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProcessState {
    /// No spawn attempted yet.
    NotStarted,
    /// Spawn issued, stdio not wired up yet.
    Starting,
    /// Process is alive.
    Running,
    /// Termination signal sent, waiting for exit.
    Stopping,
    /// Process has exited and its status has been recorded.
    Stopped,
}

impl Display for ProcessState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Launch request for one supervised process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Slot the process occupies.
    pub role: ProcessRole,
    /// Executable to run.
    pub program: PathBuf,
    /// Launch arguments.
    pub args: Vec<String>,
    /// Working directory the process starts in.
    pub workdir: PathBuf,
}

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProcessExit {
    /// Normal exit with the given code.
    Code(i32),
    /// Killed by a signal (no exit code on Unix).
    Signal,
    /// The wait itself failed; status unknown.
    Unknown,
}

impl ProcessExit {
    /// Map a `wait()` result onto an exit summary.
    #[must_use]
    pub fn from_status(result: std::io::Result<ExitStatus>) -> Self {
        match result {
            Ok(status) => status.code().map_or(Self::Signal, Self::Code),
            Err(_) => Self::Unknown,
        }
    }
}

impl Display for ProcessExit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exited with code {code}"),
            Self::Signal => f.write_str("terminated by signal"),
            Self::Unknown => f.write_str("exit status unknown"),
        }
    }
}

/// One live supervised child process.
pub struct ProcessHandle {
    role: ProcessRole,
    child: Box<dyn ChildProcess>,
    pid: Option<u32>,
    state: ProcessState,
    exit: Option<ProcessExit>,
}

impl ProcessHandle {
    /// Spawn the process described by `spec` and wire its stdout/stderr
    /// into the launcher's log stream, tagged with the process role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the spawner fails.
    pub fn launch(spawner: &dyn ProcessSpawner, spec: &ProcessSpec) -> Result<Self> {
        let mut handle = Self {
            role: spec.role,
            child: spawner.spawn(spec)?,
            pid: None,
            state: ProcessState::Starting,
            exit: None,
        };
        handle.pid = handle.child.id();

        if let Some(stdout) = handle.child.take_stdout() {
            tokio::spawn(forward_lines(spec.role, stdout, StreamKind::Stdout));
        }
        if let Some(stderr) = handle.child.take_stderr() {
            tokio::spawn(forward_lines(spec.role, stderr, StreamKind::Stderr));
        }

        handle.state = ProcessState::Running;
        Ok(handle)
    }

    /// Slot this process occupies.
    #[must_use]
    pub const fn role(&self) -> ProcessRole {
        self.role
    }

    /// OS process id at spawn time.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    /// Recorded exit status, once the process has been observed to exit.
    #[must_use]
    pub const fn exit(&self) -> Option<ProcessExit> {
        self.exit
    }

    /// Wait for the process to exit and record its status. Returns the
    /// recorded status immediately if the exit was already observed.
    pub async fn wait_exit(&mut self) -> ProcessExit {
        if let Some(exit) = self.exit {
            return exit;
        }
        let exit = ProcessExit::from_status(self.child.wait().await);
        self.state = ProcessState::Stopped;
        self.exit = Some(exit);
        exit
    }

    /// Stop the process: graceful termination signal, then up to `grace`
    /// to exit, then a force kill. No-op if the exit was already observed.
    pub async fn stop(&mut self, grace: Duration) -> ProcessExit {
        if let Some(exit) = self.exit {
            return exit;
        }

        self.state = ProcessState::Stopping;
        info!(role = %self.role, "sending termination signal");
        if let Err(err) = self.child.terminate() {
            debug!(role = %self.role, %err, "termination signal not delivered");
        }

        let exit = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(result) => ProcessExit::from_status(result),
            Err(_elapsed) => {
                warn!(role = %self.role, "child ignored termination signal, force killing");
                if let Err(err) = self.child.force_kill().await {
                    warn!(role = %self.role, %err, "force kill failed");
                }
                ProcessExit::from_status(self.child.wait().await)
            }
        };

        self.state = ProcessState::Stopped;
        self.exit = Some(exit);
        info!(role = %self.role, status = %exit, "child stopped");
        exit
    }
}

#[derive(Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

/// Forward one child output stream line-by-line into the log, tagged with
/// the process role. Stdout lines log at `info`, stderr lines at `warn`.
async fn forward_lines(
    role: ProcessRole,
    stream: Box<dyn AsyncRead + Send + Unpin>,
    kind: StreamKind,
) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                match kind {
                    StreamKind::Stdout => info!(role = %role, "{line}"),
                    StreamKind::Stderr => warn!(role = %role, "{line}"),
                }
            }
            Ok(None) => break,
            Err(err) => {
                debug!(role = %role, %err, "child output stream closed with error");
                break;
            }
        }
    }
}
