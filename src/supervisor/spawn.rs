//! Process spawning seam.
//!
//! The [`ProcessSpawner`] / [`ChildProcess`] traits decouple the supervisor
//! from `tokio::process`, so tests can drive the full lifecycle (spawn,
//! exit, termination signals) without creating real OS processes.
//! [`OsSpawner`] is the production implementation.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::supervisor::process::ProcessSpec;
use crate::{AppError, Result};

/// One spawned child process, abstracted over its origin.
pub trait ChildProcess: Send {
    /// OS process id, if the process is still running.
    fn id(&self) -> Option<u32>;

    /// Take the child's stdout stream. Returns `None` after the first call.
    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    /// Take the child's stderr stream. Returns `None` after the first call.
    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    /// Wait for the process to exit and return its status.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<ExitStatus>> + Send + '_>>;

    /// Ask the process to exit gracefully (SIGTERM on Unix). Must be a
    /// no-op when the process has already exited.
    ///
    /// # Errors
    ///
    /// Returns the underlying OS error if the signal cannot be delivered.
    fn terminate(&mut self) -> std::io::Result<()>;

    /// Kill the process without further ceremony and reap it.
    fn force_kill(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + '_>>;
}

/// Capability to launch supervised processes.
pub trait ProcessSpawner: Send + Sync {
    /// Spawn the process described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the OS refuses to start the process.
    fn spawn(&self, spec: &ProcessSpec) -> Result<Box<dyn ChildProcess>>;
}

/// Production spawner backed by `tokio::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSpawner;

impl ProcessSpawner for OsSpawner {
    fn spawn(&self, spec: &ProcessSpec) -> Result<Box<dyn ChildProcess>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|err| {
            AppError::Spawn(format!(
                "failed to spawn {}: {err}",
                spec.program.display()
            ))
        })?;

        Ok(Box::new(OsChild { inner: child }))
    }
}

/// [`ChildProcess`] over a real `tokio::process::Child`.
struct OsChild {
    inner: Child,
}

impl ChildProcess for OsChild {
    fn id(&self) -> Option<u32> {
        self.inner.id()
    }

    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.inner
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Send + Unpin>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.inner
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Send + Unpin>)
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<ExitStatus>> + Send + '_>> {
        Box::pin(self.inner.wait())
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> std::io::Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // `id()` returns None once the child has been reaped; nothing to do.
        let Some(pid) = self.inner.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid)
            .map_err(|_| std::io::Error::other("pid does not fit in i32"))?;
        kill(Pid::from_raw(pid), Signal::SIGTERM)
            .map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> std::io::Result<()> {
        if self.inner.id().is_none() {
            return Ok(());
        }
        self.inner.start_kill()
    }

    fn force_kill(&mut self) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + '_>> {
        Box::pin(self.inner.kill())
    }
}
