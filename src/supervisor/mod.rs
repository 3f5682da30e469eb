//! Process supervision core.
//!
//! The [`Supervisor`] owns the two child process slots (backend service,
//! frontend application), sequences their startup (the backend must
//! answer its health endpoint before the frontend is spawned) and tears
//! both down on any termination signal or unexpected child exit.

pub mod health;
pub mod process;
pub mod spawn;

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LaunchConfig;
use crate::supervisor::process::{ProcessExit, ProcessHandle, ProcessRole, ProcessSpec};
use crate::supervisor::spawn::{OsSpawner, ProcessSpawner};
use crate::{AppError, Result};

/// Global supervisor lifecycle state, published on a watch channel.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SupervisorState {
    /// Nothing started yet.
    Idle,
    /// Backend spawned, readiness polling in progress.
    BackendStarting,
    /// Backend answered `200` on its health endpoint.
    BackendReady,
    /// Frontend spawn in progress.
    FrontendStarting,
    /// Both children alive; steady state.
    BothRunning,
    /// Teardown in progress.
    ShuttingDown,
    /// Both slots empty; the supervisor is done.
    Terminated,
}

impl Display for SupervisorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::BackendStarting => "backend starting",
            Self::BackendReady => "backend ready",
            Self::FrontendStarting => "frontend starting",
            Self::BothRunning => "both running",
            Self::ShuttingDown => "shutting down",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Explicit ownership record for the two process slots. At most one handle
/// per role exists at a time; a slot is cleared as soon as its process has
/// exited and the exit has been logged.
#[derive(Default)]
struct ProcessSlots {
    backend: Option<ProcessHandle>,
    frontend: Option<ProcessHandle>,
}

/// What woke the supervisor out of its steady state.
enum Wakeup {
    FrontendExit(ProcessExit),
    BackendExit(ProcessExit),
    Cancelled,
}

/// Outcome of racing readiness polling against backend exit.
enum StartupRace {
    Ready(Result<()>),
    Exited(ProcessExit),
}

/// Owns and sequences the backend and frontend processes.
pub struct Supervisor {
    config: Arc<LaunchConfig>,
    spawner: Arc<dyn ProcessSpawner>,
    slots: ProcessSlots,
    state_tx: watch::Sender<SupervisorState>,
    cancel: CancellationToken,
    shutdown_started: bool,
}

impl Supervisor {
    /// Build a supervisor with an injected spawning capability.
    #[must_use]
    pub fn new(config: Arc<LaunchConfig>, spawner: Arc<dyn ProcessSpawner>) -> Self {
        let (state_tx, _) = watch::channel(SupervisorState::Idle);
        Self {
            config,
            spawner,
            slots: ProcessSlots::default(),
            state_tx,
            cancel: CancellationToken::new(),
            shutdown_started: false,
        }
    }

    /// Build a supervisor over real OS processes.
    #[must_use]
    pub fn with_os_spawner(config: Arc<LaunchConfig>) -> Self {
        Self::new(config, Arc::new(OsSpawner))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        *self.state_tx.borrow()
    }

    /// Subscribe to lifecycle state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SupervisorState> {
        self.state_tx.subscribe()
    }

    /// Token that aborts readiness polling and wakes the steady state.
    /// Cancelling it routes the supervisor into shutdown.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Check that both executables exist before anything is spawned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingBinary` naming the first missing path.
    pub fn verify_executables(&self) -> Result<()> {
        verify_executable(&self.config.backend_binary())?;
        verify_executable(&self.config.frontend_binary())?;
        Ok(())
    }

    /// Full lifecycle: verify, start backend, await readiness, start
    /// frontend, supervise until a child exits or the token fires, then
    /// shut down. Startup failures still run the shutdown path before
    /// propagating.
    ///
    /// # Errors
    ///
    /// Returns the startup error (`MissingBinary`, `Spawn`, or `Health`)
    /// that aborted the sequence. A completed run returns `Ok(())`
    /// regardless of how the children exited.
    pub async fn run(&mut self) -> Result<()> {
        self.verify_executables()?;

        if let Err(err) = self.startup().await {
            self.shutdown().await;
            return Err(err);
        }

        self.supervise().await;
        self.shutdown().await;
        Ok(())
    }

    async fn startup(&mut self) -> Result<()> {
        self.start_backend().await?;
        self.start_frontend()
    }

    /// Spawn the backend and wait until its health endpoint answers `200`.
    ///
    /// Readiness polling is raced against the backend's own exit: a
    /// backend that dies before becoming ready rejects startup
    /// immediately instead of leaving the launcher polling a corpse.
    ///
    /// # Errors
    ///
    /// - `AppError::Spawn`: the OS refused to start the process.
    /// - `AppError::Health`: the backend exited before becoming ready,
    ///   or polling was cancelled by a termination signal.
    pub async fn start_backend(&mut self) -> Result<()> {
        self.set_state(SupervisorState::BackendStarting);

        let spec = backend_spec(&self.config);
        let handle = ProcessHandle::launch(self.spawner.as_ref(), &spec)?;
        info!(
            role = %ProcessRole::Backend,
            pid = handle.pid().unwrap_or(0),
            "backend process spawned"
        );
        self.slots.backend = Some(handle);

        let url = self.config.health_url();
        let startup_delay = self.config.startup_delay();
        let poll_interval = self.config.poll_interval();
        let probe_timeout = self.config.probe_timeout();
        let cancel = self.cancel.clone();

        let outcome = {
            let Some(backend) = self.slots.backend.as_mut() else {
                return Err(AppError::Spawn("backend slot empty after spawn".into()));
            };
            tokio::select! {
                ready = health::wait_until_ready(
                    &url,
                    startup_delay,
                    poll_interval,
                    probe_timeout,
                    &cancel,
                ) => StartupRace::Ready(ready),
                exit = backend.wait_exit() => StartupRace::Exited(exit),
            }
        };

        match outcome {
            StartupRace::Ready(Ok(())) => {
                info!("backend service is ready");
                self.set_state(SupervisorState::BackendReady);
                Ok(())
            }
            StartupRace::Ready(Err(err)) => Err(err),
            StartupRace::Exited(exit) => {
                warn!(status = %exit, "backend exited before becoming ready");
                self.slots.backend = None;
                Err(AppError::Health(format!(
                    "backend {exit} before becoming ready"
                )))
            }
        }
    }

    /// Spawn the frontend. No readiness check; it is the interactive
    /// process, and its exit is the designed shutdown trigger.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the OS refuses to start the process.
    pub fn start_frontend(&mut self) -> Result<()> {
        self.set_state(SupervisorState::FrontendStarting);

        let spec = frontend_spec(&self.config);
        let handle = ProcessHandle::launch(self.spawner.as_ref(), &spec)?;
        info!(
            role = %ProcessRole::Frontend,
            pid = handle.pid().unwrap_or(0),
            "frontend application spawned"
        );
        self.slots.frontend = Some(handle);

        self.set_state(SupervisorState::BothRunning);
        Ok(())
    }

    /// Steady state: wait for the first of frontend exit, backend exit, or
    /// cancellation. The exited child's slot is cleared before returning
    /// so shutdown never signals an already-dead process.
    pub async fn supervise(&mut self) {
        let cancel = self.cancel.clone();

        let wakeup = {
            let ProcessSlots { backend, frontend } = &mut self.slots;
            let (Some(backend), Some(frontend)) = (backend.as_mut(), frontend.as_mut()) else {
                debug!("supervise called without both children running");
                return;
            };
            tokio::select! {
                exit = frontend.wait_exit() => Wakeup::FrontendExit(exit),
                exit = backend.wait_exit() => Wakeup::BackendExit(exit),
                () = cancel.cancelled() => Wakeup::Cancelled,
            }
        };

        match wakeup {
            Wakeup::FrontendExit(exit) => {
                info!(status = %exit, "frontend exited, shutting the suite down");
                self.slots.frontend = None;
            }
            Wakeup::BackendExit(exit) => {
                warn!(status = %exit, "backend exited unexpectedly");
                self.slots.backend = None;
            }
            Wakeup::Cancelled => {
                info!("termination requested");
            }
        }
    }

    /// Idempotent teardown: frontend first (it is user-facing), then the
    /// backend. Each live child gets a graceful signal and the configured
    /// grace period before being force-killed, so the supervisor never
    /// hangs on a child that ignores the signal. Signaling an empty slot
    /// is a no-op; a second call returns immediately.
    pub async fn shutdown(&mut self) {
        if self.shutdown_started {
            debug!("shutdown already ran, ignoring");
            return;
        }
        self.shutdown_started = true;

        self.set_state(SupervisorState::ShuttingDown);
        self.cancel.cancel();

        let grace = self.config.grace_period();
        if let Some(mut frontend) = self.slots.frontend.take() {
            frontend.stop(grace).await;
        }
        if let Some(mut backend) = self.slots.backend.take() {
            backend.stop(grace).await;
        }

        self.set_state(SupervisorState::Terminated);
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "supervisor state");
        }
    }
}

/// Check that `path` exists and is a regular file.
fn verify_executable(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AppError::MissingBinary(format!(
            "{} (build the project first)",
            path.display()
        )))
    }
}

fn backend_spec(config: &LaunchConfig) -> ProcessSpec {
    ProcessSpec {
        role: ProcessRole::Backend,
        program: config.backend_binary(),
        args: Vec::new(),
        workdir: config.backend_workdir(),
    }
}

fn frontend_spec(config: &LaunchConfig) -> ProcessSpec {
    ProcessSpec {
        role: ProcessRole::Frontend,
        program: config.frontend_binary(),
        args: Vec::new(),
        workdir: config.frontend_workdir(),
    }
}
