//! Launcher configuration parsing, validation, and path resolution.
//!
//! All fields default to the values the launcher has always shipped with,
//! so the binary runs with no config file present. An optional
//! `launch.toml` overrides any of them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Backend service settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    /// Backend executable, resolved against the project root when relative.
    #[serde(default = "default_backend_binary")]
    pub binary: PathBuf,
    /// Port the backend serves its HTTP API on.
    #[serde(default = "default_backend_port")]
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            binary: default_backend_binary(),
            port: default_backend_port(),
        }
    }
}

/// Frontend application settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FrontendConfig {
    /// Frontend executable, resolved against the project root when relative.
    #[serde(default = "default_frontend_binary")]
    pub binary: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            binary: default_frontend_binary(),
        }
    }
}

/// Timing knobs for readiness polling and shutdown (milliseconds).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimingConfig {
    /// Delay before the first health probe after the backend spawns.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Interval between health probes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-probe timeout; a hung endpoint counts as a failed probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Time a child gets to exit after SIGTERM before it is force-killed.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

fn default_backend_binary() -> PathBuf {
    PathBuf::from("md2docx-server")
}

fn default_backend_port() -> u16 {
    8080
}

fn default_frontend_binary() -> PathBuf {
    PathBuf::from("qt-frontend/build_md2docx_app/build/md2docx_app.app/Contents/MacOS/md2docx_app")
}

fn default_startup_delay_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_grace_period_ms() -> u64 {
    2000
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

/// Launcher configuration parsed from `launch.toml`. Immutable after load.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LaunchConfig {
    /// Directory the suite is installed in; relative binary paths resolve
    /// against it and the backend runs with it as working directory.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    /// Backend service settings.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Frontend application settings.
    #[serde(default)]
    pub frontend: FrontendConfig,
    /// Polling and shutdown timing.
    #[serde(default)]
    pub timing: TimingConfig,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            backend: BackendConfig::default(),
            frontend: FrontendConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl LaunchConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the default configuration rooted at `root` and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `root` does not exist.
    pub fn for_root(root: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self {
            project_root: root.into(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Absolute path of the backend executable.
    #[must_use]
    pub fn backend_binary(&self) -> PathBuf {
        self.resolve(&self.backend.binary)
    }

    /// Absolute path of the frontend executable.
    #[must_use]
    pub fn frontend_binary(&self) -> PathBuf {
        self.resolve(&self.frontend.binary)
    }

    /// Working directory for the backend process.
    #[must_use]
    pub fn backend_workdir(&self) -> PathBuf {
        self.project_root.clone()
    }

    /// Working directory for the frontend process: the directory its
    /// binary lives in, matching how the desktop app expects to start.
    #[must_use]
    pub fn frontend_workdir(&self) -> PathBuf {
        self.frontend_binary()
            .parent()
            .map_or_else(|| self.project_root.clone(), Path::to_path_buf)
    }

    /// Health endpoint probed during readiness polling.
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("http://127.0.0.1:{}/api/health", self.backend.port)
    }

    /// Delay before the first health probe.
    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.timing.startup_delay_ms)
    }

    /// Interval between health probes.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.timing.poll_interval_ms)
    }

    /// Per-probe request timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.probe_timeout_ms)
    }

    /// Grace window between SIGTERM and force kill.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.timing.grace_period_ms)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    fn validate(&mut self) -> Result<()> {
        if self.backend.port == 0 {
            return Err(AppError::Config("backend.port must be nonzero".into()));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "timing.poll_interval_ms must be nonzero".into(),
            ));
        }
        if self.timing.probe_timeout_ms == 0 {
            return Err(AppError::Config(
                "timing.probe_timeout_ms must be nonzero".into(),
            ));
        }
        if self.timing.grace_period_ms == 0 {
            return Err(AppError::Config(
                "timing.grace_period_ms must be nonzero".into(),
            ));
        }

        let canonical_root = self
            .project_root
            .canonicalize()
            .map_err(|err| AppError::Config(format!("project_root invalid: {err}")))?;
        self.project_root = canonical_root;

        Ok(())
    }
}
