//! Error types shared across the launcher.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all launcher failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// A required executable does not exist on disk. Fatal before spawn;
    /// a missing build artifact cannot self-heal, so there is no retry.
    MissingBinary(String),
    /// The OS refused to spawn a child process.
    Spawn(String),
    /// Readiness polling was aborted (cancellation or backend death).
    /// Individual probe failures are transient and never surface here.
    Health(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::MissingBinary(msg) => write!(f, "missing binary: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Health(msg) => write!(f, "health: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
