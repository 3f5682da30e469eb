#![forbid(unsafe_code)]

//! `md2docx-launcher`: desktop application launcher binary.
//!
//! Verifies the build artifacts, starts the conversion backend, waits
//! until its health endpoint answers, starts the Qt frontend, and tears
//! everything down when the frontend quits or a termination signal
//! arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use md2docx_launcher::supervisor::Supervisor;
use md2docx_launcher::{AppError, LaunchConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "md2docx-launcher", about = "md2docx desktop application launcher", version, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the project root the suite is installed in.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("md2docx launcher bootstrap");

    // The supervisor is single-threaded and event-driven; one thread is
    // plenty for two child processes and a poll timer.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => LaunchConfig::load_from_path(path)?,
        None => LaunchConfig::for_root(".")?,
    };

    if let Some(root) = args.root {
        config.project_root = root
            .canonicalize()
            .map_err(|err| AppError::Config(format!("invalid project root override: {err}")))?;
    }
    let config = Arc::new(config);

    info!(
        root = %config.project_root.display(),
        port = config.backend.port,
        "launching md2docx application suite"
    );

    // ── Run the supervisor ──────────────────────────────
    let mut supervisor = Supervisor::with_os_spawner(Arc::clone(&config));

    let cancel = supervisor.cancel_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        cancel.cancel();
    });

    match supervisor.run().await {
        Ok(()) => {
            info!("md2docx launcher shut down");
            Ok(())
        }
        Err(err) => {
            error!(%err, "startup failed");
            Err(err)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
