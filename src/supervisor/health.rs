//! Backend readiness polling.
//!
//! Probes the backend's health endpoint until a `200` is observed. Any
//! probe failure (connection refused, non-200 status, per-probe timeout)
//! is retried after the poll interval with no retry cap and no overall
//! deadline: the loop ends only on success or cancellation. A probe
//! already in flight when the token fires completes harmlessly; no
//! further probe is issued after it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{AppError, Result};

/// Poll `url` until it answers with status `200`.
///
/// Waits `startup_delay` before the first probe, then probes every
/// `poll_interval`. Each probe is bounded by `probe_timeout`.
///
/// # Errors
///
/// Returns `AppError::Health` only when `cancel` fires or the HTTP client
/// cannot be constructed, never because of probe failures.
pub async fn wait_until_ready(
    url: &str,
    startup_delay: Duration,
    poll_interval: Duration,
    probe_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(probe_timeout)
        .build()
        .map_err(|err| AppError::Health(format!("failed to build health client: {err}")))?;

    sleep_unless_cancelled(startup_delay, cancel).await?;

    loop {
        match client.get(url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                return Ok(());
            }
            Ok(response) => {
                debug!(status = %response.status(), "health probe returned non-200, retrying");
            }
            Err(err) => {
                debug!(%err, "health probe failed, retrying");
            }
        }
        sleep_unless_cancelled(poll_interval, cancel).await?;
    }
}

/// Sleep for `duration`, aborting early if `cancel` fires.
async fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;

        () = cancel.cancelled() => {
            debug!("readiness polling cancelled");
            Err(AppError::Health("readiness polling cancelled".into()))
        }
        () = tokio::time::sleep(duration) => Ok(()),
    }
}
