//! Tokio hosting: start a scheduler, wait for the host's shutdown signal,
//! then stop it without blocking the async runtime.

use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::info;

use crate::builders::SchedulerBuilder;
use crate::config::SchedulerOptions;
use crate::core::{AppResult, Scheduler, SchedulerError, ShutdownReport};

/// Run [`Scheduler::stop`] on tokio's blocking pool.
///
/// # Errors
///
/// Returns `SchedulerError::Internal` if the blocking task could not complete.
pub async fn stop_async(scheduler: Arc<Scheduler>) -> Result<ShutdownReport, SchedulerError> {
    tokio::task::spawn_blocking(move || scheduler.stop())
        .await
        .map_err(|e| SchedulerError::Internal(format!("stop task failed: {e}")))
}

/// Start `scheduler`, await `shutdown`, then stop it.
///
/// # Errors
///
/// - `SchedulerError::InvalidState` if the scheduler was already stopped
/// - `SchedulerError::Internal` if the stop task could not complete
pub async fn run_until<F>(
    scheduler: Arc<Scheduler>,
    shutdown: F,
) -> Result<ShutdownReport, SchedulerError>
where
    F: Future<Output = ()> + Send,
{
    scheduler.start()?;
    info!("Background work scheduler hosted; waiting for shutdown");
    shutdown.await;
    info!("Host shutting down background work");
    stop_async(scheduler).await
}

/// Build a scheduler from `BACKGROUND_WORK_*` environment variables (and a
/// `.env` file, if present), then host it with [`run_until`].
///
/// # Errors
///
/// Fails if the environment holds invalid options, the scheduler cannot be
/// built, or hosting fails.
pub async fn run_from_env<F>(shutdown: F) -> AppResult<ShutdownReport>
where
    F: Future<Output = ()> + Send,
{
    let options = SchedulerOptions::from_env()
        .map_err(|e| anyhow!(e))
        .context("loading background work options from the environment")?;
    let scheduler = SchedulerBuilder::new()
        .options(options)
        .build()
        .context("building background work scheduler")?;
    let report = run_until(Arc::new(scheduler), shutdown)
        .await
        .context("hosting background work scheduler")?;
    Ok(report)
}
