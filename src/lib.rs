//! # Prometheus Background Work
//!
//! A process-wide, fire-and-forget background work scheduler with bounded,
//! cooperative shutdown.
//!
//! Request-servicing code hands closures to the [`Scheduler`](core::Scheduler),
//! which runs them on a shared pool of worker threads and returns immediately.
//! On shutdown the scheduler fires a one-shot cancellation signal, waits up to
//! a configured timeout for running work to finish, and then gives up and
//! reports the stragglers instead of hanging the process.
//!
//! ## Key Features
//!
//! - **Non-blocking enqueue**: all bookkeeping happens on the worker thread
//! - **Cooperative cancellation**: every work item receives a
//!   [`CancellationToken`](core::CancellationToken) it can poll, block on, or
//!   register callbacks with
//! - **Bounded shutdown**: `stop` never waits longer than the configured timeout
//! - **Failure isolation**: errors and panics in work are logged, never propagated
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_background_work::builders::SchedulerBuilder;
//! use prometheus_background_work::core::WorkError;
//!
//! let scheduler = SchedulerBuilder::new()
//!     .configure(|o| o.timeout_ms = 2_000)
//!     .build()?;
//! scheduler.start()?;
//!
//! scheduler.queue_work(|token| {
//!     loop {
//!         token.check()?;
//!         if token.wait_timeout(Duration::from_millis(100)) {
//!             return Ok(());
//!         }
//!         // periodic work...
//!     }
//! })?;
//!
//! let report = scheduler.stop();
//! assert!(report.quiesced);
//! scheduler.dispose();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: scheduler, cancellation, worker pool and diagnostic sinks.
pub mod core;
/// Configuration models for the scheduler and its pool.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Tokio hosting adapters.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
