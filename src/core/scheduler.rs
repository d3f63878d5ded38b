//! Fire-and-forget background work scheduler with bounded cooperative shutdown.
//!
//! Work is handed to a [`WorkerPool`] and runs with a [`CancellationToken`].
//! [`Scheduler::stop`] fires the token, then waits up to the configured
//! timeout for running work to finish. Work that ignores its token is never
//! killed; `stop` reports it and returns.
//!
//! # Race window
//!
//! `queue_work` checks for cancellation on the caller's thread, and the worker
//! checks again before running. Work accepted just before `stop` fires may
//! therefore be discarded without running. Accepted work is not guaranteed to
//! execute.
//!
//! The window is not only a race: when every worker is busy with work that
//! waits on its token, everything queued behind it is still in the channel at
//! `stop` and is discarded the same way.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::config::SchedulerOptions;
use crate::core::cancel::{CancellationSource, CancellationToken};
use crate::core::error::{SchedulerError, WorkError, WorkResult};
use crate::core::sink::DiagnosticSink;
use crate::core::worker_pool::WorkerPool;
use crate::util::panic::panic_message;

/// A boxed unit of background work.
pub type BoxedWork = Box<dyn FnOnce(CancellationToken) -> WorkResult + Send + 'static>;

/// Lifecycle phase of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Accepting work.
    Running,
    /// Cancellation fired, `stop` is waiting for running work.
    Stopping,
    /// `stop` has returned.
    Stopped,
}

/// Outcome of [`Scheduler::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Whether all running work finished before the timeout.
    pub quiesced: bool,
    /// Work items still running when `stop` returned.
    pub in_progress: usize,
    /// Time spent inside `stop`.
    pub elapsed: Duration,
}

/// Statistics about work handled by a scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Work items currently executing.
    pub in_progress: usize,
    /// Accepted work not yet picked up by a worker.
    pub queued: u64,
    /// Total work accepted by `queue_work`.
    pub submitted: u64,
    /// Work that returned `Ok`.
    pub completed: u64,
    /// Work that exited by observing this scheduler's cancellation.
    pub cancelled: u64,
    /// Work that failed or panicked.
    pub failed: u64,
    /// Accepted work dropped by the worker because shutdown had begun.
    pub discarded: u64,
}

/// Object-safe queueing surface handed to code that only enqueues work.
pub trait BackgroundQueue: Send + Sync {
    /// Queue possibly-absent work.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidArgument` if `work` is `None`
    /// - `SchedulerError::InvalidState` if shutdown has begun
    fn queue(&self, work: Option<BoxedWork>) -> Result<(), SchedulerError>;
}

struct State {
    in_progress: usize,
    phase: Phase,
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    submitted: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

/// State shared with every dispatched job.
struct Shared {
    state: Mutex<State>,
    /// Notified when `in_progress` drops to zero.
    idle: Condvar,
    cancel: CancellationSource,
    sink: Arc<dyn DiagnosticSink>,
    counters: Counters,
}

/// Decrements `in_progress` when dropped, whatever the work did.
struct InProgressGuard<'a> {
    shared: &'a Shared,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.in_progress -= 1;
        if state.in_progress == 0 {
            self.shared.idle.notify_all();
        }
    }
}

impl Shared {
    /// Runs on a worker thread.
    fn dispatch(&self, work: BoxedWork) {
        self.counters.queued.fetch_sub(1, Ordering::Relaxed);
        {
            let mut state = self.state.lock();
            if self.cancel.is_cancelled() {
                drop(state);
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                debug!("Discarding background work queued before shutdown began");
                return;
            }
            state.in_progress += 1;
        }

        let _guard = InProgressGuard { shared: self };
        self.run_work(work);
    }

    /// Outcome counters are bumped after the sink call, so a counter value
    /// implies the matching event was recorded.
    fn run_work(&self, work: BoxedWork) {
        let token = self.cancel.token();
        let own_id = token.id();

        match catch_unwind(AssertUnwindSafe(move || work(token))) {
            Ok(Ok(())) => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(WorkError::Cancelled(c))) if c.source_id() == own_id => {
                self.sink.info("Background work cancelled by its cancellation token.");
                self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(err)) => {
                self.sink.error(
                    "Error occurred in background work.",
                    Some(&format!("{err:?}")),
                );
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                self.sink.error(
                    "Background work panicked.",
                    Some(&panic_message(payload.as_ref())),
                );
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Fire-and-forget background work scheduler.
///
/// The pool has a fixed number of workers. Work blocked on its token (for
/// example in [`CancellationToken::wait`]) holds its worker until `stop`, so
/// items queued behind a fully blocked pool wait in the channel. When `stop`
/// fires, that whole backlog is discarded without running and counted in
/// [`SchedulerStats::discarded`].
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use prometheus_background_work::config::SchedulerOptions;
/// use prometheus_background_work::core::{Scheduler, TracingSink};
///
/// let scheduler = Scheduler::new(SchedulerOptions::new(), Arc::new(TracingSink))?;
/// scheduler.start()?;
/// scheduler.queue_work(|token| {
///     while !token.is_cancelled() {
///         // ...
///     }
///     Ok(())
/// })?;
/// scheduler.stop();
/// scheduler.dispose();
/// ```
pub struct Scheduler {
    shared: Arc<Shared>,
    pool: Arc<WorkerPool>,
    owns_pool: bool,
    timeout: Duration,
    disposed: AtomicBool,
}

impl Scheduler {
    /// Create a scheduler with its own worker pool built from `options.pool`.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the options are invalid
    /// - `SchedulerError::Internal` if worker threads cannot be spawned
    pub fn new(
        options: SchedulerOptions,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, SchedulerError> {
        options.validate().map_err(SchedulerError::InvalidConfig)?;
        let pool = Arc::new(WorkerPool::new(options.pool.clone())?);
        Ok(Self::assemble(&options, sink, pool, true))
    }

    /// Create a scheduler that dispatches onto a shared pool.
    ///
    /// The pool is left open when the scheduler is disposed.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidState` if the pool is already closed.
    pub fn with_pool(
        options: &SchedulerOptions,
        sink: Arc<dyn DiagnosticSink>,
        pool: Arc<WorkerPool>,
    ) -> Result<Self, SchedulerError> {
        if pool.is_closed() {
            return Err(SchedulerError::InvalidState(
                "worker pool has been shut down".into(),
            ));
        }
        Ok(Self::assemble(options, sink, pool, false))
    }

    fn assemble(
        options: &SchedulerOptions,
        sink: Arc<dyn DiagnosticSink>,
        pool: Arc<WorkerPool>,
        owns_pool: bool,
    ) -> Self {
        debug!(
            timeout_ms = options.timeout_ms,
            worker_count = pool.worker_count(),
            owns_pool,
            "Scheduler created"
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    in_progress: 0,
                    phase: Phase::Running,
                }),
                idle: Condvar::new(),
                cancel: CancellationSource::new(),
                sink,
                counters: Counters::default(),
            }),
            pool,
            owns_pool,
            timeout: options.timeout(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Validate that the scheduler can run.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidState` once the scheduler has been
    /// stopped; a stopped scheduler cannot be restarted.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.shared.cancel.is_cancelled() {
            return Err(SchedulerError::InvalidState(
                "the scheduler cannot be started again after it has stopped".into(),
            ));
        }
        debug!("Scheduler started");
        Ok(())
    }

    /// Queue work to run on the worker pool. Returns without waiting for it.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidState` if shutdown has begun or the pool is closed
    pub fn queue_work<F>(&self, work: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(CancellationToken) -> WorkResult + Send + 'static,
    {
        self.queue(Some(Box::new(work)))
    }

    /// Current number of executing work items.
    #[must_use]
    pub fn in_progress(&self) -> usize {
        self.shared.state.lock().in_progress
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Whether cancellation has been signaled.
    #[must_use]
    pub fn is_cancellation_requested(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Configured shutdown timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The pool this scheduler dispatches onto.
    #[must_use]
    pub const fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Get current scheduler statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let c = &self.shared.counters;
        SchedulerStats {
            in_progress: self.in_progress(),
            queued: c.queued.load(Ordering::Relaxed),
            submitted: c.submitted.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            cancelled: c.cancelled.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            discarded: c.discarded.load(Ordering::Relaxed),
        }
    }

    /// Signal cancellation and wait up to the timeout for running work.
    ///
    /// Never fails: a timeout is logged at error severity and reported in the
    /// returned [`ShutdownReport`]. Calling `stop` again does not re-signal;
    /// it only waits again.
    pub fn stop(&self) -> ShutdownReport {
        let started = Instant::now();
        self.cancel_work();

        let deadline = started + self.timeout;
        let mut state = self.shared.state.lock();
        while state.in_progress > 0 {
            if self.shared.idle.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        let in_progress = state.in_progress;
        state.phase = Phase::Stopped;
        drop(state);

        let report = ShutdownReport {
            quiesced: in_progress == 0,
            in_progress,
            elapsed: started.elapsed(),
        };
        if report.quiesced {
            info!(elapsed = ?report.elapsed, "Background work shut down");
        } else {
            self.shared.sink.error(
                "Unable to gracefully shut down all background work.",
                Some(&format!(
                    "{in_progress} work item(s) still running after {:?}",
                    self.timeout
                )),
            );
        }
        report
    }

    fn cancel_work(&self) {
        let pending = {
            let mut state = self.shared.state.lock();
            if state.phase == Phase::Running {
                state.phase = Phase::Stopping;
            }
            self.shared.cancel.signal()
        };

        if let Err(err) = pending.run() {
            for failure in err.into_failures() {
                if failure.is_cancellation() {
                    self.shared
                        .sink
                        .info("Background work cancelled during shutdown.");
                } else {
                    self.shared.sink.error(
                        "Error cancelling background work.",
                        Some(&format!("{failure:?}")),
                    );
                }
            }
        }
    }

    /// Release the cancellation source and, if owned, close the worker pool.
    ///
    /// Call after [`stop`](Self::stop) has returned. Idempotent; also run on
    /// drop. Work still running keeps a valid token.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.cancel.dispose();
        if self.owns_pool {
            self.pool.close();
        }
        debug!("Scheduler disposed");
    }
}

impl BackgroundQueue for Scheduler {
    fn queue(&self, work: Option<BoxedWork>) -> Result<(), SchedulerError> {
        let Some(work) = work else {
            return Err(SchedulerError::InvalidArgument(
                "work cannot be empty".into(),
            ));
        };

        if self.shared.cancel.is_cancelled() {
            return Err(SchedulerError::InvalidState(
                "cannot queue work after shutdown has begun".into(),
            ));
        }

        let shared = Arc::clone(&self.shared);
        shared.counters.queued.fetch_add(1, Ordering::Relaxed);
        if let Err(err) = self.pool.execute(Box::new(move || shared.dispatch(work))) {
            self.shared.counters.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(err);
        }
        self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}
