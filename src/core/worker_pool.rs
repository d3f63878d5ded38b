//! Worker pool with dedicated OS threads fed by an unbounded job channel.
//!
//! The scheduler never spawns a thread per work item; it hands boxed jobs to
//! this pool. A pool can be shared between several schedulers through an
//! `Arc<WorkerPool>`.
//!
//! # Design
//!
//! - **No polling**: workers block on channel `recv`
//! - **Clean shutdown**: dropping the sender naturally unblocks idle workers
//! - **Panic isolation**: a panicking job never takes its worker thread down

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::error::SchedulerError;
use crate::util::panic::panic_message;

/// A unit of execution handed to a worker thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Jobs waiting in the channel.
    pub queued_jobs: u64,
    /// Jobs currently executing.
    pub active_jobs: u64,
    /// Jobs that ran to completion (including those that panicked).
    pub executed_jobs: u64,
    /// Jobs that panicked.
    pub panicked_jobs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
struct PoolCounters {
    queued_jobs: AtomicU64,
    active_jobs: AtomicU64,
    executed_jobs: AtomicU64,
    panicked_jobs: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            queued_jobs: self.queued_jobs.load(Ordering::Relaxed),
            active_jobs: self.active_jobs.load(Ordering::Relaxed),
            executed_jobs: self.executed_jobs.load(Ordering::Relaxed),
            panicked_jobs: self.panicked_jobs.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-size pool of named worker threads.
pub struct WorkerPool {
    config: WorkerPoolConfig,
    /// Job sender. `None` once the pool has been closed.
    job_tx: Mutex<Option<Sender<Job>>>,
    counters: Arc<PoolCounters>,
    closed: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool and spawn `config.worker_count` threads.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the configuration is invalid
    /// - `SchedulerError::Internal` if a worker thread cannot be spawned
    pub fn new(config: WorkerPoolConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (job_tx, job_rx) = unbounded::<Job>();
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                job_rx.clone(),
                Arc::clone(&counters),
                config.thread_stack_size,
            )
            .map_err(|e| {
                SchedulerError::Internal(format!("failed to spawn worker {worker_id}: {e}"))
            })?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            stack_size = config.thread_stack_size,
            "WorkerPool initialized"
        );

        Ok(Self {
            config,
            job_tx: Mutex::new(Some(job_tx)),
            counters,
            closed: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Hand a job to the pool. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidState` if the pool has been closed.
    pub fn execute(&self, job: Job) -> Result<(), SchedulerError> {
        let job_tx = self.job_tx.lock();
        let Some(job_tx) = job_tx.as_ref() else {
            return Err(SchedulerError::InvalidState(
                "worker pool has been shut down".into(),
            ));
        };

        self.counters.queued_jobs.fetch_add(1, Ordering::Relaxed);
        if job_tx.send(job).is_err() {
            self.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
            return Err(SchedulerError::InvalidState(
                "worker pool has been shut down".into(),
            ));
        }
        Ok(())
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Whether the pool stopped accepting jobs.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Stop accepting jobs without waiting for the workers.
    ///
    /// Idle workers exit once the queued jobs are drained; busy workers finish
    /// their current job first. Returns `false` if the pool was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.job_tx.lock().take();
        debug!("WorkerPool closed");
        true
    }

    /// Close the pool and join every worker, waiting at most
    /// `config.join_timeout_ms` per worker.
    ///
    /// Workers that don't exit within the timeout are detached.
    pub fn shutdown(&self) {
        self.close();
        let join_timeout = Duration::from_millis(self.config.join_timeout_ms);

        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        let worker_count = workers.len();

        for (idx, worker) in workers.into_iter().enumerate() {
            // Join on a helper thread so a stuck worker cannot hang shutdown.
            let (tx, rx) = crossbeam_channel::bounded(1);
            let joiner = thread::spawn(move || {
                let _ = tx.send(worker.join().is_ok());
            });

            match rx.recv_timeout(join_timeout) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }
            let _ = joiner.join();
        }

        info!(worker_count = worker_count, "WorkerPool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Never join here; a straggling job must not hang the dropping thread.
        if self.close() {
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

fn spawn_worker(
    worker_id: usize,
    job_rx: Receiver<Job>,
    counters: Arc<PoolCounters>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("bgw-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            // recv() fails once every sender is dropped and the channel is drained.
            while let Ok(job) = job_rx.recv() {
                counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                counters.active_jobs.fetch_add(1, Ordering::Relaxed);

                if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                    counters.panicked_jobs.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        worker_id = worker_id,
                        panic = %panic_message(payload.as_ref()),
                        "Job panicked on worker thread"
                    );
                }

                counters.active_jobs.fetch_sub(1, Ordering::Relaxed);
                counters.executed_jobs.fetch_add(1, Ordering::Relaxed);
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}
