//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Smallest accepted worker thread stack size.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
    /// How long `WorkerPool::shutdown` waits for each worker to exit.
    pub join_timeout_ms: u64,
}

impl WorkerPoolConfig {
    /// Defaults: one worker per CPU, 2 MiB stacks, 2 second join timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            thread_stack_size: 2 * 1024 * 1024,
            join_timeout_ms: 2_000,
        }
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the per-worker join timeout used by `shutdown`.
    #[must_use]
    pub const fn with_join_timeout_ms(mut self, join_timeout_ms: u64) -> Self {
        self.join_timeout_ms = join_timeout_ms;
        self
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!(
                "thread_stack_size must be at least {MIN_STACK_SIZE} bytes"
            ));
        }
        Ok(())
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
