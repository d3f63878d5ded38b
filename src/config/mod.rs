//! Configuration models for the scheduler and its worker pool.

pub mod options;
pub mod pool;

pub use options::{SchedulerOptions, DEFAULT_TIMEOUT_MS};
pub use pool::WorkerPoolConfig;
