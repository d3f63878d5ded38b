//! Core scheduling: the scheduler, its cancellation signal, worker pool and sinks.

pub mod cancel;
pub mod error;
pub mod scheduler;
pub mod sink;
pub mod worker_pool;

pub use cancel::{CancellationSource, CancellationToken, PendingCallbacks};
pub use error::{AppResult, CancelError, Cancelled, SchedulerError, WorkError, WorkResult};
pub use scheduler::{BackgroundQueue, BoxedWork, Phase, Scheduler, SchedulerStats, ShutdownReport};
pub use sink::{build_event, DiagnosticEvent, DiagnosticSink, InMemorySink, Severity, TracingSink};
pub use worker_pool::{Job, PoolStats, WorkerPool};
