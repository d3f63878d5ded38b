//! Error types for scheduler operations and background work.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced synchronously by the scheduler and its worker pool.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A caller supplied an absent or otherwise unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation is not allowed in the scheduler's current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal failure (worker thread could not be spawned, etc.).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Raised by a [`CancellationToken`](crate::core::CancellationToken) that has
/// observed its cancellation signal.
///
/// Carries the id of the source that fired, so the scheduler can tell its own
/// shutdown apart from cancellation raised by an unrelated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled (source {source_id})")]
pub struct Cancelled {
    source_id: Uuid,
}

impl Cancelled {
    pub(crate) const fn new(source_id: Uuid) -> Self {
        Self { source_id }
    }

    /// Id of the cancellation source that raised this signal.
    #[must_use]
    pub const fn source_id(&self) -> Uuid {
        self.source_id
    }
}

/// Failure reported by a unit of background work.
#[derive(Debug, Error)]
pub enum WorkError {
    /// The work observed a cancellation signal and exited.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// The work failed for a reason unrelated to cancellation.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl WorkError {
    /// Build a [`WorkError::Failed`] from a plain message.
    pub fn failed<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self::Failed(anyhow::Error::msg(message))
    }

    /// Whether this failure is cancellation-flavored.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Outcome of a unit of background work.
pub type WorkResult = Result<(), WorkError>;

/// Aggregate of failures raised by cancellation callbacks during a broadcast.
#[derive(Debug, Error)]
#[error("{} cancellation callback(s) failed", .failures.len())]
pub struct CancelError {
    failures: Vec<WorkError>,
}

impl CancelError {
    pub(crate) const fn new(failures: Vec<WorkError>) -> Self {
        Self { failures }
    }

    /// Individual callback failures, in registration order.
    #[must_use]
    pub fn failures(&self) -> &[WorkError] {
        &self.failures
    }

    /// Consume the aggregate and return its inner failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<WorkError> {
        self.failures
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
