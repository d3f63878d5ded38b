//! Fluent construction of a [`Scheduler`] from options, a sink and an
//! optional shared pool.

use std::sync::Arc;

use crate::config::SchedulerOptions;
use crate::core::{DiagnosticSink, Scheduler, SchedulerError, TracingSink, WorkerPool};

/// Builder for [`Scheduler`].
///
/// Defaults to [`SchedulerOptions::default`], a [`TracingSink`] and an owned
/// worker pool.
#[derive(Default)]
pub struct SchedulerBuilder {
    options: SchedulerOptions,
    sink: Option<Arc<dyn DiagnosticSink>>,
    pool: Option<Arc<WorkerPool>>,
}

impl SchedulerBuilder {
    /// Start from default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the options wholesale.
    #[must_use]
    pub fn options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    /// Adjust the options in place.
    #[must_use]
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut SchedulerOptions),
    {
        configure(&mut self.options);
        self
    }

    /// Use `sink` for diagnostics instead of tracing.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Dispatch onto a shared pool instead of creating one.
    #[must_use]
    pub fn pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Options as currently configured.
    #[must_use]
    pub const fn current_options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Build the scheduler.
    ///
    /// # Errors
    ///
    /// Propagates option validation and pool creation failures.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        match self.pool {
            Some(pool) => {
                self.options
                    .validate()
                    .map_err(SchedulerError::InvalidConfig)?;
                Scheduler::with_pool(&self.options, sink, pool)
            }
            None => Scheduler::new(self.options, sink),
        }
    }
}

/// Build a tracing-backed scheduler from default options adjusted by `configure`.
///
/// # Errors
///
/// Propagates option validation and pool creation failures.
pub fn build_scheduler<F>(configure: F) -> Result<Scheduler, SchedulerError>
where
    F: FnOnce(&mut SchedulerOptions),
{
    SchedulerBuilder::new().configure(configure).build()
}
