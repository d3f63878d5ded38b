//! Diagnostic sinks receiving the scheduler's informational and error reports.
//!
//! The scheduler only needs two severities from its environment. The default
//! [`TracingSink`] forwards them to `tracing`; [`InMemorySink`] keeps a bounded
//! buffer of events for tests and embedding hosts that inspect them.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Normal lifecycle information (including cooperative cancellation).
    Info,
    /// A failure that was caught and suppressed.
    Error,
}

/// Diagnostic event recorded by [`InMemorySink`].
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// Severity of the event.
    pub severity: Severity,
    /// Short message.
    pub message: String,
    /// Full failure detail, for error events.
    pub detail: Option<String>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Logger-like sink for the scheduler's two severities.
pub trait DiagnosticSink: Send + Sync {
    /// Record an informational message.
    fn info(&self, message: &str);
    /// Record an error with optional detail (error chain, panic message).
    fn error(&self, message: &str, detail: Option<&str>);
}

/// Sink forwarding to `tracing` under the `background_work` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "background_work", "{message}");
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        match detail {
            Some(detail) => tracing::error!(target: "background_work", detail, "{message}"),
            None => tracing::error!(target: "background_work", "{message}"),
        }
    }
}

/// In-memory sink with a bounded buffer; the oldest event is dropped first.
pub struct InMemorySink {
    events: Mutex<VecDeque<DiagnosticEvent>>,
    max_events: usize,
}

impl InMemorySink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of stored events with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    /// Whether any stored event of `severity` contains `needle` in its message.
    #[must_use]
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }

    /// Drop all stored events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: DiagnosticEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl DiagnosticSink for InMemorySink {
    fn info(&self, message: &str) {
        self.record(build_event(Severity::Info, message, None));
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        self.record(build_event(Severity::Error, message, detail.map(str::to_owned)));
    }
}

/// Helper to build a diagnostic event stamped with the current time.
pub fn build_event(
    severity: Severity,
    message: impl Into<String>,
    detail: Option<String>,
) -> DiagnosticEvent {
    DiagnosticEvent {
        severity,
        message: message.into(),
        detail,
        created_at_ms: now_ms(),
    }
}
