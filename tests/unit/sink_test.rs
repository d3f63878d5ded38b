//! Tests for diagnostic sinks

use prometheus_background_work::core::{build_event, DiagnosticSink, InMemorySink, Severity};

#[test]
fn test_in_memory_sink() {
    let sink = InMemorySink::new(10);

    sink.info("Background work cancelled during shutdown.");
    sink.error("Error occurred in background work.", Some("timeout"));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].severity, Severity::Info);
    assert_eq!(events[1].severity, Severity::Error);
    assert_eq!(events[1].detail.as_deref(), Some("timeout"));
}

#[test]
fn test_sink_overflow() {
    let sink = InMemorySink::new(2);

    sink.info("evt1");
    sink.info("evt2");
    sink.error("evt3", None);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message, "evt2"); // First one popped
    assert_eq!(events[1].message, "evt3");
}

#[test]
fn test_sink_clear() {
    let sink = InMemorySink::default();
    sink.error("oops", None);
    sink.clear();
    assert_eq!(sink.count(Severity::Error), 0);
}

#[test]
fn test_sink_as_trait_object() {
    let sink: std::sync::Arc<dyn DiagnosticSink> = std::sync::Arc::new(InMemorySink::new(4));
    sink.info("through the trait");
}

#[test]
fn test_build_event() {
    let event = build_event(Severity::Error, "failed", Some("detail".to_string()));

    assert_eq!(event.severity, Severity::Error);
    assert_eq!(event.message, "failed");
    assert_eq!(event.detail, Some("detail".to_string()));
    assert!(event.created_at_ms > 0);
}
