//! Tests for error types

use prometheus_background_work::core::{CancellationSource, SchedulerError, WorkError};

#[test]
fn test_invalid_argument_error() {
    let err = SchedulerError::InvalidArgument("work cannot be empty".to_string());
    assert_eq!(format!("{}", err), "invalid argument: work cannot be empty");
}

#[test]
fn test_invalid_state_error() {
    let err = SchedulerError::InvalidState("stopped".to_string());
    assert_eq!(format!("{}", err), "invalid state: stopped");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_internal_error() {
    let err = SchedulerError::Internal("spawn failed".to_string());
    assert_eq!(format!("{}", err), "internal error: spawn failed");
}

#[test]
fn test_work_error_from_token_check() {
    let source = CancellationSource::new();
    source.cancel().unwrap();

    let err: WorkError = source.token().check().unwrap_err().into();
    assert!(err.is_cancellation());
    assert!(err.to_string().contains(&source.id().to_string()));
}

#[test]
fn test_work_error_failed_keeps_context() {
    let io = std::io::Error::other("pipe closed");
    let err: WorkError = anyhow::Error::new(io).context("flushing report").into();
    assert!(!err.is_cancellation());
    assert!(format!("{err:?}").contains("pipe closed"));
}
