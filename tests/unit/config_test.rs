//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_background_work::config::{SchedulerOptions, WorkerPoolConfig, DEFAULT_TIMEOUT_MS};

#[test]
fn test_default_options() {
    let options = SchedulerOptions::default();
    assert_eq!(options.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(options.timeout(), Duration::from_secs(5));
    assert!(options.pool.worker_count >= 1);
    assert!(options.validate().is_ok());
}

#[test]
fn test_with_timeout() {
    let options = SchedulerOptions::new().with_timeout(Duration::from_millis(1500));
    assert_eq!(options.timeout_ms, 1500);
}

#[test]
fn test_zero_timeout_allowed() {
    let options = SchedulerOptions::new().with_timeout(Duration::ZERO);
    assert!(options.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_worker_count() {
    let invalid = WorkerPoolConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());

    let options = SchedulerOptions::new().with_pool(invalid);
    let err = options.validate().unwrap_err();
    assert!(err.starts_with("pool invalid"));
}

#[test]
fn test_pool_config_invalid_stack_size() {
    let invalid = WorkerPoolConfig::new().with_thread_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_options_from_json() {
    let json = r#"{
        "timeout_ms": 2000,
        "pool": {
            "worker_count": 3,
            "thread_stack_size": 1048576,
            "join_timeout_ms": 500
        }
    }"#;

    let options = SchedulerOptions::from_json_str(json).unwrap();
    assert_eq!(options.timeout(), Duration::from_secs(2));
    assert_eq!(options.pool.worker_count, 3);
    assert_eq!(options.pool.join_timeout_ms, 500);
}

#[test]
fn test_options_from_partial_json() {
    let options = SchedulerOptions::from_json_str(r#"{ "timeout_ms": 750 }"#).unwrap();
    assert_eq!(options.timeout_ms, 750);
    assert_eq!(options.pool, WorkerPoolConfig::default());
}

#[test]
fn test_options_from_invalid_json() {
    assert!(SchedulerOptions::from_json_str("{ not json").is_err());
    assert!(SchedulerOptions::from_json_str(r#"{ "pool": { "worker_count": 0 } }"#).is_err());
}

#[test]
fn test_options_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("BACKGROUND_WORK_TIMEOUT_MS", "2500"),
        ("BACKGROUND_WORK_WORKERS", " 6 "),
    ]
    .into_iter()
    .collect();

    let options =
        SchedulerOptions::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(options.timeout_ms, 2500);
    assert_eq!(options.pool.worker_count, 6);
    assert_eq!(options.pool.thread_stack_size, WorkerPoolConfig::default().thread_stack_size);
}

#[test]
fn test_options_from_lookup_rejects_garbage() {
    let err = SchedulerOptions::from_lookup(|key| {
        (key == "BACKGROUND_WORK_TIMEOUT_MS").then(|| "soon".to_string())
    })
    .unwrap_err();
    assert!(err.contains("BACKGROUND_WORK_TIMEOUT_MS"));
}
