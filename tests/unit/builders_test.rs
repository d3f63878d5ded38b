//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use prometheus_background_work::builders::{build_scheduler, SchedulerBuilder};
use prometheus_background_work::config::{SchedulerOptions, WorkerPoolConfig};
use prometheus_background_work::core::{InMemorySink, SchedulerError, WorkerPool};

#[test]
fn test_builder_defaults() {
    let builder = SchedulerBuilder::new();
    assert_eq!(builder.current_options(), &SchedulerOptions::default());

    let scheduler = builder.build().unwrap();
    assert_eq!(scheduler.timeout(), Duration::from_secs(5));
    assert!(scheduler.start().is_ok());
}

#[test]
fn test_builder_configure() {
    let scheduler = SchedulerBuilder::new()
        .configure(|o| {
            o.timeout_ms = 250;
            o.pool.worker_count = 2;
        })
        .sink(Arc::new(InMemorySink::default()))
        .build()
        .unwrap();

    assert_eq!(scheduler.timeout(), Duration::from_millis(250));
    assert_eq!(scheduler.pool().worker_count(), 2);
}

#[test]
fn test_builder_rejects_invalid_options() {
    let err = build_scheduler(|o| o.pool.worker_count = 0).err().unwrap();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[test]
fn test_builder_with_shared_pool() {
    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::new().with_worker_count(1)).unwrap());

    let scheduler = SchedulerBuilder::new()
        .options(SchedulerOptions::new().with_timeout(Duration::from_millis(100)))
        .pool(Arc::clone(&pool))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(scheduler.pool(), &pool));
    scheduler.dispose();
    assert!(!pool.is_closed());
}
