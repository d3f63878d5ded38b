//! Tests for tokio hosting helpers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use prometheus_background_work::builders::build_scheduler;
use prometheus_background_work::core::{AppResult, SchedulerError};
use prometheus_background_work::runtime::{run_from_env, run_until, stop_async};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_until_stops_on_shutdown_signal() {
    let scheduler = Arc::new(build_scheduler(|o| o.timeout_ms = 2_000).unwrap());
    let finished = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&finished);
    scheduler
        .queue_work(move |token| {
            token.wait();
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let host = tokio::spawn(run_until(Arc::clone(&scheduler), async move {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let report = host.await.expect("host task").expect("run_until result");
    assert!(report.quiesced);
    assert!(finished.load(Ordering::SeqCst));
    assert!(scheduler.queue_work(|_| Ok(())).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_until_rejects_stopped_scheduler() {
    let scheduler = Arc::new(build_scheduler(|o| o.timeout_ms = 100).unwrap());
    stop_async(Arc::clone(&scheduler)).await.unwrap();

    let err = run_until(scheduler, async {}).await.unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidState(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_from_env_hosts_until_shutdown() -> AppResult<()> {
    let report = run_from_env(async {
        tokio::time::sleep(Duration::from_millis(20)).await;
    })
    .await?;

    assert!(report.quiesced);
    assert_eq!(report.in_progress, 0);
    Ok(())
}
