//! Worker pool: deadlines, caller cancellation, and isolation.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use netgate::application::WorkerPool;
use netgate::domain::{
    CommandRequest, DriverError, GatewayConfig, GatewayError, OperationClass, ResultEnvelope,
    Status,
};

use crate::mocks::{Behavior, MockDirectory, fast_config, gateway};

#[tokio::test]
async fn submit_returns_job_result() {
    let pool = WorkerPool::new(2, 4, Duration::from_secs(1));

    let envelope = pool
        .submit("r1", |_cancel| async { ResultEnvelope::completed_raw("r1", "ok") })
        .await
        .unwrap();

    assert_eq!(envelope.status(), Status::CompletedRaw);
}

#[tokio::test]
async fn deadline_cancels_job_and_waits_for_its_cleanup() {
    let pool = WorkerPool::new(1, 1, Duration::from_millis(50));
    let cleaned_up = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&cleaned_up);

    let envelope = pool
        .submit("r1", move |cancel| async move {
            cancel.cancelled().await;
            flag.fetch_add(1, Ordering::SeqCst);
            ResultEnvelope::error("r1", GatewayError::Cancelled)
        })
        .await
        .unwrap();

    assert_eq!(envelope.error_kind(), Some(&GatewayError::Cancelled));
    assert_eq!(cleaned_up.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_requester_cancels_job() {
    let pool = Arc::new(WorkerPool::new(1, 1, Duration::from_secs(30)));
    let observed = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&observed);

    let waiting = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            pool.submit("r1", move |cancel| async move {
                cancel.cancelled().await;
                flag.fetch_add(1, Ordering::SeqCst);
                ResultEnvelope::error("r1", GatewayError::Cancelled)
            })
            .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    waiting.abort();

    let start = Instant::now();
    while observed.load(Ordering::SeqCst) == 0 {
        assert!(start.elapsed() < Duration::from_secs(5), "job never saw cancellation");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let next = pool
        .submit("r2", |_cancel| async { ResultEnvelope::completed_raw("r2", "ok") })
        .await
        .unwrap();
    assert_eq!(next.device(), "r2");
}

#[tokio::test]
async fn panicking_driver_becomes_error_and_worker_survives() {
    let directory = MockDirectory::with_device(
        "buggy",
        Behavior {
            panic_on_execute: true,
            ..Behavior::default()
        },
    )
    .and("r1", Behavior::raw("ok"));
    let config = GatewayConfig {
        workers: 1,
        ..fast_config()
    };
    let (gateway, recorder) = gateway(directory, &config);

    let envelope = gateway
        .dispatch(CommandRequest::new(OperationClass::Show, "buggy", "show version"))
        .await;
    assert_eq!(envelope.status(), Status::Error);
    assert_eq!(envelope.error_kind().unwrap().kind(), "dispatch_error");
    assert_eq!(recorder.connects(), 1);
    assert_eq!(recorder.disconnects(), 1);
    assert!(!recorder.is_connected());

    let envelope = gateway
        .dispatch(CommandRequest::new(OperationClass::Show, "r1", "show version"))
        .await;
    assert_eq!(envelope.status(), Status::CompletedRaw);
}

#[tokio::test]
async fn slow_device_does_not_block_other_devices() {
    let directory = MockDirectory::with_device(
        "slow",
        Behavior {
            execute_delay: Duration::from_millis(400),
            ..Behavior::default()
        },
    )
    .and("fast", Behavior::raw("fast output"));
    let (gateway, _) = gateway(directory, &fast_config());
    let gateway = Arc::new(gateway);

    let slow = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            gateway
                .dispatch(CommandRequest::new(OperationClass::Show, "slow", "show tech"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let start = Instant::now();
    let fast = gateway
        .dispatch(CommandRequest::new(OperationClass::Show, "fast", "show clock"))
        .await;
    assert_eq!(fast.status(), Status::CompletedRaw);
    assert!(start.elapsed() < Duration::from_millis(300));

    assert_eq!(slow.await.unwrap().status(), Status::CompletedRaw);
}

#[tokio::test]
async fn operation_deadline_releases_session() {
    let directory = MockDirectory::with_device(
        "r1",
        Behavior {
            execute_delay: Duration::from_secs(10),
            ..Behavior::default()
        },
    );
    let config = GatewayConfig {
        operation_timeout: Duration::from_millis(100),
        ..fast_config()
    };
    let (gateway, recorder) = gateway(directory, &config);

    let envelope = gateway
        .dispatch(CommandRequest::new(OperationClass::Show, "r1", "show tech"))
        .await;

    assert_eq!(envelope.error_kind(), Some(&GatewayError::Cancelled));
    assert_eq!(recorder.connects(), 1);
    assert_eq!(recorder.disconnects(), 1);
    assert!(!recorder.is_connected());
}

#[tokio::test]
async fn raw_execution_failure_releases_session() {
    let directory = MockDirectory::with_device(
        "r1",
        Behavior {
            execute: Err(DriverError::Command("timed out waiting for prompt".to_string())),
            ..Behavior::default()
        },
    );
    let (gateway, recorder) = gateway(directory, &fast_config());

    let envelope = gateway
        .dispatch(CommandRequest::new(OperationClass::Show, "r1", "show version"))
        .await;

    assert_eq!(envelope.status(), Status::Error);
    assert_eq!(recorder.executed(), vec!["show version"]);
    assert_eq!(recorder.disconnects(), 1);
    assert!(!recorder.is_connected());
}

#[tokio::test]
async fn configure_failure_releases_session() {
    let directory = MockDirectory::with_device(
        "r1",
        Behavior {
            configure: Err(DriverError::Command("% Invalid input detected".to_string())),
            ..Behavior::default()
        },
    );
    let (gateway, recorder) = gateway(directory, &fast_config());

    let envelope = gateway
        .dispatch(CommandRequest::new(
            OperationClass::Config,
            "r1",
            "interface Loopback0\n description mgmt",
        ))
        .await;

    assert_eq!(envelope.status(), Status::Error);
    assert_eq!(recorder.configured().len(), 1);
    assert_eq!(recorder.disconnects(), 1);
    assert!(!recorder.is_connected());
}

#[tokio::test]
async fn abandoned_request_releases_session() {
    let directory = MockDirectory::with_device(
        "r1",
        Behavior {
            execute_delay: Duration::from_secs(10),
            ..Behavior::default()
        },
    );
    let config = GatewayConfig {
        operation_timeout: Duration::from_secs(30),
        ..fast_config()
    };
    let (gateway, recorder) = gateway(directory, &config);
    let gateway = Arc::new(gateway);

    let waiting = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            gateway
                .dispatch(CommandRequest::new(OperationClass::Show, "r1", "show tech"))
                .await
        })
    };
    let start = Instant::now();
    while recorder.executed().is_empty() {
        assert!(start.elapsed() < Duration::from_secs(5), "command never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    waiting.abort();

    while recorder.disconnects() == 0 {
        assert!(start.elapsed() < Duration::from_secs(5), "session never released");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(recorder.connects(), 1);
    assert_eq!(recorder.disconnects(), 1);
    assert!(!recorder.is_connected());
}
