use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use esload_common::config::{FailurePolicy, LoadConfig};
use esload_common::{LoadError, Result};
use esload_core::{Coordinator, CoordinatorState};
use esload_submitter::mock::MockSubmitter;
use esload_submitter::{Document, DocumentSubmitter, IndexOutcome};

/// Panics on the `panic_on`-th call, succeeds otherwise.
struct PanickingSubmitter { calls: AtomicUsize, panic_on: usize }

impl DocumentSubmitter for PanickingSubmitter {
    async fn submit(&self, _document: &Document) -> Result<IndexOutcome> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::task::yield_now().await;
        if n == self.panic_on { panic!("submitter blew up on call {n}"); }
        Ok(IndexOutcome { status: "201 Created".into(), result: "created".into(), version: 1 })
    }
}

#[tokio::test]
async fn single_worker_runs_sequentially() {
    let mock = Arc::new(MockSubmitter::new());
    let report = Coordinator::new(mock.clone(), 1, 3).unwrap().run().await.unwrap();
    assert_eq!(mock.calls(), 3);
    assert_eq!(mock.peak_in_flight(), 1);
    assert_eq!(mock.in_flight(), 0);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.state, CoordinatorState::Terminated);
}

#[tokio::test]
async fn zero_quota_dispatches_nothing() {
    let mock = Arc::new(MockSubmitter::new());
    let report = Coordinator::new(mock.clone(), 5, 0).unwrap().run().await.unwrap();
    assert_eq!(mock.calls(), 0);
    assert_eq!(report.attempted, 0);
    assert_eq!(report.peak_in_flight, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failures_do_not_stop_the_pool() {
    let mock = Arc::new(MockSubmitter::new().fail_every(3));
    let report = Coordinator::new(mock.clone(), 10, 100).unwrap().run().await.unwrap();
    assert_eq!(mock.calls(), 100);
    assert_eq!(report.attempted, 100);
    assert_eq!(report.failed, 33);
    assert_eq!(report.succeeded, 67);
    assert_eq!(report.remaining, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_pool_size() {
    for (pool, quota) in [(1, 10), (3, 50), (8, 64), (16, 5)] {
        let mock = Arc::new(MockSubmitter::new().with_latency(Duration::from_millis(2)));
        let report = Coordinator::new(mock.clone(), pool, quota).unwrap().run().await.unwrap();
        assert_eq!(mock.calls() as u64, quota);
        assert!(mock.peak_in_flight() <= pool, "pool={pool} peak={}", mock.peak_in_flight());
        assert!(report.peak_in_flight <= pool);
        assert_eq!(report.peak_in_flight, pool.min(quota as usize));
    }
}

#[tokio::test]
async fn transport_failures_are_isolated_by_default() {
    let mock = Arc::new(MockSubmitter::new().transport_fail_every(4));
    let report = Coordinator::new(mock.clone(), 3, 100).unwrap().run().await.unwrap();
    assert_eq!(report.attempted, 100);
    assert_eq!(report.transport_failures, 25);
    assert_eq!(report.failed, 25);
}

#[tokio::test]
async fn abort_policy_stops_on_first_transport_failure() {
    let mock = Arc::new(MockSubmitter::new().transport_fail_every(4));
    let coordinator = Coordinator::new(mock.clone(), 3, 100).unwrap().with_failure_policy(FailurePolicy::Abort);
    let budget = coordinator.budget();
    let err = coordinator.run().await.unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert!(mock.calls() >= 4);
    assert!(mock.calls() < 100);
    assert_eq!(mock.in_flight(), 0);
    assert_eq!(budget.remaining(), 100 - mock.calls() as u64);
}

#[tokio::test]
async fn shutdown_drains_in_flight_workers() {
    let mock = Arc::new(MockSubmitter::new().with_latency(Duration::from_millis(10)));
    let coordinator = Coordinator::new(mock.clone(), 4, 10_000).unwrap();
    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
    });
    let report = coordinator.run().await.unwrap();
    assert!(report.interrupted);
    assert_eq!(report.attempted, mock.calls() as u64);
    assert!(report.attempted < 10_000);
    assert_eq!(report.remaining, 10_000 - report.attempted);
    assert_eq!(mock.in_flight(), 0);
}

#[tokio::test]
async fn cancelled_before_start_submits_nothing() {
    let mock = Arc::new(MockSubmitter::new());
    let coordinator = Coordinator::new(mock.clone(), 4, 10).unwrap();
    coordinator.shutdown_handle().cancel();
    let report = coordinator.run().await.unwrap();
    assert_eq!(mock.calls(), 0);
    assert_eq!(report.remaining, 10);
}

#[tokio::test]
async fn slow_submits_time_out_as_transport_failures() {
    let mock = Arc::new(MockSubmitter::new().with_latency(Duration::from_millis(500)));
    let report = Coordinator::new(mock.clone(), 2, 4)
        .unwrap()
        .with_submit_timeout(Some(Duration::from_millis(10)))
        .run()
        .await
        .unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(report.transport_failures, 4);
    assert_eq!(report.succeeded, 0);
    assert_eq!(mock.in_flight(), 0);
}

#[test]
fn zero_pool_size_is_rejected() {
    let mock = Arc::new(MockSubmitter::new());
    assert!(matches!(Coordinator::new(mock.clone(), 0, 10), Err(LoadError::Config(_))));
    let cfg = LoadConfig { pool_size: 0, ..LoadConfig::default() };
    assert!(Coordinator::from_config(mock, &cfg).is_err());
}

#[tokio::test]
async fn config_drives_pool_and_quota() {
    let cfg = LoadConfig { pool_size: 2, quota: 7, ..LoadConfig::default() };
    let mock = Arc::new(MockSubmitter::new());
    let report = Coordinator::from_config(mock.clone(), &cfg).unwrap().with_seed(1).run().await.unwrap();
    assert_eq!(mock.calls(), 7);
    assert!(mock.peak_in_flight() <= 2);
    assert_eq!(report.succeeded, 7);
}

#[tokio::test]
async fn abort_policy_fails_run_when_last_worker_fails() {
    let mock = Arc::new(MockSubmitter::new().transport_fail_every(4).with_latency(Duration::from_millis(20)));
    let coordinator = Coordinator::new(mock.clone(), 3, 4).unwrap().with_failure_policy(FailurePolicy::Abort);
    let budget = coordinator.budget();
    let err = coordinator.run().await.unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert_eq!(mock.calls(), 4);
    assert_eq!(budget.remaining(), 0);
}

#[tokio::test]
async fn abort_policy_fails_run_when_whole_quota_fits_in_ramp_up() {
    let mock = Arc::new(MockSubmitter::new().transport_fail_every(2).with_latency(Duration::from_millis(10)));
    let coordinator = Coordinator::new(mock.clone(), 8, 3).unwrap().with_failure_policy(FailurePolicy::Abort);
    let err = coordinator.run().await.unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert_eq!(mock.calls(), 3);
    assert_eq!(mock.in_flight(), 0);
}

#[tokio::test]
async fn interrupted_run_still_ends_terminated() {
    let mock = Arc::new(MockSubmitter::new().with_latency(Duration::from_millis(5)));
    let coordinator = Coordinator::new(mock, 2, 1_000).unwrap();
    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();
    });
    let report = coordinator.run().await.unwrap();
    assert!(report.interrupted);
    assert_eq!(report.state, CoordinatorState::Terminated);
}

#[tokio::test]
async fn panicking_worker_counts_as_completed_failure() {
    let submitter = Arc::new(PanickingSubmitter { calls: AtomicUsize::new(0), panic_on: 3 });
    let coordinator = Coordinator::new(submitter.clone(), 2, 6).unwrap();
    let budget = coordinator.budget();
    let report = coordinator.run().await.unwrap();
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 6);
    assert_eq!(report.attempted, 6);
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 5);
    assert_eq!(budget.remaining(), 0);
    assert_eq!(report.remaining, 0);
}
