use std::sync::Arc;
use std::time::{Duration, Instant};

use esload_common::config::{FailurePolicy, LoadConfig};
use esload_common::{LoadError, Result};
use esload_submitter::{DocumentGenerator, DocumentSubmitter};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::budget::WorkBudget;
use crate::worker::{submit_one, Attempt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// Replacing every finished worker while budget lasts.
    #[default]
    Running,
    /// No more dispatches; waiting for in-flight workers.
    Draining,
    Terminated,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub transport_failures: u64,
    pub peak_in_flight: usize,
    /// Budget left when the run ended; zero unless the run was cut short.
    pub remaining: u64,
    /// The shutdown handle was triggered from outside.
    pub interrupted: bool,
    /// State the coordinator ended in; `Terminated` once `run` returns.
    pub state: CoordinatorState,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.attempted as f64 / secs } else { 0.0 }
    }
}

/// Keeps `pool_size` submissions in flight until the quota is spent.
///
/// The initial batch is dispatched before the loop starts; afterwards each joined
/// worker frees exactly one slot, so at most `pool_size` workers are ever live.
pub struct Coordinator<S> {
    submitter: Arc<S>,
    budget: Arc<WorkBudget>,
    pool_size: usize,
    submit_timeout: Option<Duration>,
    failure_policy: FailurePolicy,
    generator: DocumentGenerator,
    shutdown: CancellationToken,
    state: CoordinatorState,
}

impl<S: DocumentSubmitter + 'static> Coordinator<S> {
    pub fn new(submitter: Arc<S>, pool_size: usize, quota: u64) -> Result<Self> {
        if pool_size == 0 {
            return Err(LoadError::Config("pool_size must be at least 1".into()));
        }
        Ok(Self {
            submitter,
            budget: Arc::new(WorkBudget::new(quota)),
            pool_size,
            submit_timeout: None,
            failure_policy: FailurePolicy::default(),
            generator: DocumentGenerator::new(None),
            shutdown: CancellationToken::new(),
            state: CoordinatorState::Running,
        })
    }

    pub fn from_config(submitter: Arc<S>, cfg: &LoadConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::new(submitter, cfg.pool_size, cfg.quota)?
            .with_submit_timeout(cfg.submit_timeout())
            .with_failure_policy(cfg.failure_policy))
    }

    pub fn with_submit_timeout(mut self, timeout: Option<Duration>) -> Self { self.submit_timeout = timeout; self }
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self { self.failure_policy = policy; self }
    pub fn with_seed(mut self, seed: u64) -> Self { self.generator = DocumentGenerator::new(Some(seed)); self }

    /// Cancelling the returned token stops replenishment; in-flight workers still finish.
    pub fn shutdown_handle(&self) -> CancellationToken { self.shutdown.clone() }

    pub fn budget(&self) -> Arc<WorkBudget> { self.budget.clone() }

    pub async fn run(mut self) -> Result<RunReport> {
        tracing::info!(target: "coordinator", "Coordinator starting: pool_size={} quota={}", self.pool_size, self.budget.remaining());
        let start = Instant::now();
        let mut tasks: JoinSet<Attempt> = JoinSet::new();
        let mut report = RunReport::default();
        let mut abort: Option<LoadError> = None;

        for _ in 0..self.pool_size {
            if !self.dispatch(&mut tasks) { break; }
        }
        report.peak_in_flight = tasks.len();
        if tasks.is_empty() { self.transition(CoordinatorState::Draining); }

        while !tasks.is_empty() {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled(), if self.state == CoordinatorState::Running => {
                    tracing::info!(target: "coordinator", "shutdown requested, draining {} workers", tasks.len());
                    report.interrupted = true;
                    self.transition(CoordinatorState::Draining);
                }
                Some(joined) = tasks.join_next() => {
                    if let Some(err) = self.record(&mut report, joined) {
                        if abort.is_none() {
                            tracing::error!(target: "coordinator", "aborting run after transport failure: {}", err);
                            if self.state == CoordinatorState::Running {
                                self.shutdown.cancel();
                                self.transition(CoordinatorState::Draining);
                            }
                            abort = Some(err);
                        }
                    }
                    if self.state == CoordinatorState::Running {
                        tracing::debug!(target: "coordinator", "calling one more worker");
                        if !self.dispatch(&mut tasks) { self.transition(CoordinatorState::Draining); }
                        report.peak_in_flight = report.peak_in_flight.max(tasks.len());
                    }
                }
            }
        }

        self.transition(CoordinatorState::Terminated);
        report.state = self.state;
        report.remaining = self.budget.remaining();
        report.elapsed = start.elapsed();
        tracing::info!(
            target: "coordinator",
            "run finished: attempted={} succeeded={} failed={} elapsed={:?}",
            report.attempted, report.succeeded, report.failed, report.elapsed
        );
        match abort {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Claims one unit of budget and spawns a worker for it.
    fn dispatch(&mut self, tasks: &mut JoinSet<Attempt>) -> bool {
        if self.shutdown.is_cancelled() || !self.budget.try_claim() { return false; }
        let document = self.generator.generate();
        let submitter = self.submitter.clone();
        let budget = self.budget.clone();
        let timeout = self.submit_timeout;
        tasks.spawn(async move {
            let attempt = submit_one(submitter.as_ref(), document, timeout).await;
            budget.complete();
            attempt
        });
        true
    }

    /// Folds one finished worker into the report. Returns the error when the failure
    /// policy says the run must stop.
    fn record(&self, report: &mut RunReport, joined: core::result::Result<Attempt, JoinError>) -> Option<LoadError> {
        report.attempted += 1;
        let attempt = match joined {
            Ok(attempt) => attempt,
            Err(e) => {
                // the worker died before reaching its own completion
                tracing::error!(target: "coordinator", "worker failed to complete: {}", e);
                self.budget.complete();
                report.failed += 1;
                return None;
            }
        };
        match attempt.outcome {
            Ok(_) => { report.succeeded += 1; None }
            Err(err) => {
                report.failed += 1;
                if !err.is_transport() { return None; }
                report.transport_failures += 1;
                (self.failure_policy == FailurePolicy::Abort).then_some(err)
            }
        }
    }

    fn transition(&mut self, next: CoordinatorState) {
        if self.state != next {
            tracing::debug!(target: "coordinator", "{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
