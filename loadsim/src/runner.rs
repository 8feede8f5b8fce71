//! Orchestration of a single load run.
use crate::counters::RunCounters;
use crate::error::RunError;
use crate::load::Load;
use crate::report::{Reporter, TracingReporter};
use crate::scheduler::jitter::{Jitter, NoJitter};
use crate::scheduler::Scheduler;
use crate::worker::{WorkerContext, WorkerPool};
use loadsim_core::{LoadConfig, Stats};
use std::sync::{Arc, OnceLock};
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Lifecycle of a [`Runner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Validating,
    /// Configuration was invalid; nothing was scheduled.
    Rejected,
    /// Scheduler and workers are both active.
    Running,
    /// Scheduler has stopped; in-flight and queued work is finishing.
    Draining,
    Finalized,
}

/// Drives one [`Load`] at a fixed rate for a fixed duration.
///
/// A runner executes exactly one scenario: [`Runner::run`] consumes it.
///
/// # Example
/// ```no_run
/// # use loadsim::prelude::*;
/// # use std::sync::Arc;
/// # async fn example<L: Load>(load: Arc<L>) -> Result<(), RunError> {
/// let (tx, rx) = tokio::sync::oneshot::channel();
/// Runner::new(load, LoadConfig::new("checkout", 50, 60, 10))
///     .run(CancellationToken::new(), tx)
///     .await?;
/// let stats = rx.await.expect("stats are sent once the run finalizes");
/// println!("{stats}");
/// # Ok(())
/// # }
/// ```
pub struct Runner<L> {
    load: Arc<L>,
    config: LoadConfig,
    reporter: Arc<dyn Reporter>,
    jitter: Box<dyn Jitter>,
    counters: Arc<RunCounters>,
    state: watch::Sender<RunState>,
}

impl<L: Load> Runner<L> {
    pub fn new(load: Arc<L>, config: LoadConfig) -> Self {
        let (state, _) = watch::channel(RunState::Created);
        Self {
            load,
            config,
            reporter: Arc::new(TracingReporter),
            jitter: Box::new(NoJitter),
            counters: Arc::new(RunCounters::new()),
            state,
        }
    }

    /// Send progress and summary reports somewhere other than `tracing`.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Perturb every fire time with `jitter`. Without this the schedule is exact.
    pub fn with_jitter(mut self, jitter: impl Jitter + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Live counters; they keep their final values after the run.
    pub fn counters(&self) -> Arc<RunCounters> {
        self.counters.clone()
    }

    /// Validate, schedule, drain, then finalize.
    ///
    /// The finalized [`Stats`] go out on `stats_tx` once every worker has stopped, even
    /// when the run ends in an execution error or cancellation. When validation fails,
    /// `stats_tx` is dropped without a value.
    ///
    /// Failed requests never abort the run; the first one observed is returned once the
    /// run is over.
    ///
    /// Dropping the returned future before it resolves stops the scheduler and aborts
    /// every worker; no stats are sent in that case.
    #[instrument(name = "runner", skip_all, fields(name = self.config.name))]
    pub async fn run(
        self,
        cancel: CancellationToken,
        stats_tx: oneshot::Sender<Stats>,
    ) -> Result<(), RunError> {
        let Self {
            load,
            config,
            reporter,
            jitter,
            counters,
            state,
        } = self;

        state.send_replace(RunState::Validating);
        if let Err(err) = config.validate() {
            error!("Rejecting load configuration {config}: {err}");
            state.send_replace(RunState::Rejected);
            return Err(err.into());
        }
        reporter.start(&config);

        // Dropping the run future cancels the scheduler and every in-flight request.
        let cancel = cancel.child_token();
        let _cancel_on_drop = cancel.clone().drop_guard();

        // NOTE: The queue capacity bounds how far the scheduler can run ahead of the
        // workers.
        let (queue_tx, queue_rx) = async_channel::bounded(config.concurrency as usize);
        let first_error = Arc::new(OnceLock::new());
        let start = Instant::now();

        let pool = WorkerPool::spawn(
            &config.name,
            config.concurrency,
            queue_rx,
            WorkerContext {
                load: load.clone(),
                cancel: cancel.clone(),
                counters: counters.clone(),
                first_error: first_error.clone(),
                reporter: reporter.clone(),
            },
        );
        debug!("Spawned {} workers.", pool.len());

        let scheduler = Scheduler::new(config.clone(), jitter, counters.clone(), reporter.clone());
        let scheduler = tokio::spawn(scheduler.run(start, queue_tx, cancel).in_current_span());
        state.send_replace(RunState::Running);

        let schedule = scheduler.await;
        state.send_replace(RunState::Draining);
        let drained = pool.join().await;

        reporter.summary(counters.snapshot(), start.elapsed());

        let stats = load.calculate_stats();
        state.send_replace(RunState::Finalized);
        info!("Load run {} finished: {stats}", config.name);
        if stats_tx.send(stats).is_err() {
            warn!("Stats receiver dropped before the run finished.");
        }

        drained?;
        let schedule = schedule?;

        // Every worker has joined, so this is the last reference.
        if let Some(err) = Arc::into_inner(first_error).and_then(OnceLock::into_inner) {
            return Err(err.into());
        }

        if schedule.cancelled {
            return Err(RunError::Cancelled {
                scheduled: schedule.scheduled,
                expected: config.expected_requests(),
            });
        }

        Ok(())
    }
}
