use crate::counters::RunCounters;
use crate::error::FirstError;
use crate::load::Load;
use crate::report::Reporter;
use crate::scheduler::FireEvent;
use async_channel::Receiver;
use std::sync::{Arc, OnceLock};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

/// State every worker of a run shares.
pub(crate) struct WorkerContext<L> {
    pub load: Arc<L>,
    pub cancel: CancellationToken,
    pub counters: Arc<RunCounters>,
    pub first_error: Arc<OnceLock<FirstError>>,
    pub reporter: Arc<dyn Reporter>,
}

impl<L> Clone for WorkerContext<L> {
    fn clone(&self) -> Self {
        Self {
            load: self.load.clone(),
            cancel: self.cancel.clone(),
            counters: self.counters.clone(),
            first_error: self.first_error.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

/// Fixed set of tasks consuming the dispatch queue.
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn<L: Load>(
        name: &str,
        concurrency: u32,
        queue: Receiver<FireEvent>,
        ctx: WorkerContext<L>,
    ) -> Self {
        let handles = (0..concurrency)
            .map(|i| {
                let worker_id = format!("{name}-{i}");
                tokio::spawn(worker(worker_id, queue.clone(), ctx.clone()).in_current_span())
            })
            .collect();

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Resolves once every worker has returned, which only happens after the queue is
    /// closed and empty. A worker that panicked is reported after the rest have joined.
    pub async fn join(mut self) -> Result<(), JoinError> {
        let mut failure = None;
        for handle in &mut self.handles {
            if let Err(err) = handle.await {
                error!("Worker task failed: {err}");
                failure.get_or_insert(err);
            }
        }
        failure.map_or(Ok(()), Err)
    }
}

impl Drop for WorkerPool {
    /// Workers never outlive their pool. Aborting an already finished task is a no-op.
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn worker<L: Load>(worker_id: String, queue: Receiver<FireEvent>, ctx: WorkerContext<L>) {
    // NOTE: `recv` only errors once the queue is closed *and* drained.
    while let Ok(event) = queue.recv().await {
        let started = Instant::now();
        let request_id = event.request_id;
        ctx.counters.inc_started();
        ctx.reporter.request_started(
            &worker_id,
            request_id,
            started.saturating_duration_since(event.target),
        );

        match ctx.load.execute(&ctx.cancel, request_id).await {
            Ok(()) => {
                ctx.reporter
                    .request_succeeded(&worker_id, request_id, started.elapsed());
            }
            Err(err) => {
                ctx.counters.inc_failed();
                ctx.reporter.request_failed(&worker_id, request_id, &err);
                let _ = ctx.first_error.set(FirstError {
                    request_id,
                    source: Box::new(err),
                });
            }
        }
        ctx.counters.inc_completed();
    }
    trace!("Worker {worker_id} stopped.");
}
