pub mod jitter;

use crate::counters::RunCounters;
use crate::report::Reporter;
use async_channel::Sender;
use jitter::Jitter;
use loadsim_core::LoadConfig;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// One scheduled dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireEvent {
    /// 1-based position in dispatch order.
    pub request_id: u64,
    /// Instant the event was meant to fire at.
    pub target: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub scheduled: u64,
    pub cancelled: bool,
}

/// Emits `rate * duration` fire events on a fixed grid anchored at the run's start.
pub(crate) struct Scheduler {
    config: LoadConfig,
    jitter: Box<dyn Jitter>,
    counters: Arc<RunCounters>,
    reporter: Arc<dyn Reporter>,
}

impl Scheduler {
    pub fn new(
        config: LoadConfig,
        jitter: Box<dyn Jitter>,
        counters: Arc<RunCounters>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            jitter,
            counters,
            reporter,
        }
    }

    /// Run until every event has been handed to `queue` or `cancel` fires.
    ///
    /// `queue` is closed on return either way, which lets the workers drain what is
    /// already buffered and then stop.
    #[instrument(name = "scheduler", skip_all, fields(name = self.config.name))]
    pub async fn run(
        mut self,
        start: Instant,
        queue: Sender<FireEvent>,
        cancel: CancellationToken,
    ) -> ScheduleOutcome {
        let total = self.config.expected_requests();
        let rate = self.config.rate_per_sec as u64;

        let mut n = 0;
        let cancelled = loop {
            if n >= total {
                break false;
            }

            // NOTE: Always offset from `start`, never from the previous fire, so a late
            // send does not push back every event after it.
            let target = self.jitter.perturb(start + self.config.fire_offset(n));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break true,
                _ = sleep_until(target) => {}
            }

            let event = FireEvent {
                request_id: n + 1,
                target,
            };
            // Blocks while the queue is full.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break true,
                res = queue.send(event) => {
                    if res.is_err() {
                        error!("Dispatch queue closed with no workers left. Stopping scheduler.");
                        break false;
                    }
                }
            }

            n += 1;
            self.counters.inc_scheduled();
            if n % rate == 0 {
                self.reporter
                    .progress(start.elapsed(), self.counters.snapshot());
            }
        };

        queue.close();

        let outcome = ScheduleOutcome {
            scheduled: n,
            cancelled,
        };
        self.reporter.scheduler_finished(outcome, start.elapsed());
        outcome
    }
}
