//! Progress and summary reporting sinks.
//!
//! The runner never logs through a global; it hands every line to the [`Reporter`] it
//! was built with. [`TracingReporter`] is the default.
use crate::counters::CounterSnapshot;
use crate::scheduler::ScheduleOutcome;
use loadsim_core::{format_duration, LoadConfig};
use std::error::Error;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Sink for the textual reports of a run. Every method defaults to a no-op.
pub trait Reporter: Send + Sync {
    /// Run is about to start.
    fn start(&self, _config: &LoadConfig) {}

    /// Emitted each time a multiple of the per-second rate has been scheduled.
    fn progress(&self, _elapsed: Duration, _counters: CounterSnapshot) {}

    /// `offset` is how late the worker picked the request up relative to its fire time.
    fn request_started(&self, _worker: &str, _request_id: u64, _offset: Duration) {}

    fn request_succeeded(&self, _worker: &str, _request_id: u64, _elapsed: Duration) {}

    fn request_failed(&self, _worker: &str, _request_id: u64, _error: &(dyn Error + 'static)) {}

    fn scheduler_finished(&self, _outcome: ScheduleOutcome, _elapsed: Duration) {}

    fn summary(&self, _counters: CounterSnapshot, _elapsed: Duration) {}
}

/// Reports through `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn start(&self, config: &LoadConfig) {
        info!("[INIT LOAD CONFIG] {config}");
    }

    fn progress(&self, elapsed: Duration, counters: CounterSnapshot) {
        info!("[PROGRESS] elapsed={} {counters}", format_duration(elapsed));
    }

    fn request_started(&self, worker: &str, request_id: u64, offset: Duration) {
        debug!(
            "worker=[{worker}] [START] request_id={request_id} offset={}",
            format_duration(offset)
        );
    }

    fn request_succeeded(&self, worker: &str, request_id: u64, elapsed: Duration) {
        debug!(
            "worker=[{worker}] [DONE] request_id={request_id} elapsed={}",
            format_duration(elapsed)
        );
    }

    fn request_failed(&self, worker: &str, request_id: u64, error: &(dyn Error + 'static)) {
        error!("worker=[{worker}] [FAIL] request_id={request_id} err=[{error}]");
    }

    fn scheduler_finished(&self, outcome: ScheduleOutcome, elapsed: Duration) {
        if outcome.cancelled {
            info!(
                "[SCHEDULER] stop: cancelled after {} requests",
                outcome.scheduled
            );
        } else {
            info!(
                "[SCHEDULER] completed: scheduled={} requests in {}",
                outcome.scheduled,
                format_duration(elapsed)
            );
        }
    }

    fn summary(&self, counters: CounterSnapshot, elapsed: Duration) {
        info!("[SUMMARY] {counters} duration={}", format_duration(elapsed));
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
