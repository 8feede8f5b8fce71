//! Fake backends and reporters shared by the integration tests.
use loadsim::prelude::*;
use loadsim::{CounterSnapshot, Reporter, ScheduleOutcome};
use std::collections::HashSet;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FakeError {
    #[error("request {0} rejected")]
    Rejected(u64),
    #[error("request {0} cancelled")]
    Cancelled(u64),
}

/// Backend that answers after a fixed delay and rejects a chosen set of request ids.
///
/// With a zero delay it answers immediately and never looks at the cancellation token.
pub struct FakeLoad {
    stats: StatsAggregator,
    delay: Duration,
    rejected: HashSet<u64>,
    seen: Mutex<Vec<u64>>,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
    finalized: AtomicU64,
}

impl FakeLoad {
    pub fn new(config: &LoadConfig) -> Self {
        Self {
            stats: StatsAggregator::new(config),
            delay: Duration::ZERO,
            rejected: HashSet::new(),
            seen: Mutex::new(vec![]),
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
            finalized: AtomicU64::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn rejecting(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.rejected.extend(ids);
        self
    }

    /// Request ids executed so far, sorted.
    pub fn seen(&self) -> Vec<u64> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort_unstable();
        seen
    }

    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::Relaxed)
    }

    pub fn finalized(&self) -> u64 {
        self.finalized.load(Ordering::Relaxed)
    }

    async fn respond(&self, cancel: &CancellationToken, request_id: u64) -> Result<u64, FakeError> {
        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FakeError::Cancelled(request_id)),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        if self.rejected.contains(&request_id) {
            Err(FakeError::Rejected(request_id))
        } else {
            Ok(request_id)
        }
    }
}

impl Load for FakeLoad {
    type Response = u64;
    type Error = FakeError;

    async fn execute(&self, cancel: &CancellationToken, request_id: u64) -> Result<(), FakeError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request_id);

        let res = self
            .stats
            .measure(self.respond(cancel, request_id), |r| self.success(r))
            .await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res.map(|_| ())
    }

    fn success(&self, _response: &u64) -> bool {
        true
    }

    fn calculate_stats(&self) -> Stats {
        self.finalized.fetch_add(1, Ordering::Relaxed);
        self.stats.finalize()
    }
}

/// Keeps every report as a line of text.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Reporter for RecordingReporter {
    fn start(&self, config: &LoadConfig) {
        self.push(format!("start {config}"));
    }

    fn progress(&self, elapsed: Duration, counters: CounterSnapshot) {
        self.push(format!("progress {}s {counters}", elapsed.as_secs()));
    }

    fn request_failed(&self, worker: &str, request_id: u64, error: &(dyn Error + 'static)) {
        self.push(format!("failed {worker} {request_id} {error}"));
    }

    fn scheduler_finished(&self, outcome: ScheduleOutcome, _elapsed: Duration) {
        self.push(format!(
            "scheduler scheduled={} cancelled={}",
            outcome.scheduled, outcome.cancelled
        ));
    }

    fn summary(&self, counters: CounterSnapshot, _elapsed: Duration) {
        self.push(format!("summary {counters}"));
    }
}
