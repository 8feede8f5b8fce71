use loadsim_core::{LoadConfig, Stats};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

// Upper bound on samples reserved up front; longer runs grow the vector as usual.
const MAX_PREALLOCATED_SAMPLES: u64 = 1 << 24;

/// Thread-safe accumulator of per-request outcomes.
///
/// Backends own one of these and delegate to it: [`StatsAggregator::record`] (or
/// [`StatsAggregator::measure`]) once per executed request, and
/// [`StatsAggregator::finalize`] once the run has drained.
#[derive(Debug)]
pub struct StatsAggregator {
    name: String,
    total: AtomicU64,
    success: AtomicU64,
    fail: AtomicU64,
    response_times: Mutex<Vec<Duration>>,
}

impl StatsAggregator {
    pub fn new(config: &LoadConfig) -> Self {
        let capacity = config.expected_requests().min(MAX_PREALLOCATED_SAMPLES) as usize;
        Self {
            name: config.name.clone(),
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            fail: AtomicU64::new(0),
            response_times: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Record the outcome of one request.
    pub fn record(&self, response_time: Duration, ok: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if ok {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fail.fetch_add(1, Ordering::Relaxed);
        }

        #[cfg(feature = "metrics")]
        {
            metrics::histogram!("loadsim_latency", "scenario" => self.name.clone())
                .record(response_time.as_secs_f64());
            if ok {
                metrics::counter!("loadsim_success", "scenario" => self.name.clone()).increment(1);
            } else {
                metrics::counter!("loadsim_error", "scenario" => self.name.clone()).increment(1);
            }
        }

        self.response_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response_time);
    }

    /// Time `fut` and record its outcome exactly once.
    ///
    /// `Ok` responses count as successes when `is_success` accepts them; errors always
    /// count as failures. The future's output is handed back untouched.
    pub async fn measure<F, R, E, S>(&self, fut: F, is_success: S) -> Result<R, E>
    where
        F: Future<Output = Result<R, E>>,
        S: FnOnce(&R) -> bool,
    {
        let start = Instant::now();
        let res = fut.await;
        let elapsed = start.elapsed();

        let ok = match &res {
            Ok(response) => is_success(response),
            Err(_) => false,
        };
        self.record(elapsed, ok);
        res
    }

    /// Number of outcomes recorded so far.
    pub fn count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Sort a copy of the recorded response times and compute the summary. The sample
    /// lock is held only while copying.
    ///
    /// Must only be called once every worker has stopped. Calling it again over the same
    /// samples returns the same [`Stats`].
    pub fn finalize(&self) -> Stats {
        let total = self.total.load(Ordering::Relaxed);
        let success = self.success.load(Ordering::Relaxed);
        let fail = self.fail.load(Ordering::Relaxed);

        let mut sorted = self
            .response_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sorted.sort_unstable();

        let stats = Stats::from_sorted(total, success, fail, &sorted);
        debug!("Finalized {} samples for {}: {stats}", sorted.len(), self.name);
        stats
    }
}
