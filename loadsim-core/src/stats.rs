use crate::constants::{P90, P95, P99};
use crate::format::format_duration;
use std::fmt;
use std::time::Duration;

/// Finalized statistics of a load run.
///
/// Produced once, after every outcome has been recorded, and never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    pub min: Duration,
    pub avg: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl Stats {
    /// Counts only; every latency field is zero. Used when nothing was recorded.
    pub fn totals(total: u64, success: u64, fail: u64) -> Self {
        Self {
            total,
            success,
            fail,
            ..Default::default()
        }
    }

    /// Compute the summary from response times already sorted ascending.
    pub fn from_sorted(total: u64, success: u64, fail: u64, sorted: &[Duration]) -> Self {
        let n = sorted.len();
        if n == 0 {
            return Self::totals(total, success, fail);
        }

        let sum: u128 = sorted.iter().map(Duration::as_nanos).sum();
        let avg = Duration::from_nanos((sum / n as u128) as u64);

        Self {
            total,
            success,
            fail,
            min: sorted[0],
            avg,
            p50: sorted[n / 2],
            p90: percentile(sorted, P90),
            p95: percentile(sorted, P95),
            p99: percentile(sorted, P99),
            max: sorted[n - 1],
        }
    }
}

/// Index based percentile lookup, `sorted[floor(n * quantile)]`, no interpolation.
///
/// The index is clamped to the last sample so small sample counts and `quantile >= 1.0`
/// never read out of range.
pub fn percentile(sorted: &[Duration], quantile: f64) -> Duration {
    match sorted.len() {
        0 => Duration::ZERO,
        n => {
            let idx = (n as f64 * quantile) as usize;
            sorted[idx.min(n - 1)]
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} success={} fail={} min={} avg={} p50={} p90={} p95={} p99={} max={}",
            self.total,
            self.success,
            self.fail,
            format_duration(self.min),
            format_duration(self.avg),
            format_duration(self.p50),
            format_duration(self.p90),
            format_duration(self.p95),
            format_duration(self.p99),
            format_duration(self.max),
        )
    }
}
