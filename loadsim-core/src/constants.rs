/// Hard cap on the number of concurrent workers a single run may spawn.
pub const MAX_CONCURRENCY: u32 = 100;

/// Percentiles reported in [`crate::Stats`].
pub const P90: f64 = 0.90;
pub const P95: f64 = 0.95;
pub const P99: f64 = 0.99;

pub(crate) const NANOS_PER_SEC: u128 = 1_000_000_000;
