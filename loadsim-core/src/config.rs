use crate::constants::{MAX_CONCURRENCY, NANOS_PER_SEC};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Configuration of a single load run.
///
/// Built once per scenario and handed to a runner by value. Bounds are checked by
/// [`LoadConfig::validate`] before any scheduling takes place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadConfig {
    pub name: String,
    /// Target operations per second.
    pub rate_per_sec: u32,
    /// Length of the run in seconds.
    pub duration_secs: u32,
    /// Number of workers executing operations concurrently.
    pub concurrency: u32,
    /// Upper bound for random perturbation of each fire time. Only takes effect when a
    /// jitter strategy is plugged into the runner.
    pub jitter: Option<Duration>,
}

impl LoadConfig {
    pub fn new(name: &str, rate_per_sec: u32, duration_secs: u32, concurrency: u32) -> Self {
        Self {
            name: name.to_string(),
            rate_per_sec,
            duration_secs,
            concurrency,
            jitter: None,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_per_sec == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::ConcurrencyTooHigh(self.concurrency));
        }
        Ok(())
    }

    /// Total number of operations a complete run dispatches.
    pub fn expected_requests(&self) -> u64 {
        self.rate_per_sec as u64 * self.duration_secs as u64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs as u64)
    }

    /// Nominal gap between two consecutive fire events.
    pub fn interval(&self) -> Duration {
        self.fire_offset(1)
    }

    /// Offset of the `n`-th fire event from the start of the run.
    ///
    /// Computed from `n` directly rather than by summing intervals, so a rate that does
    /// not divide a second evenly never accumulates rounding error.
    pub fn fire_offset(&self, n: u64) -> Duration {
        let nanos = (n as u128 * NANOS_PER_SEC)
            .checked_div(self.rate_per_sec as u128)
            .unwrap_or(0);
        Duration::from_nanos(nanos as u64)
    }
}

impl fmt::Display for LoadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={} rps={} duration={}s concurrency={} jitter={}",
            self.name,
            self.rate_per_sec,
            self.duration_secs,
            self.concurrency,
            humantime::format_duration(self.jitter.unwrap_or_default()),
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate per second must be > 0")]
    ZeroRate,

    #[error("duration must be > 0")]
    ZeroDuration,

    #[error("concurrency must be > 0")]
    ZeroConcurrency,

    #[error("concurrency {0} is unreasonably high (max {MAX_CONCURRENCY})")]
    ConcurrencyTooHigh(u32),
}
