//! A simulated backend for driving the runner without any real service behind it.
use loadsim::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, SkewNormal};
use std::time::Duration;
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const STATUS_OK: u16 = 200;
const STATUS_UNAVAILABLE: u16 = 503;

#[derive(Debug, Error)]
pub enum SimulatedError {
    #[error("Request {0} cancelled before a response arrived.")]
    Cancelled(u64),

    #[error("Request {request_id} failed with status {status}.")]
    Status { request_id: u64, status: u16 },

    #[error("Invalid latency distribution: {0}")]
    Latency(String),

    #[error("Error rate must be within [0, 1], got {0}.")]
    ErrorRate(f64),
}

enum Latency {
    Fixed(Duration),
    Skewed(SkewNormal<f64>),
}

impl Latency {
    fn sample(&self) -> Duration {
        match self {
            Latency::Fixed(latency) => *latency,
            Latency::Skewed(distr) => {
                let secs = distr.sample(&mut rand::thread_rng()).max(0.);
                Duration::from_secs_f64(secs)
            }
        }
    }
}

/// Backend whose responses take a right-skewed random latency and fail at a fixed rate.
pub struct SimulatedLoad {
    stats: StatsAggregator,
    latency: Latency,
    error_rate: f64,
}

impl SimulatedLoad {
    pub fn new(
        config: &LoadConfig,
        mean: Duration,
        std: Duration,
        error_rate: f64,
    ) -> Result<Self, SimulatedError> {
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(SimulatedError::ErrorRate(error_rate));
        }

        let latency = if std.is_zero() {
            Latency::Fixed(mean)
        } else {
            let distr = SkewNormal::new(mean.as_secs_f64(), std.as_secs_f64(), 20.)
                .map_err(|err| SimulatedError::Latency(err.to_string()))?;
            Latency::Skewed(distr)
        };

        Ok(Self {
            stats: StatsAggregator::new(config),
            latency,
            error_rate,
        })
    }

    fn sample_status(&self) -> u16 {
        if rand::thread_rng().gen_bool(self.error_rate) {
            STATUS_UNAVAILABLE
        } else {
            STATUS_OK
        }
    }
}

impl Load for SimulatedLoad {
    type Response = u16;
    type Error = SimulatedError;

    async fn execute(&self, cancel: &CancellationToken, request_id: u64) -> Result<(), SimulatedError> {
        let latency = self.latency.sample();
        let status = self
            .stats
            .measure(
                async {
                    tokio::select! {
                        _ = cancel.cancelled() => Err(SimulatedError::Cancelled(request_id)),
                        _ = tokio::time::sleep(latency) => Ok(self.sample_status()),
                    }
                },
                |status| self.success(status),
            )
            .await?;

        if !self.success(&status) {
            return Err(SimulatedError::Status { request_id, status });
        }
        trace!("Request {request_id} answered {status} after {latency:?}");
        Ok(())
    }

    fn success(&self, status: &u16) -> bool {
        (200..300).contains(status)
    }

    fn calculate_stats(&self) -> Stats {
        self.stats.finalize()
    }
}
