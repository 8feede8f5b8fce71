use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::Instant;

/// Perturbation applied to each absolute fire time before the scheduler sleeps on it.
///
/// The scheduler always computes targets from the run's start, so a strategy only ever
/// moves one event and never shifts the ones after it.
pub trait Jitter: Send {
    fn perturb(&mut self, target: Instant) -> Instant;
}

/// Fire exactly on the nominal grid. Used unless another strategy is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn perturb(&mut self, target: Instant) -> Instant {
        target
    }
}

/// Moves each fire time by a uniformly random offset in `[-max, +max]`.
#[derive(Debug, Clone)]
pub struct UniformJitter {
    max: Duration,
    rng: SmallRng,
}

impl UniformJitter {
    pub fn new(max: Duration) -> Self {
        Self {
            max,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(max: Duration, seed: u64) -> Self {
        Self {
            max,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Jitter for UniformJitter {
    fn perturb(&mut self, target: Instant) -> Instant {
        if self.max.is_zero() {
            return target;
        }

        let max_nanos = self.max.as_nanos().min(u64::MAX as u128) as u64;
        let offset = Duration::from_nanos(self.rng.gen_range(0..=max_nanos));
        if self.rng.gen_bool(0.5) {
            target.checked_sub(offset).unwrap_or(target)
        } else {
            target + offset
        }
    }
}
