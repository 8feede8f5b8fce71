#![cfg_attr(docsrs, feature(doc_cfg))]
//! A fixed-rate synthetic load generator.
//!
//! A [`Runner`] fires `rate * duration` operations at a [`Load`] on a fixed grid, through
//! a bounded queue feeding a fixed pool of workers, and hands back one finalized
//! [`Stats`] snapshot once everything has drained.

pub mod aggregator;
pub mod counters;
pub mod error;
pub mod load;
pub mod report;
pub mod runner;
pub mod scheduler;

mod worker;

pub use aggregator::StatsAggregator;
pub use counters::{CounterSnapshot, RunCounters};
pub use error::{BoxError, RunError};
pub use load::Load;
pub use loadsim_core::{ConfigError, LoadConfig, Stats, MAX_CONCURRENCY};
pub use report::{NullReporter, Reporter, TracingReporter};
pub use runner::{RunState, Runner};
pub use scheduler::jitter::{Jitter, NoJitter, UniformJitter};
pub use scheduler::{FireEvent, ScheduleOutcome};
pub use tokio_util::sync::CancellationToken;

pub mod prelude {
    pub use crate::aggregator::StatsAggregator;
    pub use crate::error::RunError;
    pub use crate::load::Load;
    pub use crate::runner::Runner;
    pub use loadsim_core::{LoadConfig, Stats};
    pub use tokio_util::sync::CancellationToken;
}
