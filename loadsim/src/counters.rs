use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Progress counters shared by the scheduler and every worker of a run.
///
/// All four only ever increase.
#[derive(Debug, Default)]
pub struct RunCounters {
    scheduled: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inc_scheduled(&self) -> u64 {
        self.scheduled.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn inc_started(&self) -> u64 {
        self.started.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn inc_completed(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn inc_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub scheduled: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
}

impl fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scheduled={} started={} completed={} failures={}",
            self.scheduled, self.started, self.completed, self.failed
        )
    }
}
