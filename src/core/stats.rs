//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of a scheduler's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Total `emit` calls.
    pub emitted: u64,
    /// Actions the run loop invoked.
    pub executed: u64,
    /// Executed actions whose outcome was an error of any kind.
    pub failed: u64,
    /// Reply-less events discarded without running.
    pub dropped: u64,
    /// Events discarded because the scheduler stopped.
    pub abandoned: u64,
    /// Actions cut off by the per-action timeout.
    pub timed_out: u64,
    /// Actions that panicked.
    pub panicked: u64,
    /// Pairs waiting in the pending queue or the hand-off channel.
    pub pending: u64,
}

/// Internal counters (lock-free).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub emitted: AtomicU64,
    pub executed: AtomicU64,
    pub failed: AtomicU64,
    pub dropped: AtomicU64,
    pub abandoned: AtomicU64,
    pub timed_out: AtomicU64,
    pub panicked: AtomicU64,
}

impl SchedulerCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, pending: u64) -> SchedulerStats {
        SchedulerStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = SchedulerStats::default();
        assert_eq!(stats.emitted, 0);
        assert_eq!(stats.executed, 0);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = SchedulerCounters::default();
        counters.emitted.fetch_add(10, Ordering::Relaxed);
        SchedulerCounters::bump(&counters.executed);
        SchedulerCounters::bump(&counters.dropped);

        let stats = counters.snapshot(3);
        assert_eq!(stats.emitted, 10);
        assert_eq!(stats.executed, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.pending, 3);
    }
}
