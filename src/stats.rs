//! Thread-safe run statistics.
//!
//! One writer (the results listener) and one concurrent reader (the
//! reporter) share a `RunStats`. All counters live behind a single
//! read/write lock so a snapshot never observes a torn update.

use std::sync::RwLock;
use std::time::Duration;

use crate::outcome::Outcome;

#[derive(Debug, Default)]
struct Counters {
    successful: u64,
    failed: u64,
    compute_time: Duration,
}

/// Mutable shared counter set for a run. Counters only ever increase.
#[derive(Debug, Default)]
pub struct RunStats {
    inner: RwLock<Counters>,
}

/// An immutable point-in-time view of the statistics.
///
/// `successful + failed == runs` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub runs: u64,
    pub successful: u64,
    pub failed: u64,
    pub compute_time: Duration,
}

impl Snapshot {
    /// Success percentage, or `None` before the first run completes.
    pub fn percent_successful(&self) -> Option<f64> {
        if self.runs == 0 {
            return None;
        }
        Some(self.successful as f64 / self.runs as f64 * 100.0)
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome: bumps the successful or failed counter and adds
    /// the outcome's duration to cumulative compute time.
    pub fn record(&self, outcome: &Outcome) {
        let mut counters = self.inner.write().unwrap();
        if outcome.is_success() {
            counters.successful += 1;
        } else {
            counters.failed += 1;
        }
        counters.compute_time += outcome.duration;
    }

    /// Take a consistent snapshot of all counters.
    pub fn snapshot(&self) -> Snapshot {
        let counters = self.inner.read().unwrap();
        Snapshot {
            runs: counters.successful + counters.failed,
            successful: counters.successful,
            failed: counters.failed,
            compute_time: counters.compute_time,
        }
    }
}
