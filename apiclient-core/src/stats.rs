use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

/// Usage counters shared by a client and its HTTP fetcher.
///
/// Query outcomes are updated under one lock so a snapshot always satisfies
/// `total_requests == successful + failed`, even with concurrent callers.
#[derive(Debug, Default)]
pub struct Stats {
    outcomes: Mutex<Outcomes>,
    http_attempts: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Outcomes {
    total: u64,
    successful: u64,
    failed: u64,
}

/// Read-only view of the counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub http_attempts: u64,
    pub success_rate: f64,
    pub cache_size: usize,
}

impl Stats {
    pub fn record_attempt(&self) {
        self.http_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        let mut outcomes = self.outcomes();
        outcomes.total += 1;
        outcomes.successful += 1;
    }

    pub fn record_failure(&self) {
        let mut outcomes = self.outcomes();
        outcomes.total += 1;
        outcomes.failed += 1;
    }

    pub fn snapshot(&self, cache_size: usize) -> Statistics {
        let outcomes = *self.outcomes();

        Statistics {
            total_requests: outcomes.total,
            successful_requests: outcomes.successful,
            failed_requests: outcomes.failed,
            http_attempts: self.http_attempts.load(Ordering::Relaxed),
            success_rate: success_rate(outcomes.successful, outcomes.total),
            cache_size,
        }
    }

    fn outcomes(&self) -> MutexGuard<'_, Outcomes> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn success_rate(successful: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successful as f64 / total as f64 * 100.0
}
