//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by a dispatcher and all of its workers
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total dispatch calls
    dispatches: AtomicU64,
    /// Dispatch calls that returned a success
    successes: AtomicU64,
    /// Dispatch calls that returned AllFailed
    all_failed: AtomicU64,
    /// Dispatch calls that returned TimedOut
    timed_out: AtomicU64,
    /// Replica calls started
    attempts: AtomicU64,
    /// Backoff waits entered after a transient failure
    retries: AtomicU64,
    /// Not-found answers received
    not_found: AtomicU64,
    /// Outcomes that arrived after the collector returned
    discarded_outcomes: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn inc_successes(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn all_failed(&self) -> u64 {
        self.all_failed.load(Ordering::Relaxed)
    }

    pub fn inc_all_failed(&self) {
        self.all_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    pub fn inc_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }

    pub fn inc_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded_outcomes(&self) -> u64 {
        self.discarded_outcomes.load(Ordering::Relaxed)
    }

    pub fn inc_discarded_outcomes(&self) {
        self.discarded_outcomes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatches: self.dispatches(),
            successes: self.successes(),
            all_failed: self.all_failed(),
            timed_out: self.timed_out(),
            attempts: self.attempts(),
            retries: self.retries(),
            not_found: self.not_found(),
            discarded_outcomes: self.discarded_outcomes(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub dispatches: u64,
    pub successes: u64,
    pub all_failed: u64,
    pub timed_out: u64,
    pub attempts: u64,
    pub retries: u64,
    pub not_found: u64,
    pub discarded_outcomes: u64,
}
