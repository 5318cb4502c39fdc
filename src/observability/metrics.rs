//! Store and query counters
//!
//! - Counters only, monotonic
//! - Reset only when the store is opened
//! - Relaxed atomics; values are exact once the counted operation returns

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters shared by a store and every query built on it
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    records_scanned: AtomicU64,
    index_lookups: AtomicU64,
    records_put: AtomicU64,
    records_removed: AtomicU64,
    commits: AtomicU64,
    parameters_rebound: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one executed query call (find, count, aggregate, remove, ...)
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one builder or rebind rejection
    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_scanned(&self, n: u64) {
        self.records_scanned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_index_lookups(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_put(&self, n: u64) {
        self.records_put.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_records_removed(&self, n: u64) {
        self.records_removed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_parameters_rebound(&self) {
        self.parameters_rebound.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            records_put: self.records_put.load(Ordering::Relaxed),
            records_removed: self.records_removed.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            parameters_rebound: self.parameters_rebound.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a single JSON object
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"queries_executed":{},"queries_rejected":{},"records_scanned":{},"index_lookups":{},"records_put":{},"records_removed":{},"commits":{},"parameters_rebound":{}}}"#,
            s.queries_executed,
            s.queries_rejected,
            s.records_scanned,
            s.index_lookups,
            s.records_put,
            s.records_removed,
            s.commits,
            s.parameters_rebound,
        )
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub records_scanned: u64,
    pub index_lookups: u64,
    pub records_put: u64,
    pub records_removed: u64,
    pub commits: u64,
    pub parameters_rebound: u64,
}
