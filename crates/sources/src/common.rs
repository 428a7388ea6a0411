//! Common types and utilities for sources

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by all source types
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Records returned by backlog fetches
    pub backlog_records: AtomicU64,

    /// Records emitted on the live subscription
    pub live_records: AtomicU64,

    /// Deletion acknowledgements issued upstream
    pub acknowledged: AtomicU64,

    /// Live feed reconnects
    pub reconnects: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            backlog_records: AtomicU64::new(0),
            live_records: AtomicU64::new(0),
            acknowledged: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Record a backlog fetch of `count` records
    #[inline]
    pub fn backlog_fetched(&self, count: u64) {
        self.backlog_records.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a record emitted on the live subscription
    #[inline]
    pub fn live_record(&self) {
        self.live_records.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an issued acknowledgement
    #[inline]
    pub fn acknowledge(&self) {
        self.acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a live feed reconnect
    #[inline]
    pub fn reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            backlog_records: self.backlog_records.load(Ordering::Relaxed),
            live_records: self.live_records.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of source metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub backlog_records: u64,
    pub live_records: u64,
    pub acknowledged: u64,
    pub reconnects: u64,
}
