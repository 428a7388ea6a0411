//! Pipeline metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a delivery pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Records durably written to the sink
    pub records_delivered: AtomicU64,

    /// Bytes written (serialized lines, including terminators)
    pub bytes_delivered: AtomicU64,

    /// Records whose serialization or sink write failed
    pub delivery_failures: AtomicU64,

    /// Records written but not acknowledged upstream
    pub ack_failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_delivered: AtomicU64::new(0),
            bytes_delivered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            ack_failures: AtomicU64::new(0),
        }
    }

    /// Record a durable write
    #[inline]
    pub fn record_delivered(&self, bytes: u64) {
        self.records_delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_delivered.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed delivery
    #[inline]
    pub fn delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a swallowed acknowledge failure
    #[inline]
    pub fn ack_failure(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            bytes_delivered: self.bytes_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub records_delivered: u64,
    pub bytes_delivered: u64,
    pub delivery_failures: u64,
    pub ack_failures: u64,
}
