//! Common types for sinks
//!
//! Metrics follow the atomic-counter-plus-snapshot pattern used across the
//! pipeline crates.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a rolling file sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Total lines appended to the active file
    pub lines_written: AtomicU64,

    /// Total bytes appended (including line terminators)
    pub bytes_written: AtomicU64,

    /// Rotations performed
    pub rotations: AtomicU64,

    /// Append failures surfaced to the caller
    pub append_errors: AtomicU64,

    /// Rotation rename failures surfaced to the caller
    pub rotate_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            lines_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            append_errors: AtomicU64::new(0),
            rotate_errors: AtomicU64::new(0),
        }
    }

    /// Record a successfully appended line
    #[inline]
    pub fn line_written(&self, bytes: u64) {
        self.lines_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a completed rotation
    #[inline]
    pub fn rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an append failure
    #[inline]
    pub fn append_error(&self) {
        self.append_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rotation failure
    #[inline]
    pub fn rotate_error(&self) {
        self.rotate_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_written: self.lines_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            append_errors: self.append_errors.load(Ordering::Relaxed),
            rotate_errors: self.rotate_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub lines_written: u64,
    pub bytes_written: u64,
    pub rotations: u64,
    pub append_errors: u64,
    pub rotate_errors: u64,
}
