//! In-process record source
//!
//! Models the upstream store entirely in memory: a pending set drained by
//! backfill, a bounded live channel, and an idempotent acknowledge that
//! removes records from the pending set. Used by the pipeline tests and by
//! embedders that feed records from their own process.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use driftlog_record::{LogRecord, RecordId};

use crate::common::SourceMetrics;
use crate::error::{Result, SourceError};
use crate::{RecordSource, DEFAULT_QUEUE_SIZE};

/// In-memory implementation of [`RecordSource`]
#[derive(Clone)]
pub struct MemorySource {
    state: Arc<State>,
}

struct State {
    /// Records pending upstream (backlog plus unacknowledged live pushes)
    pending: Mutex<Vec<LogRecord>>,

    /// Every identity acknowledged so far, in order
    acknowledged: Mutex<Vec<RecordId>>,

    /// Live channel sender; records pushed before `subscribe` buffer here
    live_tx: mpsc::Sender<LogRecord>,

    /// Live channel receiver, handed out once
    live_rx: Mutex<Option<mpsc::Receiver<LogRecord>>>,

    /// Source metrics
    metrics: SourceMetrics,
}

impl MemorySource {
    /// Create an empty source with the default queue size
    pub fn new() -> Self {
        Self::with_queue_size(DEFAULT_QUEUE_SIZE)
    }

    /// Create an empty source with a custom live queue capacity
    pub fn with_queue_size(queue_size: usize) -> Self {
        let (live_tx, live_rx) = mpsc::channel(queue_size);
        Self {
            state: Arc::new(State {
                pending: Mutex::new(Vec::new()),
                acknowledged: Mutex::new(Vec::new()),
                live_tx,
                live_rx: Mutex::new(Some(live_rx)),
                metrics: SourceMetrics::new(),
            }),
        }
    }

    /// Create a source pre-seeded with a backlog
    pub fn with_backlog(records: Vec<LogRecord>) -> Self {
        let source = Self::new();
        source.state.pending.lock().extend(records);
        source
    }

    /// Add a record to the pending set without emitting it live
    pub fn seed(&self, record: LogRecord) {
        self.state.pending.lock().push(record);
    }

    /// Emit a record on the live subscription
    ///
    /// Waits for channel capacity, mirroring the backpressure behavior of
    /// the network sources. The record is not added to the pending set —
    /// the live feed is future-only, so a backlog fetch never replays it;
    /// use [`seed`](Self::seed) as well to model a record visible to both.
    pub async fn push_live(&self, record: LogRecord) -> Result<()> {
        self.state
            .live_tx
            .send(record)
            .await
            .map_err(|_| SourceError::SubscriptionClosed)?;
        self.state.metrics.live_record();
        Ok(())
    }

    /// Records still pending upstream
    pub fn pending(&self) -> Vec<LogRecord> {
        self.state.pending.lock().clone()
    }

    /// Identities acknowledged so far, in acknowledgement order
    pub fn acknowledged(&self) -> Vec<RecordId> {
        self.state.acknowledged.lock().clone()
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SourceMetrics {
        &self.state.metrics
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_backlog(&self) -> Result<Vec<LogRecord>> {
        let backlog = self.state.pending.lock().clone();
        self.state.metrics.backlog_fetched(backlog.len() as u64);
        Ok(backlog)
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<LogRecord>> {
        self.state
            .live_rx
            .lock()
            .take()
            .ok_or(SourceError::AlreadySubscribed)
    }

    async fn acknowledge(&self, id: &RecordId) -> Result<()> {
        // Idempotent: acknowledging an id that is no longer pending is fine.
        self.state.pending.lock().retain(|r| r.id.id != id.id);
        self.state.acknowledged.lock().push(id.clone());
        self.state.metrics.acknowledge();
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
