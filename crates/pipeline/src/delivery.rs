//! Delivery pipeline
//!
//! Drives one record at a time through serialize → append → acknowledge.
//! The record's pending status upstream is the system of record for "needs
//! retry": nothing here re-queues or re-times a failed record.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use driftlog_record::LogRecord;
use driftlog_sinks::RollingFileSink;
use driftlog_sources::RecordSource;

use crate::backfill::BackfillCoordinator;
use crate::error::{PipelineError, Result};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};

/// Delivery pipeline for one logical log stream
#[derive(Clone)]
pub struct DeliveryPipeline {
    sink: Arc<RollingFileSink>,
    source: Arc<dyn RecordSource>,
    metrics: Arc<PipelineMetrics>,
}

impl DeliveryPipeline {
    /// Create a pipeline between a source and a sink
    pub fn new(sink: Arc<RollingFileSink>, source: Arc<dyn RecordSource>) -> Self {
        Self {
            sink,
            source,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub(crate) fn source(&self) -> &Arc<dyn RecordSource> {
        &self.source
    }

    /// Deliver one record: serialize, append, acknowledge
    ///
    /// On error the record was not written and was not acknowledged; it
    /// stays pending upstream until a later change notification or the next
    /// startup backfill retries it. An acknowledge failure after a
    /// successful write is logged and swallowed (at-least-once: a duplicate
    /// line may be written later, the record is never lost).
    pub async fn deliver(&self, record: &LogRecord) -> Result<()> {
        let line = match record.to_line() {
            Ok(line) => line,
            Err(e) => {
                self.metrics.delivery_failure();
                tracing::error!(
                    id = %record.id,
                    error = %e,
                    "failed to serialize record, leaving it pending"
                );
                return Err(PipelineError::Record(e));
            }
        };

        if let Err(e) = self.sink.append_line(&line).await {
            self.metrics.delivery_failure();
            tracing::error!(
                id = %record.id,
                error = %e,
                "failed to write record, leaving it pending"
            );
            return Err(PipelineError::Sink(e));
        }
        self.metrics.record_delivered(line.len() as u64);

        if let Err(e) = self.source.acknowledge(&record.id).await {
            self.metrics.ack_failure();
            tracing::warn!(
                id = %record.id,
                error = %e,
                "failed to acknowledge written record, duplicate delivery possible"
            );
        }

        Ok(())
    }

    /// Run the pipeline: drain the backlog, then follow the live feed
    ///
    /// Returns when the subscription closes or `cancel` fires. Per-record
    /// failures are logged and do not stop the loop; a backlog fetch or
    /// subscription failure is fatal.
    pub async fn run(self, cancel: CancellationToken) -> Result<MetricsSnapshot> {
        let report = BackfillCoordinator::new(self.clone()).drain().await?;
        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            "startup backlog drained"
        );

        let mut live = self
            .source
            .subscribe()
            .await
            .map_err(PipelineError::Source)?;
        tracing::info!("live subscription attached");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("pipeline shutting down");
                    break;
                }
                record = live.recv() => match record {
                    Some(record) => {
                        // Failure already logged; the record stays pending.
                        let _ = self.deliver(&record).await;
                    }
                    None => {
                        tracing::warn!("live subscription ended");
                        break;
                    }
                }
            }
        }

        Ok(self.metrics.snapshot())
    }
}

#[cfg(test)]
#[path = "delivery_test.rs"]
mod delivery_test;
