//! Pipeline error types

use thiserror::Error;

use driftlog_record::RecordError;
use driftlog_sinks::SinkError;
use driftlog_sources::SourceError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline errors
///
/// Every variant means the affected record was NOT acknowledged upstream and
/// stays pending there.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Record payload could not be serialized
    #[error("record serialization failed: {0}")]
    Record(#[from] RecordError),

    /// Sink append or rotation failed
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),

    /// Source operation failed (backlog fetch or subscription)
    #[error("source operation failed: {0}")]
    Source(#[from] SourceError),
}
