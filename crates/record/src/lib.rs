//! Driftlog - Records
//!
//! The record types passed between the upstream source, the delivery
//! pipeline, and the file sink.
//!
//! A record is an opaque JSON document plus the identity the upstream store
//! assigned to it. The pipeline never inspects the payload; it only
//! serializes it to a single line and uses the identity to acknowledge the
//! record after a durable write.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Upstream-assigned identity of a record
///
/// Used solely for deletion acknowledgement. Stores with MVCC semantics
/// (CouchDB) also require the revision token for deletes; sources without
/// revisions leave it `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Document identifier in the upstream store
    pub id: String,

    /// Revision token required by MVCC stores for deletion
    pub revision: Option<String>,
}

impl RecordId {
    /// Create an identity without a revision token
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: None,
        }
    }

    /// Create an identity with a revision token
    pub fn with_revision(id: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: Some(revision.into()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// One log record drained from the upstream source
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Identity used for deletion acknowledgement
    pub id: RecordId,

    /// Opaque JSON payload, written verbatim as one line
    pub payload: Value,
}

impl LogRecord {
    /// Create a record from an identity and payload
    pub fn new(id: RecordId, payload: Value) -> Self {
        Self { id, payload }
    }

    /// Serialize the payload to exactly one newline-terminated line
    ///
    /// JSON string escaping guarantees the line itself contains no unescaped
    /// newline, so the on-disk format stays one record per line.
    pub fn to_line(&self) -> Result<String, RecordError> {
        let mut line = serde_json::to_string(&self.payload)?;
        line.push('\n');
        Ok(line)
    }
}

/// Errors from record serialization
#[derive(Debug, Error)]
pub enum RecordError {
    /// Payload could not be JSON-encoded
    #[error("failed to serialize record payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
