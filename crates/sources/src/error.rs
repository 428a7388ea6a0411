//! Source error types

use thiserror::Error;

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors from upstream record sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected HTTP status
    #[error("unexpected status {status} from {context}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Operation that observed the status
        context: String,
    },

    /// Authentication failed
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Deletion requires a revision token the record does not carry
    #[error("record '{id}' has no revision token for deletion")]
    MissingRevision {
        /// Record identifier
        id: String,
    },

    /// The live subscription was already taken by an earlier call
    #[error("live subscription already taken")]
    AlreadySubscribed,

    /// The live subscription receiver was dropped
    #[error("live subscription closed")]
    SubscriptionClosed,
}
