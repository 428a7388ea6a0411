//! Sink error types

use std::io;

use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors from the rolling file sink
///
/// A stat failure is deliberately absent: it is absorbed inside the sink as
/// "no rotation this call" so a transient stat error never blocks a write.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Renaming the active file into the backup slot failed; nothing was
    /// written and the record is not durable
    #[error("rotation rename failed for '{path}': {source}")]
    Rotate {
        /// Active file path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Appending to the active file failed; the record is not durable
    #[error("append failed for '{path}': {source}")]
    Append {
        /// Active file path
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = SinkError::Rotate {
            path: "logs/app.log".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("logs/app.log"));
        assert!(err.to_string().contains("rotation rename failed"));

        let err = SinkError::Append {
            path: "logs/app.log".into(),
            source: io::Error::new(io::ErrorKind::StorageFull, "full"),
        };
        assert!(err.to_string().contains("append failed"));
    }
}
