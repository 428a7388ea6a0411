//! Rolling file sink - size-triggered two-slot rotation
//!
//! Owns one logical log stream split across two on-disk files: the active
//! file at the configured path and a single backup generation at `<path>.1`.
//! Each append re-checks the active file's size on disk and rotates before
//! the write that would exceed the threshold.
//!
//! # Append Sequence
//!
//! ```text
//! append_line(line)
//!   1. stat active file          (missing file → size 0, no rotation;
//!                                 other stat errors → no rotation this call)
//!   2. size >= roll_after_bytes? rename active → <path>.1
//!                                 (replaces the previous backup)
//!   3. append line to active     (created if missing)
//! ```
//!
//! The whole sequence holds the stream permit, so a second delivery cannot
//! start its size check until the prior append has completed.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::common::SinkMetrics;
use crate::error::{Result, SinkError};
use crate::fs::{SinkFs, TokioFs};

/// Default rotation threshold (50 MiB)
pub const DEFAULT_ROLL_AFTER_BYTES: u64 = 50 * 1024 * 1024;

/// Literal suffix of the single backup slot
pub const BACKUP_SUFFIX: &str = ".1";

/// Configuration for the rolling file sink
#[derive(Debug, Clone)]
pub struct RollingConfig {
    /// Active file path
    pub path: PathBuf,

    /// Rotate once the active file has reached this many bytes
    pub roll_after_bytes: u64,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("driftlog.log"),
            roll_after_bytes: DEFAULT_ROLL_AFTER_BYTES,
        }
    }
}

impl RollingConfig {
    /// Create config with a custom active file path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Create config with a custom rotation threshold
    #[must_use]
    pub fn with_roll_after_bytes(mut self, bytes: u64) -> Self {
        self.roll_after_bytes = bytes;
        self
    }
}

/// File sink for one logical log stream
///
/// Holds no state across calls besides the two path identities and the
/// threshold; the active file's size is queried from the filesystem on every
/// append.
pub struct RollingFileSink {
    /// Active file path
    active: PathBuf,

    /// Backup slot path (`active` + ".1")
    backup: PathBuf,

    /// Rotation threshold in bytes
    roll_after_bytes: u64,

    /// Injected filesystem capability
    fs: Arc<dyn SinkFs>,

    /// Per-stream permit serializing the stat→rotate→append sequence
    permit: Mutex<()>,

    /// Sink metrics
    metrics: SinkMetrics,
}

impl RollingFileSink {
    /// Create a sink backed by the real filesystem
    pub fn new(config: RollingConfig) -> Self {
        Self::with_fs(config, TokioFs)
    }

    /// Create a sink with an injected filesystem capability
    pub fn with_fs<F: SinkFs + 'static>(config: RollingConfig, fs: F) -> Self {
        let backup = backup_path(&config.path);
        Self {
            active: config.path,
            backup,
            roll_after_bytes: config.roll_after_bytes,
            fs: Arc::new(fs),
            permit: Mutex::new(()),
            metrics: SinkMetrics::new(),
        }
    }

    /// Append one serialized, newline-terminated line to the stream
    ///
    /// Success means the line is durably appended to the active file.
    /// On error nothing was written and the record must not be acknowledged
    /// upstream.
    pub async fn append_line(&self, line: &str) -> Result<()> {
        let _permit = self.permit.lock().await;

        self.rotate_if_needed().await?;

        if let Err(e) = self.fs.append(&self.active, line.as_bytes()).await {
            self.metrics.append_error();
            return Err(SinkError::Append {
                path: self.active.display().to_string(),
                source: e,
            });
        }

        self.metrics.line_written(line.len() as u64);
        Ok(())
    }

    /// Size check and rotation; called with the permit held
    async fn rotate_if_needed(&self) -> Result<()> {
        let size = match self.fs.len(&self.active).await {
            Ok(size) => size,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                // A failed stat must not block the write; skip the rotation
                // check for this call only.
                tracing::debug!(
                    path = %self.active.display(),
                    error = %e,
                    "stat failed, skipping rotation check"
                );
                return Ok(());
            }
        };

        if size < self.roll_after_bytes {
            return Ok(());
        }

        if let Err(e) = self.fs.rename(&self.active, &self.backup).await {
            self.metrics.rotate_error();
            return Err(SinkError::Rotate {
                path: self.active.display().to_string(),
                source: e,
            });
        }

        self.metrics.rotation();
        tracing::debug!(
            path = %self.active.display(),
            backup = %self.backup.display(),
            size,
            "rotated active file into backup slot"
        );
        Ok(())
    }

    /// Path of the active file
    pub fn active_path(&self) -> &Path {
        &self.active
    }

    /// Path of the backup slot
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

/// Backup slot path for an active path: the full file name plus `.1`
fn backup_path(active: &Path) -> PathBuf {
    let mut os = active.as_os_str().to_owned();
    os.push(BACKUP_SUFFIX);
    PathBuf::from(os)
}

#[cfg(test)]
#[path = "rolling_test.rs"]
mod rolling_test;
