//! Filesystem capability for sinks
//!
//! The sink performs exactly three filesystem operations: stat, append, and
//! rename. They are injected at construction as a trait object so tests can
//! substitute an in-memory or fault-injecting filesystem.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Filesystem operations the sink depends on
#[async_trait]
pub trait SinkFs: Send + Sync {
    /// Current size in bytes of the file at `path`
    async fn len(&self, path: &Path) -> io::Result<u64>;

    /// Append `data` to the file at `path`, creating it if absent
    ///
    /// Success means the data has been handed to the OS file-append call and
    /// flushed through the writer's buffers.
    async fn append(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Rename `from` to `to`, replacing any file already at `to`
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

#[async_trait]
impl<T: SinkFs + ?Sized> SinkFs for std::sync::Arc<T> {
    async fn len(&self, path: &Path) -> io::Result<u64> {
        (**self).len(path).await
    }

    async fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        (**self).append(path, data).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to).await
    }
}

/// Real filesystem backed by `tokio::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFs;

#[async_trait]
impl SinkFs for TokioFs {
    async fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }
}
