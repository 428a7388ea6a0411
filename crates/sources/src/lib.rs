//! Driftlog - Sources
//!
//! Upstream record sources for the delivery pipeline.
//!
//! # Architecture
//!
//! ```text
//! [Upstream store] --backlog--> fetch_backlog() ──┐
//!                                                 ├──> [DeliveryPipeline]
//!                  --changes--> subscribe() ──mpsc┘
//!                                                 <──── acknowledge(id)
//! ```
//!
//! A source exposes three operations: a one-shot fetch of every record
//! pending before startup, a live subscription delivering newly arriving
//! records through a bounded channel, and an idempotent deletion
//! acknowledgement. The pipeline acknowledges a record only after it is
//! durably on disk; everything not acknowledged stays pending upstream and
//! is seen again by a later backlog fetch.
//!
//! # Available Sources
//!
//! | Source | Purpose |
//! |--------|---------|
//! | [`CouchSource`] | CouchDB-style store via `_all_docs` / `_changes` |
//! | [`MemorySource`] | In-process store for tests and embedding |

mod common;
mod couch;
mod error;
mod memory;

pub use common::{MetricsSnapshot, SourceMetrics};
pub use couch::{CouchConfig, CouchSource, Provisioner};
pub use error::{Result, SourceError};
pub use memory::MemorySource;

use async_trait::async_trait;
use tokio::sync::mpsc;

use driftlog_record::{LogRecord, RecordId};

/// Default capacity of the live subscription channel
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// An upstream store that emits records and accepts deletion
/// acknowledgements
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the complete set of records currently pending upstream
    ///
    /// Order is not guaranteed by the store; callers process records in the
    /// order received.
    async fn fetch_backlog(&self) -> Result<Vec<LogRecord>>;

    /// Attach the live subscription
    ///
    /// Returns a bounded channel of newly pending records. The feed applies
    /// backpressure by waiting for channel capacity, so a slow consumer
    /// slows the feed rather than growing an unbounded queue.
    async fn subscribe(&self) -> Result<mpsc::Receiver<LogRecord>>;

    /// Delete a record upstream after it is durably written
    ///
    /// Idempotent: acknowledging a record that is already gone succeeds.
    async fn acknowledge(&self, id: &RecordId) -> Result<()>;
}
