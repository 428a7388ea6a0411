//! Driftlog - Pipeline
//!
//! The delivery loop between an upstream record source and the rolling file
//! sink.
//!
//! # Architecture
//!
//! ```text
//! [RecordSource]                  [DeliveryPipeline]              [RollingFileSink]
//!   fetch_backlog ──(startup)──> BackfillCoordinator ──deliver──> append_line
//!   subscribe ───────mpsc──────> run loop ────────────deliver──> append_line
//!   acknowledge <──────────────── on append success ┘
//! ```
//!
//! # Key Design
//!
//! - **Write-then-acknowledge**: a record is deleted upstream only after its
//!   line is durably appended. An append failure leaves the record pending
//!   for a later external trigger; an acknowledge failure is logged and
//!   tolerated (duplicate write on redelivery, never loss).
//! - **Backfill before live**: the startup backlog is drained to disk before
//!   the live subscription attaches, so records that arrived while the
//!   process was down are never stranded on a future-only feed.
//! - **One record at a time**: records are delivered sequentially per
//!   stream; the sink's permit backs the same guarantee for direct callers.

mod backfill;
mod delivery;
mod error;
mod metrics;

pub use backfill::{BackfillCoordinator, BackfillReport};
pub use delivery::DeliveryPipeline;
pub use error::{PipelineError, Result};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
