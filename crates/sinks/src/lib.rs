//! Driftlog - Sinks
//!
//! File-based log sink with size-triggered rotation.
//!
//! # Architecture
//!
//! ```text
//! [Pipeline] --line--> [RollingFileSink] --SinkFs--> [active file <path>]
//!                             │ (size >= threshold)
//!                             └──rename──> [backup file <path>.1]
//! ```
//!
//! # Key Design
//!
//! - **Two-slot rotation**: one active file, one backup generation; a
//!   rotation replaces the previous backup rather than chaining further
//!   generations.
//! - **No size cache**: the active file is re-stat'ed before every rotation
//!   decision; the size on disk is the only source of truth.
//! - **Per-stream permit**: the whole stat→rotate→append sequence runs under
//!   a `tokio::sync::Mutex`, so concurrent deliveries never race the size
//!   check or the backup slot.
//! - **Injected filesystem**: stat/append/rename go through the [`SinkFs`]
//!   capability, so tests can substitute fault-injecting implementations.

mod common;
mod error;
mod fs;
mod rolling;

pub use common::{MetricsSnapshot, SinkMetrics};
pub use error::{Result, SinkError};
pub use fs::{SinkFs, TokioFs};
pub use rolling::{RollingConfig, RollingFileSink, BACKUP_SUFFIX, DEFAULT_ROLL_AFTER_BYTES};
