//! Continuous changes feed
//!
//! Reads the newline-delimited continuous `_changes` stream, turning each
//! change row into a record on the live channel. Heartbeat lines are empty
//! and skipped; deletions and design documents are filtered out.
//!
//! The feed task lives until the subscription receiver is dropped. A broken
//! connection is re-dialed after a short delay; records that change while
//! the feed is down stay pending upstream and are recovered by the next
//! startup backfill.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use driftlog_record::LogRecord;

use crate::common::SourceMetrics;
use crate::error::Result;

use super::{doc_to_record, status_error};

/// Delay before re-dialing a broken feed connection
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How one pass over the feed stream ended
enum FeedEnd {
    /// The subscription receiver was dropped; the feed is done
    ReceiverDropped,
    /// The server closed the stream; re-dial
    ServerClosed,
}

/// Long-lived reader of the continuous changes stream
pub(crate) struct ChangesFeed {
    client: reqwest::Client,
    url: Url,
    username: String,
    password: String,
    metrics: Arc<SourceMetrics>,
}

impl ChangesFeed {
    pub(crate) fn new(
        client: reqwest::Client,
        url: Url,
        username: String,
        password: String,
        metrics: Arc<SourceMetrics>,
    ) -> Self {
        Self {
            client,
            url,
            username,
            password,
            metrics,
        }
    }

    /// Run the feed until the subscription receiver is dropped
    pub(crate) async fn run(self, tx: mpsc::Sender<LogRecord>) {
        loop {
            match self.stream_once(&tx).await {
                Ok(FeedEnd::ReceiverDropped) => {
                    tracing::debug!("live subscription dropped, stopping changes feed");
                    return;
                }
                Ok(FeedEnd::ServerClosed) => {
                    tracing::warn!("changes feed closed by server, reconnecting");
                }
                Err(e) => {
                    if tx.is_closed() {
                        return;
                    }
                    tracing::warn!(error = %e, "changes feed failed, reconnecting");
                }
            }

            self.metrics.reconnect();
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    /// One connection's worth of streaming
    async fn stream_once(&self, tx: &mpsc::Sender<LogRecord>) -> Result<FeedEnd> {
        let mut response = self
            .client
            .get(self.url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), "_changes"));
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);

            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line = buf.split_to(pos + 1);
                let Ok(text) = std::str::from_utf8(&line) else {
                    continue;
                };
                if let Some(record) = parse_change_line(text) {
                    // Waiting for capacity here is the backpressure path: a
                    // slow sink slows this reader instead of growing a queue.
                    if tx.send(record).await.is_err() {
                        return Ok(FeedEnd::ReceiverDropped);
                    }
                    self.metrics.live_record();
                }
            }
        }

        Ok(FeedEnd::ServerClosed)
    }
}

/// One row of the continuous feed
#[derive(Debug, Deserialize)]
struct ChangeRow {
    /// Absent on the trailing `last_seq` row
    id: Option<String>,

    /// Set when the change is a deletion
    #[serde(default)]
    deleted: bool,

    /// Present with `include_docs=true`
    doc: Option<Value>,
}

/// Parse one line of the continuous feed into a record
///
/// Returns `None` for heartbeats, deletions, design documents, the
/// `last_seq` trailer, and lines that fail to parse.
fn parse_change_line(line: &str) -> Option<LogRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let row: ChangeRow = match serde_json::from_str(line) {
        Ok(row) => row,
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable change line");
            return None;
        }
    };

    if row.deleted {
        return None;
    }
    let id = row.id?;
    if id.starts_with("_design/") {
        return None;
    }
    doc_to_record(id, row.doc?)
}
