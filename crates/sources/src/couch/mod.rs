//! CouchDB-style record source
//!
//! Implements [`RecordSource`](crate::RecordSource) against a CouchDB-compatible
//! HTTP store:
//!
//! - backlog fetch via `GET /{db}/_all_docs?include_docs=true`
//! - live subscription via the continuous `GET /{db}/_changes` feed
//! - acknowledgement via `DELETE /{db}/{id}?rev={rev}`
//!
//! Design documents (`_design/*`) and store bookkeeping fields
//! (underscore-prefixed keys) never reach the pipeline: a record's payload
//! is the stored document with those keys stripped.

mod changes;
mod provision;

pub use provision::Provisioner;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use driftlog_record::{LogRecord, RecordId};

use crate::common::SourceMetrics;
use crate::error::{Result, SourceError};
use crate::{RecordSource, DEFAULT_QUEUE_SIZE};

use changes::ChangesFeed;

/// Timeout for one-shot requests (backlog, acknowledge, provisioning)
///
/// Deliberately not set on the client itself: the continuous changes feed
/// is a single long-lived request and must not be cut off.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the CouchDB source
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Base URL of the store, e.g. `http://localhost:5984`
    pub base_url: String,

    /// Database holding the pending log records
    pub db_name: String,

    /// Username of the logging user
    pub username: String,

    /// Password of the logging user
    pub password: String,

    /// Capacity of the live subscription channel
    pub queue_size: usize,
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5984".into(),
            db_name: "logging".into(),
            username: String::new(),
            password: String::new(),
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

/// CouchDB-backed implementation of [`RecordSource`]
pub struct CouchSource {
    client: reqwest::Client,
    base: Url,
    db_name: String,
    username: String,
    password: String,
    queue_size: usize,
    metrics: Arc<SourceMetrics>,
}

impl CouchSource {
    /// Create a source from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client creation
    /// fails.
    pub fn new(config: CouchConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base: parse_base_url(&config.base_url)?,
            db_name: config.db_name,
            username: config.username,
            password: config.password,
            queue_size: config.queue_size,
            metrics: Arc::new(SourceMetrics::new()),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SourceMetrics {
        &self.metrics
    }

    /// URL for a path under the logging database
    fn db_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .expect("base URL validated at construction");
            path.pop_if_empty().push(&self.db_name);
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }
}

#[async_trait]
impl RecordSource for CouchSource {
    async fn fetch_backlog(&self) -> Result<Vec<LogRecord>> {
        let mut url = self.db_url(&["_all_docs"]);
        url.query_pairs_mut().append_pair("include_docs", "true");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), "_all_docs"));
        }

        let body: AllDocsResponse = response.json().await?;
        let records: Vec<LogRecord> = body
            .rows
            .into_iter()
            .filter(|row| !row.id.starts_with("_design/"))
            .filter_map(|row| doc_to_record(row.id, row.doc?))
            .collect();

        self.metrics.backlog_fetched(records.len() as u64);
        Ok(records)
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<LogRecord>> {
        let mut url = self.db_url(&["_changes"]);
        url.query_pairs_mut()
            .append_pair("feed", "continuous")
            .append_pair("include_docs", "true")
            .append_pair("since", "now")
            .append_pair("heartbeat", "30000");

        let (tx, rx) = mpsc::channel(self.queue_size);
        let feed = ChangesFeed::new(
            self.client.clone(),
            url,
            self.username.clone(),
            self.password.clone(),
            Arc::clone(&self.metrics),
        );
        tokio::spawn(feed.run(tx));

        Ok(rx)
    }

    async fn acknowledge(&self, id: &RecordId) -> Result<()> {
        let rev = id
            .revision
            .as_deref()
            .ok_or_else(|| SourceError::MissingRevision { id: id.id.clone() })?;

        let mut url = self.db_url(&[id.id.as_str()]);
        url.query_pairs_mut().append_pair("rev", rev);

        let response = self
            .client
            .delete(url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                self.metrics.acknowledge();
                Ok(())
            }
            // Already gone: a repeated acknowledgement must succeed.
            StatusCode::NOT_FOUND => {
                tracing::debug!(id = %id, "record already deleted upstream");
                self.metrics.acknowledge();
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::AuthFailed(
                "logging user may not delete records".into(),
            )),
            status => Err(status_error(status, "delete record")),
        }
    }
}

/// Response shape of `_all_docs?include_docs=true`
#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
    doc: Option<Value>,
}

/// Build the shared HTTP client
pub(crate) fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("driftlog/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(SourceError::Http)
}

/// Parse and validate a base URL
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| SourceError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(SourceError::Config(format!(
            "base URL '{}' cannot carry a path",
            base_url
        )));
    }
    Ok(url)
}

/// Map an unexpected HTTP status to a source error
pub(crate) fn status_error(status: StatusCode, context: &str) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SourceError::AuthFailed(context.to_string())
        }
        status => SourceError::Status {
            status: status.as_u16(),
            context: context.to_string(),
        },
    }
}

/// Convert a stored document into a pipeline record
///
/// The payload is the document with store bookkeeping (underscore-prefixed
/// keys) stripped; the `_rev` token moves into the record identity for
/// deletion. Non-object documents are skipped.
pub(crate) fn doc_to_record(id: String, doc: Value) -> Option<LogRecord> {
    let Value::Object(mut map) = doc else {
        tracing::debug!(id = %id, "skipping non-object document");
        return None;
    };

    let revision = map.get("_rev").and_then(Value::as_str).map(str::to_owned);
    map.retain(|key, _| !key.starts_with('_'));

    let record_id = match revision {
        Some(rev) => RecordId::with_revision(id, rev),
        None => RecordId::new(id),
    };
    Some(LogRecord::new(record_id, Value::Object(map)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doc_to_record_strips_bookkeeping_fields() {
        let doc = json!({
            "_id": "doc-1",
            "_rev": "3-abc",
            "msg": "hello",
            "level": "info"
        });

        let record = doc_to_record("doc-1".into(), doc).unwrap();
        assert_eq!(record.id.id, "doc-1");
        assert_eq!(record.id.revision.as_deref(), Some("3-abc"));
        assert_eq!(record.payload, json!({"msg": "hello", "level": "info"}));
    }

    #[test]
    fn test_doc_to_record_without_revision() {
        let record = doc_to_record("doc-2".into(), json!({"msg": "hi"})).unwrap();
        assert_eq!(record.id.revision, None);
    }

    #[test]
    fn test_doc_to_record_skips_non_objects() {
        assert!(doc_to_record("doc-3".into(), json!("just a string")).is_none());
        assert!(doc_to_record("doc-4".into(), json!(42)).is_none());
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("http://localhost:5984").is_ok());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("data:text/plain,hi").is_err());
    }

    #[test]
    fn test_db_url_escapes_segments() {
        let source = CouchSource::new(CouchConfig {
            db_name: "logging".into(),
            ..Default::default()
        })
        .unwrap();

        let url = source.db_url(&["doc with space"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:5984/logging/doc%20with%20space"
        );
    }

    #[test]
    fn test_all_docs_response_shape() {
        let body: AllDocsResponse = serde_json::from_value(json!({
            "total_rows": 2,
            "offset": 0,
            "rows": [
                {"id": "a", "key": "a", "value": {"rev": "1-x"}, "doc": {"_id": "a", "_rev": "1-x", "msg": "one"}},
                {"id": "_design/logs", "key": "_design/logs", "value": {"rev": "1-y"}}
            ]
        }))
        .unwrap();

        assert_eq!(body.rows.len(), 2);
        assert!(body.rows[1].doc.is_none());
    }
}
