//! Tests for the in-process record source

use serde_json::json;

use driftlog_record::{LogRecord, RecordId};

use crate::error::SourceError;
use crate::memory::MemorySource;
use crate::RecordSource;

fn record(id: &str) -> LogRecord {
    LogRecord::new(RecordId::new(id), json!({"id": id}))
}

#[tokio::test]
async fn test_backlog_returns_seeded_records_in_order() {
    let source = MemorySource::with_backlog(vec![record("a"), record("b")]);
    source.seed(record("c"));

    let backlog = source.fetch_backlog().await.unwrap();
    let ids: Vec<&str> = backlog.iter().map(|r| r.id.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_subscribe_delivers_pushed_records() {
    let source = MemorySource::new();
    let mut rx = source.subscribe().await.unwrap();

    source.push_live(record("x")).await.unwrap();
    source.push_live(record("y")).await.unwrap();

    assert_eq!(rx.recv().await.unwrap().id.id, "x");
    assert_eq!(rx.recv().await.unwrap().id.id, "y");
}

#[tokio::test]
async fn test_records_pushed_before_subscribe_are_buffered() {
    let source = MemorySource::new();
    source.push_live(record("early")).await.unwrap();

    let mut rx = source.subscribe().await.unwrap();
    assert_eq!(rx.recv().await.unwrap().id.id, "early");
}

#[tokio::test]
async fn test_second_subscribe_fails() {
    let source = MemorySource::new();
    let _rx = source.subscribe().await.unwrap();

    let err = source.subscribe().await.unwrap_err();
    assert!(matches!(err, SourceError::AlreadySubscribed));
}

#[tokio::test]
async fn test_acknowledge_removes_from_pending() {
    let source = MemorySource::with_backlog(vec![record("a"), record("b")]);

    source.acknowledge(&RecordId::new("a")).await.unwrap();

    let pending = source.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id.id, "b");
    assert_eq!(source.acknowledged().len(), 1);
}

#[tokio::test]
async fn test_acknowledge_is_idempotent() {
    let source = MemorySource::with_backlog(vec![record("a")]);

    source.acknowledge(&RecordId::new("a")).await.unwrap();
    source.acknowledge(&RecordId::new("a")).await.unwrap();
    source.acknowledge(&RecordId::new("never-existed")).await.unwrap();

    assert!(source.pending().is_empty());
    assert_eq!(source.metrics().snapshot().acknowledged, 3);
}

#[tokio::test]
async fn test_push_live_does_not_touch_the_pending_set() {
    let source = MemorySource::new();
    let mut rx = source.subscribe().await.unwrap();

    source.push_live(record("x")).await.unwrap();
    let received = rx.recv().await.unwrap();

    // The live feed is future-only; only seeded records show up in a
    // backlog fetch. Acknowledging the live record is still fine.
    assert!(source.pending().is_empty());
    source.acknowledge(&received.id).await.unwrap();
    assert_eq!(source.acknowledged().len(), 1);
}
