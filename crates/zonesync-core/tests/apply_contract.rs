//! Contract: best-effort sequential apply
//!
//! Writes run in the order given, one at a time. A failed write never stops
//! the ones after it, and the returned error names exactly the writes that
//! failed.

mod common;

use common::MemoryZoneProvider;
use zonesync_core::{ApplyExecutor, Error, RecordType, WriteOp, Zone, ZoneRecord};

fn provider() -> MemoryZoneProvider {
    MemoryZoneProvider::new().with_zone(
        "example.com",
        vec![
            ZoneRecord::new("a", RecordType::A, 600, "192.0.2.1"),
            ZoneRecord::new("b", RecordType::A, 600, "192.0.2.2"),
            ZoneRecord::new("c", RecordType::A, 600, "192.0.2.3"),
        ],
    )
}

fn replace(name: &str, data: &str) -> WriteOp {
    WriteOp::ReplaceRecordSet {
        zone: Zone::new("example.com"),
        name: name.to_string(),
        record_type: RecordType::A,
        records: vec![ZoneRecord::new(name, RecordType::A, 300, data)],
    }
}

fn delete(name: &str) -> WriteOp {
    WriteOp::DeleteRecordSet {
        zone: Zone::new("example.com"),
        name: name.to_string(),
        record_type: RecordType::A,
    }
}

#[tokio::test]
async fn test_writes_run_in_given_order() {
    let provider = provider();

    ApplyExecutor::new(&provider)
        .apply(vec![delete("c"), replace("a", "198.51.100.1"), delete("b")])
        .await
        .unwrap();

    assert_eq!(
        provider.writes(),
        vec![
            "delete example.com c A",
            "replace example.com a A",
            "delete example.com b A",
        ]
    );
    assert_eq!(
        provider.records("example.com"),
        vec![ZoneRecord::new("a", RecordType::A, 300, "198.51.100.1")]
    );
}

#[tokio::test]
async fn test_failure_does_not_stop_later_writes() {
    let provider = provider();
    provider.fail_on("delete example.com b A");

    let err = ApplyExecutor::new(&provider)
        .apply(vec![
            replace("a", "198.51.100.1"),
            delete("b"),
            replace("c", "198.51.100.3"),
        ])
        .await
        .unwrap_err();

    // Every write was attempted
    assert_eq!(provider.writes().len(), 3);

    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].op, delete("b"));
    assert!(err.unresolved.is_empty());

    // The writes around the failure took effect
    let records = provider.records("example.com");
    assert!(records.contains(&ZoneRecord::new("a", RecordType::A, 300, "198.51.100.1")));
    assert!(records.contains(&ZoneRecord::new("b", RecordType::A, 600, "192.0.2.2")));
    assert!(records.contains(&ZoneRecord::new("c", RecordType::A, 300, "198.51.100.3")));
}

#[tokio::test]
async fn test_every_failure_is_reported() {
    let provider = provider();
    provider.fail_on("replace example.com a A");
    provider.fail_on("replace example.com c A");

    let err = ApplyExecutor::new(&provider)
        .apply(vec![
            replace("a", "198.51.100.1"),
            delete("b"),
            replace("c", "198.51.100.3"),
        ])
        .await
        .unwrap_err();

    let failed: Vec<&str> = err.failures.iter().map(|f| f.op.name()).collect();
    assert_eq!(failed, vec!["a", "c"]);

    let message = err.to_string();
    assert!(message.starts_with("2 operation(s) failed"));
    assert!(message.contains("zone: example.com, name: a, type: A"));
    assert!(message.contains("zone: example.com, name: c, type: A"));
}

#[tokio::test]
async fn test_replace_is_idempotent() {
    let provider = provider();
    let executor = ApplyExecutor::new(&provider);

    executor.apply(vec![replace("a", "198.51.100.1")]).await.unwrap();
    let once = provider.records("example.com");

    executor.apply(vec![replace("a", "198.51.100.1")]).await.unwrap();
    assert_eq!(provider.records("example.com"), once);
}

#[tokio::test]
async fn test_provider_error_kept_in_failure() {
    let provider = provider();

    // Deleting a record set that does not exist fails in the provider
    let err = ApplyExecutor::new(&provider)
        .apply(vec![delete("missing")])
        .await
        .unwrap_err();

    assert!(matches!(err.failures[0].error, Error::NotFound(_)));
}

#[tokio::test]
async fn test_empty_ops_is_ok() {
    let provider = provider();

    ApplyExecutor::new(&provider).apply(Vec::new()).await.unwrap();

    assert!(provider.calls().is_empty());
}
