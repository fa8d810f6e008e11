// crates/flood-alert-core/tests/store.rs
// ============================================================================
// Module: In-Memory Dispatch Store Tests
// Description: Upsert and no-downgrade rules of the in-memory store.
// Purpose: Validate the store contract shared with the durable store.
// Dependencies: flood-alert-core
// ============================================================================
//! ## Overview
//! A `sent` record is terminal; `pending` and `failed` records are replaced
//! by later writes.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use flood_alert_core::Channel;
use flood_alert_core::DispatchKey;
use flood_alert_core::DispatchRecord;
use flood_alert_core::DispatchStateStore;
use flood_alert_core::DispatchStatus;
use flood_alert_core::ForecastKey;
use flood_alert_core::ForecastTime;
use flood_alert_core::InMemoryDispatchStore;
use flood_alert_core::RecipientId;
use flood_alert_core::SiteId;
use flood_alert_core::SourceId;
use flood_alert_core::Timestamp;

fn key(recipient: &str) -> DispatchKey {
    DispatchKey::new(
        ForecastKey {
            source: SourceId::new("f.csv"),
            site: SiteId::new("s1"),
            timestamp: ForecastTime::parse("2025-01-01").unwrap(),
        },
        RecipientId::new(recipient),
        Channel::Email,
    )
}

#[test]
fn pending_then_sent_marks_key_as_sent() {
    let store = InMemoryDispatchStore::new();
    store.readiness().unwrap();
    assert!(!store.has_sent(&key("A")).unwrap());
    store.record(&DispatchRecord::pending(key("A"), Timestamp::from_unix_millis(1))).unwrap();
    assert!(!store.has_sent(&key("A")).unwrap());
    store.record(&DispatchRecord::sent(key("A"), Timestamp::from_unix_millis(2), 1)).unwrap();
    assert!(store.has_sent(&key("A")).unwrap());
    assert!(!store.has_sent(&key("B")).unwrap());
}

#[test]
fn sent_record_is_never_downgraded() {
    let store = InMemoryDispatchStore::new();
    store.record(&DispatchRecord::sent(key("A"), Timestamp::from_unix_millis(2), 1)).unwrap();
    store
        .record(&DispatchRecord::failed(key("A"), Timestamp::from_unix_millis(3), 1, "late"))
        .unwrap();
    store.record(&DispatchRecord::pending(key("A"), Timestamp::from_unix_millis(4))).unwrap();
    let record = store.get(&key("A")).unwrap().unwrap();
    assert_eq!(record.status, DispatchStatus::Sent);
    assert_eq!(record.recorded_at, Timestamp::from_unix_millis(2));
}

#[test]
fn failed_record_is_replaced_by_a_later_success() {
    let store = InMemoryDispatchStore::new();
    store
        .record(&DispatchRecord::failed(key("A"), Timestamp::from_unix_millis(1), 3, "timeout"))
        .unwrap();
    assert_eq!(store.get(&key("A")).unwrap().unwrap().error.as_deref(), Some("timeout"));
    store.record(&DispatchRecord::sent(key("A"), Timestamp::from_unix_millis(2), 1)).unwrap();
    assert_eq!(store.count(DispatchStatus::Sent).unwrap(), 1);
    assert_eq!(store.count(DispatchStatus::Failed).unwrap(), 0);
}
