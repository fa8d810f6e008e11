// crates/flood-alert-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SQLite DispatchStateStore behavior.
// Purpose: Ensure durable persistence, the sent guard, and fail-closed opens.
// Dependencies: flood-alert-store-sqlite, flood-alert-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed dispatch state store. Exercises
//! durability across reopen, the rule that a `sent` row is never replaced,
//! concurrent writers, and adversarial storage conditions (foreign files,
//! unknown schema versions, damaged rows).

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use flood_alert_core::AuthenticationError;
use flood_alert_core::Channel;
use flood_alert_core::ChannelSender;
use flood_alert_core::Clock;
use flood_alert_core::Credential;
use flood_alert_core::CredentialProvider;
use flood_alert_core::DispatchKey;
use flood_alert_core::DispatchOrchestrator;
use flood_alert_core::DispatchRecord;
use flood_alert_core::DispatchStateStore;
use flood_alert_core::DispatchStatus;
use flood_alert_core::ForecastIngestor;
use flood_alert_core::ForecastKey;
use flood_alert_core::ForecastTime;
use flood_alert_core::Message;
use flood_alert_core::OrchestratorConfig;
use flood_alert_core::RecipientId;
use flood_alert_core::SendOutcome;
use flood_alert_core::SiteId;
use flood_alert_core::SourceId;
use flood_alert_core::StateStoreError;
use flood_alert_core::Timestamp;
use flood_alert_store_sqlite::SqliteDispatchStore;
use flood_alert_store_sqlite::SqliteStoreConfig;
use flood_alert_store_sqlite::SqliteStoreError;
use flood_alert_store_sqlite::SqliteStoreMode;
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn key(recipient: &str, channel: Channel) -> DispatchKey {
    let forecast = ForecastKey {
        source: SourceId::new("forecast.csv"),
        site: SiteId::new("S1"),
        timestamp: ForecastTime::parse("2025-01-01T00:00").unwrap(),
    };
    DispatchKey::new(forecast, RecipientId::new(recipient), channel)
}

fn at(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

fn open(path: &Path) -> SqliteDispatchStore {
    SqliteDispatchStore::new(&SqliteStoreConfig::new(path)).unwrap()
}

fn store_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("state").join("dispatch.sqlite")
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

#[test]
fn sent_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let sent = key("A", Channel::Email);
    let failed = key("B", Channel::WhatsApp);
    {
        let store = open(&path);
        store.readiness().unwrap();
        store.record(&DispatchRecord::pending(sent.clone(), at(1))).unwrap();
        store.record(&DispatchRecord::sent(sent.clone(), at(2), 1)).unwrap();
        store.record(&DispatchRecord::failed(failed.clone(), at(3), 4, "HTTP 503")).unwrap();
    }

    let store = open(&path);
    assert!(store.has_sent(&sent).unwrap());
    assert!(!store.has_sent(&failed).unwrap());
    assert!(!store.has_sent(&key("C", Channel::Email)).unwrap());

    let record = store.get(&failed).unwrap().unwrap();
    assert_eq!(record.status, DispatchStatus::Failed);
    assert_eq!(record.attempts, 4);
    assert_eq!(record.recorded_at, at(3));
    assert_eq!(record.error.as_deref(), Some("HTTP 503"));
    assert_eq!(record.key, failed);
    assert_eq!(store.records().unwrap().len(), 2);
}

#[test]
fn sent_record_is_never_downgraded() {
    let dir = TempDir::new().unwrap();
    let store = open(&store_path(&dir));
    let target = key("A", Channel::Email);
    store.record(&DispatchRecord::sent(target.clone(), at(10), 2)).unwrap();
    store.record(&DispatchRecord::pending(target.clone(), at(11))).unwrap();
    store.record(&DispatchRecord::failed(target.clone(), at(12), 1, "late failure")).unwrap();

    let record = store.get(&target).unwrap().unwrap();
    assert_eq!(record.status, DispatchStatus::Sent);
    assert_eq!(record.recorded_at, at(10));
    assert_eq!(record.attempts, 2);
    assert_eq!(record.error, None);
}

#[test]
fn failed_record_is_replaced_by_later_success() {
    let dir = TempDir::new().unwrap();
    let store = open(&store_path(&dir));
    let target = key("B", Channel::WhatsApp);
    store.record(&DispatchRecord::failed(target.clone(), at(1), 4, "timeout")).unwrap();
    store.record(&DispatchRecord::pending(target.clone(), at(2))).unwrap();
    assert_eq!(store.get(&target).unwrap().unwrap().status, DispatchStatus::Pending);
    store.record(&DispatchRecord::sent(target.clone(), at(3), 1)).unwrap();

    let record = store.get(&target).unwrap().unwrap();
    assert_eq!(record.status, DispatchStatus::Sent);
    assert_eq!(record.error, None);
}

#[test]
fn delete_journal_mode_is_supported() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::new(store_path(&dir));
    config.journal_mode = SqliteStoreMode::Delete;
    let store = SqliteDispatchStore::new(&config).unwrap();
    store.record(&DispatchRecord::sent(key("A", Channel::Email), at(1), 1)).unwrap();
    assert!(store.has_sent(&key("A", Channel::Email)).unwrap());
}

// ============================================================================
// SECTION: Fail-Closed Opens
// ============================================================================

#[test]
fn foreign_file_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dispatch.sqlite");
    std::fs::write(&path, "this is not a database file\n".repeat(256)).unwrap();

    let Err(err) = SqliteDispatchStore::new(&SqliteStoreConfig::new(&path)) else {
        panic!("foreign file must not open");
    };
    assert!(matches!(err, SqliteStoreError::Corrupt(_)), "unexpected error: {err:?}");
    assert!(matches!(StateStoreError::from(err), StateStoreError::Corrupt(_)));
}

#[test]
fn unknown_schema_version_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    drop(open(&path));
    let connection = rusqlite::Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    drop(connection);

    let Err(err) = SqliteDispatchStore::new(&SqliteStoreConfig::new(&path)) else {
        panic!("unknown version must not open");
    };
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)), "unexpected error: {err:?}");
}

#[test]
fn readiness_detects_version_change_after_open() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let store = open(&path);
    let connection = rusqlite::Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 7", []).unwrap();
    drop(connection);

    assert!(matches!(store.readiness(), Err(StateStoreError::VersionMismatch(_))));
}

#[test]
fn damaged_row_is_reported_not_skipped() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let store = open(&path);
    let target = key("A", Channel::Email);
    store.record(&DispatchRecord::sent(target.clone(), at(1), 1)).unwrap();
    let connection = rusqlite::Connection::open(&path).unwrap();
    connection.execute("UPDATE dispatch_records SET status = 'delivered?'", []).unwrap();
    drop(connection);

    assert!(matches!(store.has_sent(&target), Err(StateStoreError::Corrupt(_))));
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = SqliteDispatchStore::new(&SqliteStoreConfig::new(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn concurrent_writers_share_one_store() {
    let dir = TempDir::new().unwrap();
    let store = open(&store_path(&dir));
    std::thread::scope(|scope| {
        for worker in 0 .. 8 {
            let store = store.clone();
            scope.spawn(move || {
                for item in 0 .. 10 {
                    let target = key(&format!("R{worker}-{item}"), Channel::Email);
                    store.record(&DispatchRecord::pending(target.clone(), at(1))).unwrap();
                    store.record(&DispatchRecord::sent(target, at(2), 1)).unwrap();
                }
            });
        }
    });
    let records = store.records().unwrap();
    assert_eq!(records.len(), 80);
    assert!(records.iter().all(|record| record.status == DispatchStatus::Sent));
}

// ============================================================================
// SECTION: Orchestrated Reruns
// ============================================================================

#[derive(Clone, Default)]
struct CountingSender {
    calls: Arc<Mutex<usize>>,
}

impl ChannelSender for CountingSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn send(&self, _: &[String], _: &Message, _: &Credential) -> SendOutcome {
        *self.calls.lock().unwrap() += 1;
        SendOutcome::delivered(1)
    }
}

struct StaticCredentials;

impl CredentialProvider for StaticCredentials {
    fn get(&self, _: Channel) -> Result<Credential, AuthenticationError> {
        Ok(Credential::new("alerts@x.com", "secret"))
    }

    fn invalidate(&self, _: Channel) {}
}

struct EpochClock;

impl Clock for EpochClock {
    fn now(&self) -> Timestamp {
        at(1_700_000_000_000)
    }
}

#[test]
fn rerun_against_reopened_store_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let recipients = dir.path().join("recipients.csv");
    std::fs::write(
        &recipients,
        "name,email,whatsapp,notify_email,notify_whatsapp\nA,a@x.com,,yes,no\nB,b@x.com,,yes,no\n",
    )
    .unwrap();
    let forecasts = dir.path().join("forecasts");
    std::fs::create_dir_all(&forecasts).unwrap();
    std::fs::write(forecasts.join("f.csv"), "site,timestamp,level\nS1,2025-01-01,HIGH\n").unwrap();
    let ingestor = ForecastIngestor::new(forecasts.clone());
    let sender = CountingSender::default();

    for expected_sent in [2, 0] {
        let store = open(&store_path(&dir));
        let report = DispatchOrchestrator::new(
            store,
            StaticCredentials,
            EpochClock,
            OrchestratorConfig::default(),
        )
        .with_sender(sender.clone())
        .run(&recipients, &ingestor);
        assert!(report.is_done());
        assert_eq!(report.sent, expected_sent);
        assert_eq!(report.skipped, 2 - expected_sent);
    }
    assert_eq!(*sender.calls.lock().unwrap(), 2);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

fn status_strategy() -> impl Strategy<Value = DispatchStatus> {
    prop_oneof![
        Just(DispatchStatus::Pending),
        Just(DispatchStatus::Sent),
        Just(DispatchStatus::Failed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn stored_status_follows_the_sent_guard(writes in proptest::collection::vec(status_strategy(), 1 .. 12)) {
        let dir = TempDir::new().unwrap();
        let store = open(&store_path(&dir));
        let target = key("A", Channel::Email);
        let mut expected: Option<DispatchStatus> = None;
        for (index, status) in writes.iter().enumerate() {
            let millis = i64::try_from(index).unwrap();
            let record = match status {
                DispatchStatus::Pending => DispatchRecord::pending(target.clone(), at(millis)),
                DispatchStatus::Sent => DispatchRecord::sent(target.clone(), at(millis), 1),
                DispatchStatus::Failed => DispatchRecord::failed(target.clone(), at(millis), 1, "x"),
            };
            store.record(&record).unwrap();
            if expected != Some(DispatchStatus::Sent) {
                expected = Some(*status);
            }
        }
        prop_assert_eq!(store.get(&target).unwrap().map(|record| record.status), expected);
    }
}
