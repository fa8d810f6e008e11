// crates/flood-alert-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Dispatch State Store
// Description: Durable DispatchStateStore backed by SQLite.
// Purpose: Persist per-notification delivery status with a versioned schema.
// Dependencies: flood-alert-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements a durable [`DispatchStateStore`] using `SQLite`.
//! Each dispatch key maps to exactly one row in `dispatch_records`; writes are
//! upserts guarded so a row already in status `sent` is left untouched.
//! Opening a file that is not a database, or one written by an unknown schema
//! version, fails closed with [`SqliteStoreError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use flood_alert_core::Channel;
use flood_alert_core::DispatchKey;
use flood_alert_core::DispatchRecord;
use flood_alert_core::DispatchStateStore;
use flood_alert_core::DispatchStatus;
use flood_alert_core::ForecastKey;
use flood_alert_core::ForecastTime;
use flood_alert_core::RecipientId;
use flood_alert_core::SiteId;
use flood_alert_core::SourceId;
use flood_alert_core::StateStoreError;
use flood_alert_core::Timestamp;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Columns selected when reading a record, in row order.
const RECORD_COLUMNS: &str =
    "source, site, forecast_time, recipient, channel, status, recorded_at, attempts, error";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` dispatch state store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default tuning for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store file is not a database or is damaged.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => {
                Self::Corrupt(error.to_string())
            }
            _ => Self::Db(error.to_string()),
        }
    }
}

impl From<SqliteStoreError> for StateStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed dispatch state store.
#[derive(Clone)]
pub struct SqliteDispatchStore {
    /// Database file location, kept for diagnostics.
    path: PathBuf,
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDispatchStore {
    /// Opens (creating if needed) an `SQLite`-backed dispatch state store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened, is not
    /// a database, or carries an unsupported schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        debug!(path = %config.path.display(), "dispatch state store opened");
        Ok(Self {
            path: config.path.clone(),
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every stored record ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a row is invalid.
    pub fn records(&self) -> Result<Vec<DispatchRecord>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM dispatch_records ORDER BY source, site, forecast_time, \
             recipient, channel"
        ))?;
        let rows = statement.query_map(params![], RawRecord::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Loads the record for a key.
    fn load_record(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, SqliteStoreError> {
        let raw = {
            let guard = self.lock()?;
            let raw = guard
                .query_row(
                    &format!(
                        "SELECT {RECORD_COLUMNS} FROM dispatch_records WHERE source = ?1 AND \
                         site = ?2 AND forecast_time = ?3 AND recipient = ?4 AND channel = ?5"
                    ),
                    params![
                        key.forecast.source.as_str(),
                        key.forecast.site.as_str(),
                        key.forecast.timestamp.canonical(),
                        key.recipient.as_str(),
                        key.channel.as_str()
                    ],
                    RawRecord::from_row,
                )
                .optional()?;
            drop(guard);
            raw
        };
        raw.map(RawRecord::into_record).transpose()
    }

    /// Upserts a record unless the stored row is already `sent`.
    fn save_record(&self, record: &DispatchRecord) -> Result<(), SqliteStoreError> {
        let attempts = i64::from(record.attempts);
        let mut guard = self.lock()?;
        let tx = guard.transaction()?;
        let changed = tx.execute(
            "INSERT INTO dispatch_records (source, site, forecast_time, recipient, channel, \
             status, recorded_at, attempts, error) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) ON \
             CONFLICT(source, site, forecast_time, recipient, channel) DO UPDATE SET status = \
             excluded.status, recorded_at = excluded.recorded_at, attempts = excluded.attempts, \
             error = excluded.error WHERE dispatch_records.status != 'sent'",
            params![
                record.key.forecast.source.as_str(),
                record.key.forecast.site.as_str(),
                record.key.forecast.timestamp.canonical(),
                record.key.recipient.as_str(),
                record.key.channel.as_str(),
                record.status.as_str(),
                record.recorded_at.as_unix_millis(),
                attempts,
                record.error.as_deref()
            ],
        )?;
        tx.commit()?;
        drop(guard);
        if changed == 0 {
            debug!(key = %record.key, status = %record.status, "sent record kept; write ignored");
        }
        Ok(())
    }

    /// Checks that the schema is still present and at the expected version.
    fn check_ready(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        let version: Option<i64> = guard
            .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
            .optional()?;
        drop(guard);
        match version {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => {
                Err(SqliteStoreError::VersionMismatch(format!("unsupported schema version: {other}")))
            }
            None => Err(SqliteStoreError::Corrupt("schema version row missing".to_string())),
        }
    }
}

impl DispatchStateStore for SqliteDispatchStore {
    fn has_sent(&self, key: &DispatchKey) -> Result<bool, StateStoreError> {
        let record = self.load_record(key).map_err(StateStoreError::from)?;
        Ok(record.is_some_and(|record| record.status == DispatchStatus::Sent))
    }

    fn record(&self, record: &DispatchRecord) -> Result<(), StateStoreError> {
        self.save_record(record).map_err(StateStoreError::from)
    }

    fn get(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, StateStoreError> {
        self.load_record(key).map_err(StateStoreError::from)
    }

    fn readiness(&self) -> Result<(), StateStoreError> {
        self.check_ready().map_err(StateStoreError::from)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Untyped row contents prior to validation.
struct RawRecord {
    /// Source file column.
    source: String,
    /// Site column.
    site: String,
    /// Canonical forecast time column.
    forecast_time: String,
    /// Recipient column.
    recipient: String,
    /// Channel column.
    channel: String,
    /// Status column.
    status: String,
    /// Unix millis of the write.
    recorded_at: i64,
    /// Attempt counter.
    attempts: i64,
    /// Last error detail.
    error: Option<String>,
}

impl RawRecord {
    /// Reads the columns listed in [`RECORD_COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            source: row.get(0)?,
            site: row.get(1)?,
            forecast_time: row.get(2)?,
            recipient: row.get(3)?,
            channel: row.get(4)?,
            status: row.get(5)?,
            recorded_at: row.get(6)?,
            attempts: row.get(7)?,
            error: row.get(8)?,
        })
    }

    /// Validates the row into a typed record.
    fn into_record(self) -> Result<DispatchRecord, SqliteStoreError> {
        let timestamp = ForecastTime::parse(&self.forecast_time).map_err(|err| {
            SqliteStoreError::Invalid(format!("stored forecast time is invalid: {err}"))
        })?;
        let channel: Channel = self.channel.parse().map_err(|err| {
            SqliteStoreError::Invalid(format!("stored channel is invalid: {err}"))
        })?;
        let status: DispatchStatus = self
            .status
            .parse()
            .map_err(|err: String| SqliteStoreError::Corrupt(format!("stored status: {err}")))?;
        let attempts = u32::try_from(self.attempts).map_err(|_| {
            SqliteStoreError::Invalid(format!("attempt counter out of range: {}", self.attempts))
        })?;
        let forecast = ForecastKey {
            source: SourceId::new(self.source),
            site: SiteId::new(self.site),
            timestamp,
        };
        Ok(DispatchRecord {
            key: DispatchKey::new(forecast, RecipientId::new(self.recipient), channel),
            status,
            recorded_at: Timestamp::from_unix_millis(self.recorded_at),
            attempts,
            error: self.error,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS dispatch_records (
                    source TEXT NOT NULL,
                    site TEXT NOT NULL,
                    forecast_time TEXT NOT NULL,
                    recipient TEXT NOT NULL,
                    channel TEXT NOT NULL,
                    status TEXT NOT NULL,
                    recorded_at INTEGER NOT NULL,
                    attempts INTEGER NOT NULL,
                    error TEXT,
                    PRIMARY KEY (source, site, forecast_time, recipient, channel)
                );
                CREATE INDEX IF NOT EXISTS idx_dispatch_records_status
                    ON dispatch_records (status);",
            )?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}
