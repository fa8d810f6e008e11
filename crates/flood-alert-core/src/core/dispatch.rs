// crates/flood-alert-core/src/core/dispatch.rs
// ============================================================================
// Module: Flood Alert Dispatch Records
// Description: Dispatch keys and the durable per-notification outcome log.
// Purpose: Define the at-most-once delivery unit and its recorded status.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DispatchKey`] is the (forecast key, recipient, channel) triple used to
//! deduplicate sends. A [`DispatchRecord`] is the last known outcome for a key.
//! Invariants:
//! - At most one record exists per key, so at most one `sent` record exists
//!   per key.
//! - A `sent` record is terminal: stores must never overwrite it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::channel::Channel;
use crate::core::forecast::ForecastKey;
use crate::core::identifiers::RecipientId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Dispatch Key
// ============================================================================

/// Deduplication key for a single notification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DispatchKey {
    /// Forecast idempotency key.
    pub forecast: ForecastKey,
    /// Recipient identity.
    pub recipient: RecipientId,
    /// Delivery channel.
    pub channel: Channel,
}

impl DispatchKey {
    /// Creates a dispatch key.
    #[must_use]
    pub const fn new(forecast: ForecastKey, recipient: RecipientId, channel: Channel) -> Self {
        Self {
            forecast,
            recipient,
            channel,
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.forecast, self.recipient, self.channel)
    }
}

// ============================================================================
// SECTION: Dispatch Status
// ============================================================================

/// Recorded delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// A send is in flight (or was interrupted before its outcome was recorded).
    Pending,
    /// The notification was delivered.
    Sent,
    /// The last attempt failed.
    Failed,
}

impl DispatchStatus {
    /// Returns the stable label stored on disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// Returns true when a record with this status may be replaced.
    #[must_use]
    pub const fn is_overwritable(self) -> bool {
        !matches!(self, Self::Sent)
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown dispatch status: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Dispatch Record
// ============================================================================

/// Durable outcome for a dispatch key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Dispatch key.
    pub key: DispatchKey,
    /// Recorded status.
    pub status: DispatchStatus,
    /// Time the record was written.
    pub recorded_at: Timestamp,
    /// Transport attempts made for the recorded outcome.
    pub attempts: u32,
    /// Failure detail when `status` is `failed`.
    pub error: Option<String>,
}

impl DispatchRecord {
    /// Builds a `pending` record written before a send begins.
    #[must_use]
    pub const fn pending(key: DispatchKey, recorded_at: Timestamp) -> Self {
        Self {
            key,
            status: DispatchStatus::Pending,
            recorded_at,
            attempts: 0,
            error: None,
        }
    }

    /// Builds a `sent` record.
    #[must_use]
    pub const fn sent(key: DispatchKey, recorded_at: Timestamp, attempts: u32) -> Self {
        Self {
            key,
            status: DispatchStatus::Sent,
            recorded_at,
            attempts,
            error: None,
        }
    }

    /// Builds a `failed` record with an error detail.
    #[must_use]
    pub fn failed(
        key: DispatchKey,
        recorded_at: Timestamp,
        attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            key,
            status: DispatchStatus::Failed,
            recorded_at,
            attempts,
            error: Some(error.into()),
        }
    }
}
