// crates/flood-alert-core/src/interfaces/mod.rs
// ============================================================================
// Module: Flood Alert Interfaces
// Description: Transport, credential, state, and clock seams of the engine.
// Purpose: Define the contract surfaces used by the dispatch orchestrator.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces keep the orchestrator independent of SMTP, HTTP, SQLite, and the
//! terminal. Implementations must fail closed: a state store that cannot
//! answer `has_sent` reliably returns an error instead of `false`, and a
//! credential provider that cannot prompt returns an error instead of hanging.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::channel::Channel;
use crate::core::dispatch::DispatchKey;
use crate::core::dispatch::DispatchRecord;
use crate::core::message::Message;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Channel Sender
// ============================================================================

/// Classification of a send failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network timeout, throttling, or server-side error; retry budget exhausted.
    Transient,
    /// Invalid address or request the transport will never accept.
    Permanent,
    /// The transport rejected the credential.
    CredentialRejected,
}

impl FailureKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::CredentialRejected => "credential_rejected",
        }
    }
}

/// Failure detail surfaced by a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub detail: String,
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// Result of a single logical send, after the sender's own retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    /// True when the transport accepted the message.
    pub success: bool,
    /// Failure detail when `success` is false.
    pub failure: Option<SendFailure>,
    /// Transport attempts made.
    pub attempts: u32,
}

impl SendOutcome {
    /// Builds a successful outcome.
    #[must_use]
    pub const fn delivered(attempts: u32) -> Self {
        Self {
            success: true,
            failure: None,
            attempts,
        }
    }

    /// Builds a failed outcome.
    #[must_use]
    pub fn failed(kind: FailureKind, detail: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: false,
            failure: Some(SendFailure {
                kind,
                detail: detail.into(),
            }),
            attempts,
        }
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|failure| failure.kind)
    }

    /// Returns the error detail string, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Delivery transport for one channel.
///
/// Senders never return errors: every failure becomes a [`SendOutcome`] so
/// the orchestrator can continue with other recipients and channels. Each
/// sender owns its retry policy for transient failures.
pub trait ChannelSender: Send + Sync {
    /// Returns the channel this sender delivers on.
    fn channel(&self) -> Channel;

    /// Sends a message to the recipient's addresses for this channel.
    fn send(&self, addresses: &[String], message: &Message, credential: &Credential)
    -> SendOutcome;
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Sending credential for one channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account name (SMTP username); empty for token-only channels.
    pub account: String,
    /// Secret (password or API token).
    pub secret: String,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Credential resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// No valid cached credential and prompting is not possible.
    #[error("no valid {0} credential cached and interactive prompting is unavailable")]
    NonInteractive(Channel),
    /// The interactive prompt failed or was cancelled.
    #[error("{channel} credential prompt failed: {message}")]
    Prompt {
        /// Channel being resolved.
        channel: Channel,
        /// Failure detail.
        message: String,
    },
    /// The credential store could not be read or written.
    #[error("{channel} credential store error: {message}")]
    Store {
        /// Channel being resolved.
        channel: Channel,
        /// Failure detail.
        message: String,
    },
    /// The transport rejected a freshly resolved credential.
    #[error("{0} credential rejected by the transport")]
    Rejected(Channel),
}

/// Resolves sending credentials by channel.
pub trait CredentialProvider: Send + Sync {
    /// Returns a credential for the channel, prompting when needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when no valid credential can be obtained.
    fn get(&self, channel: Channel) -> Result<Credential, AuthenticationError>;

    /// Marks the cached credential for the channel as invalid.
    fn invalidate(&self, channel: Channel);
}

// ============================================================================
// SECTION: Dispatch State Store
// ============================================================================

/// Dispatch state store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateStoreError {
    /// Store I/O error.
    #[error("dispatch state store io error: {0}")]
    Io(String),
    /// Store database error.
    #[error("dispatch state store db error: {0}")]
    Db(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("dispatch state store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("dispatch state store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data or input is invalid.
    #[error("dispatch state store invalid data: {0}")]
    Invalid(String),
}

/// Durable log of dispatch outcomes.
///
/// Implementations must never replace a record whose status is `sent`, and
/// must serialize writes for the same key.
pub trait DispatchStateStore: Send + Sync {
    /// Returns true when a `sent` record exists for the key.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the store cannot answer reliably.
    fn has_sent(&self, key: &DispatchKey) -> Result<bool, StateStoreError>;

    /// Upserts a record; a stored `sent` record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the write fails.
    fn record(&self, record: &DispatchRecord) -> Result<(), StateStoreError>;

    /// Loads the record for a key.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the read fails.
    fn get(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, StateStoreError>;

    /// Verifies the store is usable before a run starts dispatching.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the store is unavailable or corrupt.
    fn readiness(&self) -> Result<(), StateStoreError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of record timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
