// crates/flood-alert-credentials/src/lib.rs
// ============================================================================
// Module: Flood Alert Credentials
// Description: Credential resolution backed by an encrypted cache.
// Purpose: Supply channel credentials without storing secrets in plaintext.
// Dependencies: flood-alert-core, ring, base64, serde_json
// ============================================================================

//! ## Overview
//! [`CredentialManager`] implements [`CredentialProvider`]. It serves cached
//! credentials from an AES-256-GCM encrypted JSON file, falls back to an
//! interactive [`Prompt`] when the cache has no valid entry, and reports
//! [`AuthenticationError::NonInteractive`] when prompting is impossible.
//!
//! [`CredentialProvider`]: flood_alert_core::CredentialProvider
//! [`AuthenticationError::NonInteractive`]: flood_alert_core::AuthenticationError::NonInteractive

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cipher;
pub mod manager;
pub mod prompt;
pub mod store;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the encrypted credential cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialStoreError {
    /// File system failure.
    #[error("credential store io error: {0}")]
    Io(String),
    /// Cache or key file content is malformed.
    #[error("credential store corrupt: {0}")]
    Corrupt(String),
    /// Encryption or decryption failed.
    #[error("credential store crypto error: {0}")]
    Crypto(String),
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cipher::SecretCipher;
pub use manager::CredentialManager;
pub use manager::CredentialManagerConfig;
pub use prompt::NonInteractivePrompt;
pub use prompt::Prompt;
pub use prompt::TerminalPrompt;
pub use store::EncryptedCredentialStore;
pub use store::StoredCredential;
