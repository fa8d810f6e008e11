// crates/flood-alert-credentials/src/store.rs
// ============================================================================
// Module: Encrypted Credential Store
// Description: JSON credential cache with sealed secrets.
// Purpose: Persist channel credentials between runs.
// Dependencies: flood-alert-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The cache file is a JSON document keyed by channel label. Account names
//! and timestamps are stored in the clear; secrets are sealed with the
//! [`SecretCipher`]. A missing file is an empty cache. A file that does not
//! parse, or a secret that does not open, is an error rather than an empty
//! cache, so a damaged cache is never silently replaced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use flood_alert_core::Channel;
use flood_alert_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::CredentialStoreError;
use crate::cipher::SecretCipher;
use crate::cipher::write_private_file;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache file format version.
const FORMAT_VERSION: u32 = 1;

/// Maximum cache file size accepted.
const MAX_STORE_BYTES: u64 = 64 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Decrypted cache entry for one channel.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Account name the secret belongs to.
    pub account: String,
    /// Plaintext secret.
    pub secret: String,
    /// When the entry was written.
    pub stored_at: Timestamp,
    /// When the entry stops being served, if it expires.
    pub expires_at: Option<Timestamp>,
}

impl StoredCredential {
    /// Returns true when the entry is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("account", &self.account)
            .field("secret", &"<redacted>")
            .field("stored_at", &self.stored_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// On-disk document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreFile {
    /// Format version.
    version: u32,
    /// Entries keyed by channel label.
    entries: BTreeMap<String, StoreEntry>,
}

/// On-disk entry with a sealed secret.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreEntry {
    /// Account name.
    account: String,
    /// Sealed secret.
    secret: String,
    /// Unix millis of the write.
    stored_at: i64,
    /// Unix millis of expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Encrypted JSON credential cache.
pub struct EncryptedCredentialStore {
    /// Cache file path.
    path: PathBuf,
    /// Cipher for secrets.
    cipher: SecretCipher,
}

impl EncryptedCredentialStore {
    /// Opens the cache at `store_path`, creating the key file when missing.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the key file cannot be loaded.
    pub fn open(store_path: &Path, key_path: &Path) -> Result<Self, CredentialStoreError> {
        Ok(Self::with_cipher(store_path, SecretCipher::load_or_create(key_path)?))
    }

    /// Opens the cache with an existing cipher.
    #[must_use]
    pub fn with_cipher(store_path: &Path, cipher: SecretCipher) -> Self {
        Self {
            path: store_path.to_path_buf(),
            cipher,
        }
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decrypts every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the file is unreadable, malformed,
    /// or holds secrets that do not open under the current key.
    pub fn load(&self) -> Result<BTreeMap<Channel, StoredCredential>, CredentialStoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let metadata = fs::metadata(&self.path).map_err(|err| self.io_error(&err))?;
        if metadata.len() > MAX_STORE_BYTES {
            return Err(CredentialStoreError::Corrupt(format!(
                "{} exceeds {MAX_STORE_BYTES} bytes",
                self.path.display()
            )));
        }
        let text = fs::read_to_string(&self.path).map_err(|err| self.io_error(&err))?;
        let file: StoreFile = serde_json::from_str(&text).map_err(|err| {
            CredentialStoreError::Corrupt(format!("{}: {err}", self.path.display()))
        })?;
        if file.version != FORMAT_VERSION {
            return Err(CredentialStoreError::Corrupt(format!(
                "unsupported credential store version {}",
                file.version
            )));
        }
        let mut entries = BTreeMap::new();
        for (label, entry) in file.entries {
            let channel: Channel = label
                .parse()
                .map_err(|err| CredentialStoreError::Corrupt(format!("entry `{label}`: {err}")))?;
            entries.insert(
                channel,
                StoredCredential {
                    account: entry.account,
                    secret: self.cipher.open(&entry.secret)?,
                    stored_at: Timestamp::from_unix_millis(entry.stored_at),
                    expires_at: entry.expires_at.map(Timestamp::from_unix_millis),
                },
            );
        }
        Ok(entries)
    }

    /// Encrypts and writes every entry, replacing the file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when sealing or writing fails.
    pub fn save(
        &self,
        entries: &BTreeMap<Channel, StoredCredential>,
    ) -> Result<(), CredentialStoreError> {
        let mut file = StoreFile {
            version: FORMAT_VERSION,
            entries: BTreeMap::new(),
        };
        for (channel, entry) in entries {
            file.entries.insert(
                channel.as_str().to_string(),
                StoreEntry {
                    account: entry.account.clone(),
                    secret: self.cipher.seal(&entry.secret)?,
                    stored_at: entry.stored_at.as_unix_millis(),
                    expires_at: entry.expires_at.map(Timestamp::as_unix_millis),
                },
            );
        }
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|err| CredentialStoreError::Corrupt(err.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        write_private_file(&staging, &json)?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(&err))
    }

    /// Formats an I/O error with the cache path.
    fn io_error(&self, err: &std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Io(format!("{}: {err}", self.path.display()))
    }
}
