// crates/flood-alert-credentials/src/manager.rs
// ============================================================================
// Module: Credential Manager
// Description: CredentialProvider over the encrypted cache and a prompt.
// Purpose: Resolve, refresh, and persist channel credentials.
// Dependencies: flood-alert-core, tracing
// ============================================================================

//! ## Overview
//! Resolution order for [`CredentialProvider::get`]:
//! 1. a cached entry whose account matches the configured account and which
//!    has not expired;
//! 2. otherwise, when the prompt is interactive, a freshly entered secret,
//!    which is cached and written to disk immediately;
//! 3. otherwise [`AuthenticationError::NonInteractive`].
//!
//! Resolution is serialized by one mutex so concurrent workers never prompt
//! twice for the same channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use flood_alert_core::AuthenticationError;
use flood_alert_core::Channel;
use flood_alert_core::Clock;
use flood_alert_core::Credential;
use flood_alert_core::CredentialProvider;
use flood_alert_core::SystemClock;
use flood_alert_core::Timestamp;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::CredentialStoreError;
use crate::prompt::Prompt;
use crate::store::EncryptedCredentialStore;
use crate::store::StoredCredential;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds per day.
const MILLIS_PER_DAY: i64 = 86_400_000;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Credential manager settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialManagerConfig {
    /// Account name expected for each channel.
    pub accounts: BTreeMap<Channel, String>,
    /// Days a newly stored credential stays valid; `None` never expires.
    pub ttl_days: Option<u32>,
}

// ============================================================================
// SECTION: Manager
// ============================================================================

/// Mutable cache guarded by the manager mutex.
#[derive(Default)]
struct CacheState {
    /// Decrypted entries, loaded lazily.
    entries: Option<BTreeMap<Channel, StoredCredential>>,
    /// True when the in-memory cache differs from disk.
    dirty: bool,
}

/// Resolves channel credentials from cache or prompt.
pub struct CredentialManager {
    /// Encrypted cache.
    store: EncryptedCredentialStore,
    /// Operator prompt.
    prompt: Box<dyn Prompt>,
    /// Clock for expiry.
    clock: Box<dyn Clock>,
    /// Settings.
    config: CredentialManagerConfig,
    /// Cache state.
    state: Mutex<CacheState>,
}

impl CredentialManager {
    /// Creates a manager using the system clock.
    #[must_use]
    pub fn new(
        store: EncryptedCredentialStore,
        prompt: impl Prompt + 'static,
        config: CredentialManagerConfig,
    ) -> Self {
        Self {
            store,
            prompt: Box::new(prompt),
            clock: Box::new(SystemClock),
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Replaces the clock used for expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Returns the configured account for `channel`.
    #[must_use]
    pub fn account(&self, channel: Channel) -> &str {
        self.config.accounts.get(&channel).map_or("", String::as_str)
    }

    /// Stores `secret` for `channel` and writes the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the cache cannot be read or written.
    pub fn set(&self, channel: Channel, secret: &str) -> Result<(), CredentialStoreError> {
        let mut state = self.lock();
        let entry = self.new_entry(channel, secret);
        self.entries(&mut state)?.insert(channel, entry);
        state.dirty = true;
        self.flush(&mut state)?;
        drop(state);
        info!(%channel, "credential stored");
        Ok(())
    }

    /// Removes the cached credential for `channel`; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the cache cannot be read or written.
    pub fn clear(&self, channel: Channel) -> Result<bool, CredentialStoreError> {
        let mut state = self.lock();
        let removed = self.entries(&mut state)?.remove(&channel).is_some();
        if removed {
            state.dirty = true;
            self.flush(&mut state)?;
        }
        drop(state);
        Ok(removed)
    }

    /// Writes pending cache changes to disk.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the cache cannot be written.
    pub fn persist(&self) -> Result<(), CredentialStoreError> {
        let mut state = self.lock();
        self.flush(&mut state)
    }

    /// Locks the cache state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the loaded entries, reading the cache on first use.
    fn entries<'a>(
        &self,
        state: &'a mut CacheState,
    ) -> Result<&'a mut BTreeMap<Channel, StoredCredential>, CredentialStoreError> {
        if state.entries.is_none() {
            state.entries = Some(self.store.load()?);
        }
        Ok(state.entries.get_or_insert_with(BTreeMap::new))
    }

    /// Writes the cache when dirty.
    fn flush(&self, state: &mut CacheState) -> Result<(), CredentialStoreError> {
        if !state.dirty {
            return Ok(());
        }
        if let Some(entries) = &state.entries {
            self.store.save(entries)?;
        }
        state.dirty = false;
        Ok(())
    }

    /// Builds a cache entry stamped with the current time.
    fn new_entry(&self, channel: Channel, secret: &str) -> StoredCredential {
        let now = self.clock.now();
        let expires_at = self.config.ttl_days.map(|days| {
            Timestamp::from_unix_millis(
                now.as_unix_millis().saturating_add(i64::from(days).saturating_mul(MILLIS_PER_DAY)),
            )
        });
        StoredCredential {
            account: self.account(channel).to_string(),
            secret: secret.to_string(),
            stored_at: now,
            expires_at,
        }
    }

    /// Returns a usable cached entry, if any.
    fn usable(&self, channel: Channel, entry: Option<&StoredCredential>) -> Option<Credential> {
        let entry = entry?;
        if entry.account != self.account(channel) {
            debug!(%channel, "cached credential belongs to another account");
            return None;
        }
        if entry.is_expired(self.clock.now()) {
            debug!(%channel, "cached credential expired");
            return None;
        }
        Some(Credential::new(entry.account.clone(), entry.secret.clone()))
    }
}

impl CredentialProvider for CredentialManager {
    fn get(&self, channel: Channel) -> Result<Credential, AuthenticationError> {
        let store_error = |err: CredentialStoreError| AuthenticationError::Store {
            channel,
            message: err.to_string(),
        };
        let mut state = self.lock();
        let entries = self.entries(&mut state).map_err(store_error)?;
        if let Some(credential) = self.usable(channel, entries.get(&channel)) {
            return Ok(credential);
        }
        if !self.prompt.is_interactive() {
            return Err(AuthenticationError::NonInteractive(channel));
        }
        let secret =
            self.prompt.read_secret(channel, self.account(channel)).map_err(|message| {
                AuthenticationError::Prompt {
                    channel,
                    message,
                }
            })?;
        let entry = self.new_entry(channel, &secret);
        let credential = Credential::new(entry.account.clone(), entry.secret.clone());
        entries.insert(channel, entry);
        state.dirty = true;
        self.flush(&mut state).map_err(store_error)?;
        drop(state);
        info!(%channel, "credential entered and cached");
        Ok(credential)
    }

    fn invalidate(&self, channel: Channel) {
        let mut state = self.lock();
        let removed = match self.entries(&mut state) {
            Ok(entries) => entries.remove(&channel).is_some(),
            Err(err) => {
                warn!(%channel, error = %err, "credential cache unreadable during invalidation");
                false
            }
        };
        if removed {
            state.dirty = true;
            if let Err(err) = self.flush(&mut state) {
                warn!(%channel, error = %err, "invalidated credential not written to disk");
            }
        }
        drop(state);
        warn!(%channel, "cached credential invalidated");
    }
}
