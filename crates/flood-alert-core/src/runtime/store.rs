// crates/flood-alert-core/src/runtime/store.rs
// ============================================================================
// Module: Flood Alert In-Memory Dispatch Store
// Description: Volatile dispatch state store for tests and dry runs.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryDispatchStore`] implements [`DispatchStateStore`] over a mutex
//! protected map. It honours the same rules as the durable store (a `sent`
//! record is never replaced) but forgets everything when dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::dispatch::DispatchKey;
use crate::core::dispatch::DispatchRecord;
use crate::core::dispatch::DispatchStatus;
use crate::interfaces::DispatchStateStore;
use crate::interfaces::StateStoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory dispatch state store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDispatchStore {
    /// Records keyed by dispatch key.
    records: Arc<Mutex<BTreeMap<DispatchKey, DispatchRecord>>>,
}

impl InMemoryDispatchStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record in key order.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the store mutex is poisoned.
    pub fn records(&self) -> Result<Vec<DispatchRecord>, StateStoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Counts records with the given status.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the store mutex is poisoned.
    pub fn count(&self, status: DispatchStatus) -> Result<usize, StateStoreError> {
        Ok(self.lock()?.values().filter(|record| record.status == status).count())
    }

    /// Locks the record map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<DispatchKey, DispatchRecord>>, StateStoreError> {
        self.records
            .lock()
            .map_err(|_| StateStoreError::Io("dispatch state store mutex poisoned".to_string()))
    }
}

impl DispatchStateStore for InMemoryDispatchStore {
    fn has_sent(&self, key: &DispatchKey) -> Result<bool, StateStoreError> {
        Ok(self.lock()?.get(key).is_some_and(|record| record.status == DispatchStatus::Sent))
    }

    fn record(&self, record: &DispatchRecord) -> Result<(), StateStoreError> {
        let mut guard = self.lock()?;
        if guard.get(&record.key).is_some_and(|existing| !existing.status.is_overwritable()) {
            return Ok(());
        }
        guard.insert(record.key.clone(), record.clone());
        drop(guard);
        Ok(())
    }

    fn get(&self, key: &DispatchKey) -> Result<Option<DispatchRecord>, StateStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn readiness(&self) -> Result<(), StateStoreError> {
        self.lock().map(|_| ())
    }
}
