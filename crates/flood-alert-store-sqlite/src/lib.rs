// crates/flood-alert-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Dispatch State Store
// Description: Durable DispatchStateStore backend using SQLite.
// Purpose: Remember delivered notifications across runs.
// Dependencies: flood-alert-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`DispatchStateStore`] implementation
//! that records one row per dispatch key. A row in status `sent` is never
//! replaced, which is what makes reruns idempotent. Database contents are
//! treated as untrusted and fail closed on corruption.
//!
//! [`DispatchStateStore`]: flood_alert_core::DispatchStateStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteDispatchStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
