// crates/flood-alert-core/src/lib.rs
// ============================================================================
// Module: Flood Alert Core Library
// Description: Public API surface for the flood alert dispatch engine.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Flood alert core relays flood-forecast records to registered recipients
//! over email and WhatsApp. It loads recipient and forecast tables, decides
//! which notifications are new, delivers them through channel senders, and
//! records every outcome in a dispatch state store so repeated scheduled runs
//! never send the same notification twice.
//!
//! Transports, credential storage, and durable state live in sibling crates
//! and plug in through [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuthenticationError;
pub use interfaces::ChannelSender;
pub use interfaces::Clock;
pub use interfaces::Credential;
pub use interfaces::CredentialProvider;
pub use interfaces::DispatchStateStore;
pub use interfaces::FailureKind;
pub use interfaces::SendFailure;
pub use interfaces::SendOutcome;
pub use interfaces::StateStoreError;
pub use runtime::CredentialFailurePolicy;
pub use runtime::DispatchOrchestrator;
pub use runtime::ForecastFile;
pub use runtime::ForecastIngestor;
pub use runtime::ForecastScan;
pub use runtime::InMemoryDispatchStore;
pub use runtime::MAX_WORKERS;
pub use runtime::NotificationComposer;
pub use runtime::OrchestratorConfig;
pub use runtime::ParseError;
pub use runtime::RecipientRegistry;
pub use runtime::RegistryError;
pub use runtime::SystemClock;
