// crates/flood-alert-core/src/runtime/mod.rs
// ============================================================================
// Module: Flood Alert Runtime
// Description: Loading, composition, state, and orchestration of a run.
// Purpose: Implement the dispatch engine on top of the core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime components are synchronous and side-effect free apart from the
//! file reads they are asked to perform and the interfaces they are handed.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod composer;
pub mod ingest;
pub mod orchestrator;
pub mod registry;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use composer::DEFAULT_TITLE;
pub use composer::NotificationComposer;
pub use composer::title_case;
pub use ingest::ForecastFile;
pub use ingest::ForecastIngestor;
pub use ingest::ForecastScan;
pub use ingest::ParseError;
pub use ingest::parse_forecast_table;
pub use orchestrator::CredentialFailurePolicy;
pub use orchestrator::DispatchOrchestrator;
pub use orchestrator::MAX_WORKERS;
pub use orchestrator::OrchestratorConfig;
pub use registry::RecipientRegistry;
pub use registry::RegistryError;
pub use store::InMemoryDispatchStore;
