// crates/flood-alert-config/src/lib.rs
// ============================================================================
// Module: Flood Alert Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for flood-alert.toml semantics.
// Dependencies: flood-alert-core, flood-alert-channels, serde, toml
// ============================================================================

//! ## Overview
//! `flood-alert-config` defines the `flood-alert.toml` model. Loading is
//! strict and fail-closed, and the model converts into the settings types of
//! the store, channel, credential, and orchestrator crates so the binary only
//! wires components together.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
