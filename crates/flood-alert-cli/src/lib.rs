// crates/flood-alert-cli/src/lib.rs
// ============================================================================
// Module: Flood Alert CLI Library
// Description: Logging bootstrap, run wiring, and report rendering.
// Purpose: Keep the binary entry point a thin command dispatcher.
// Dependencies: flood-alert-*, tracing-subscriber, serde_json
// ============================================================================

//! ## Overview
//! Helpers shared by the `flood-alert` binary. [`runner`] builds the
//! production component graph from a loaded configuration, [`report`]
//! renders run reports for stdout, and [`logging`] installs the stderr
//! subscriber.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod logging;
pub mod report;
pub mod runner;
