// crates/flood-alert-core/src/core/mod.rs
// ============================================================================
// Module: Flood Alert Core Types
// Description: Canonical data model for the alert dispatch engine.
// Purpose: Provide stable, serializable types shared by every component.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types describe recipients, forecast records, dispatch records, and run
//! reports. Recipients and forecasts are read-only snapshots reloaded every
//! run; dispatch records are the only state that persists across runs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod channel;
pub mod dispatch;
pub mod forecast;
pub mod identifiers;
pub mod message;
pub mod recipient;
pub mod report;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use channel::Channel;
pub use channel::UnknownChannel;
pub use dispatch::DispatchKey;
pub use dispatch::DispatchRecord;
pub use dispatch::DispatchStatus;
pub use forecast::ForecastKey;
pub use forecast::ForecastRecord;
pub use forecast::Severity;
pub use forecast::THRESHOLD_LEVELS;
pub use forecast::UNKNOWN_LEVEL;
pub use identifiers::RecipientId;
pub use identifiers::SiteId;
pub use identifiers::SourceId;
pub use message::Message;
pub use recipient::Recipient;
pub use recipient::RecipientError;
pub use recipient::SiteFilter;
pub use report::AbortKind;
pub use report::FileFailure;
pub use report::NotificationFailure;
pub use report::RunAbort;
pub use report::RunPhase;
pub use report::RunReport;
pub use report::SkippedChannel;
pub use time::ForecastTime;
pub use time::TimeParseError;
pub use time::Timestamp;
