// crates/flood-alert-core/src/core/message.rs
// ============================================================================
// Module: Flood Alert Messages
// Description: Channel-specific notification content.
// Purpose: Carry composed content from the composer to channel senders.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Message`] is the rendered content for a single channel. Channels
//! without a subject concept receive `subject: None`.

use serde::Deserialize;
use serde::Serialize;

/// Composed notification content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Optional subject line (email only).
    pub subject: Option<String>,
    /// Message body text.
    pub body: String,
}
