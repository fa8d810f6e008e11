// crates/flood-alert-core/src/core/channel.rs
// ============================================================================
// Module: Flood Alert Channels
// Description: Delivery channel enumeration shared by every component.
// Purpose: Name the transports a notification can travel over.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Channel`] is a delivery mechanism with its own transport, credential,
//! and message format. Ordering is stable (email before WhatsApp) and is used
//! as the last component of the dispatch ordering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Channel
// ============================================================================

/// Notification delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// SMTP email delivery.
    Email,
    /// WhatsApp text message delivery.
    #[serde(rename = "whatsapp")]
    WhatsApp,
}

impl Channel {
    /// All channels in dispatch order.
    pub const ALL: [Self; 2] = [Self::Email, Self::WhatsApp];

    /// Returns the stable lowercase label used in files and the state store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::WhatsApp => "whatsapp",
        }
    }

    /// Returns true when messages on this channel carry a subject line.
    #[must_use]
    pub const fn supports_subject(self) -> bool {
        matches!(self, Self::Email)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a channel label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel: {0}")]
pub struct UnknownChannel(pub String);

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "whatsapp" => Ok(Self::WhatsApp),
            other => Err(UnknownChannel(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
