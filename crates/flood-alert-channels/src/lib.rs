// crates/flood-alert-channels/src/lib.rs
// ============================================================================
// Module: Flood Alert Channels
// Description: Channel senders for email (SMTP) and WhatsApp (HTTP).
// Purpose: Deliver composed notifications and classify transport failures.
// Dependencies: flood-alert-core, lettre, reqwest
// ============================================================================

//! ## Overview
//! This crate implements [`ChannelSender`] for the two supported channels.
//! Each sender owns a [`RetryPolicy`]: transient failures (timeouts,
//! throttling, server errors) are retried with capped exponential backoff,
//! while permanent failures and credential rejections are reported at once so
//! the orchestrator can decide what to do next.
//!
//! [`ChannelSender`]: flood_alert_core::ChannelSender

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod email;
pub mod retry;
pub mod whatsapp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing a sender.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Sender configuration is invalid.
    #[error("channel config error: {0}")]
    Config(String),
    /// Transport client could not be built.
    #[error("channel client error: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use email::EmailSender;
pub use email::EmailSenderConfig;
pub use email::MailTransport;
pub use email::SmtpMailTransport;
pub use email::SmtpTls;
pub use retry::RetryPolicy;
pub use whatsapp::WhatsAppSender;
pub use whatsapp::WhatsAppSenderConfig;
