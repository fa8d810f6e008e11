// crates/flood-alert-channels/src/whatsapp.rs
// ============================================================================
// Module: WhatsApp Sender
// Description: WhatsApp Cloud API delivery over blocking HTTP.
// Purpose: Send compact text notifications to a recipient's phone number.
// Dependencies: flood-alert-core, reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`WhatsAppSender`] posts a text message to
//! `{api_base_url}/{phone_number_id}/messages` with the channel credential as
//! a bearer token. Only the first listed number receives the message.
//!
//! Responses are classified by status: `2xx` is delivered, `401`/`403`
//! reject the credential, `408`, `429` and `5xx` are transient, any other
//! status is permanent. Timeouts and connection errors are transient.
//! Redirects are never followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use flood_alert_core::Channel;
use flood_alert_core::ChannelSender;
use flood_alert_core::Credential;
use flood_alert_core::FailureKind;
use flood_alert_core::Message;
use flood_alert_core::SendFailure;
use flood_alert_core::SendOutcome;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::json;
use tracing::debug;

use crate::ChannelError;
use crate::retry::RetryPolicy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User agent for outbound requests.
const USER_AGENT: &str = concat!("flood-alert/", env!("CARGO_PKG_VERSION"));
/// Maximum response body bytes kept for error details.
const MAX_ERROR_BODY_BYTES: u64 = 512;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// WhatsApp Cloud API sender settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppSenderConfig {
    /// API base URL, e.g. `https://graph.facebook.com/v21.0`.
    pub api_base_url: String,
    /// Business phone number identifier.
    pub phone_number_id: String,
    /// Per-attempt request timeout.
    pub timeout_ms: u64,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

// ============================================================================
// SECTION: Sender
// ============================================================================

/// WhatsApp channel sender.
pub struct WhatsAppSender {
    /// Fully resolved messages endpoint.
    endpoint: Url,
    /// HTTP client with timeout and redirect policy applied.
    client: Client,
    /// Retry policy for transient failures.
    retry: RetryPolicy,
}

impl WhatsAppSender {
    /// Creates a WhatsApp sender.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] for an unusable base URL or phone
    /// number id, and [`ChannelError::Client`] when the HTTP client cannot be
    /// built.
    pub fn new(config: &WhatsAppSenderConfig) -> Result<Self, ChannelError> {
        let phone_number_id = config.phone_number_id.trim();
        if phone_number_id.is_empty() || phone_number_id.contains('/') {
            return Err(ChannelError::Config(format!(
                "invalid whatsapp phone_number_id `{}`",
                config.phone_number_id
            )));
        }
        let base = config.api_base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/{phone_number_id}/messages"))
            .map_err(|err| ChannelError::Config(format!("invalid whatsapp api_base_url: {err}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ChannelError::Config(format!(
                "unsupported whatsapp api scheme: {}",
                endpoint.scheme()
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|err| ChannelError::Client(format!("http client build failed: {err}")))?;
        Ok(Self {
            endpoint,
            client,
            retry: config.retry,
        })
    }

    /// Returns the messages endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Performs one POST attempt.
    fn post(&self, payload: &[u8], credential: &Credential) -> Result<(), SendFailure> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&credential.secret)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .map_err(|err| SendFailure {
                kind: if err.is_builder() { FailureKind::Permanent } else { FailureKind::Transient },
                detail: format!("whatsapp request failed: {err}"),
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let mut body = String::new();
        let body = match response.take(MAX_ERROR_BODY_BYTES).read_to_string(&mut body) {
            Ok(_) => body.trim().to_string(),
            Err(err) => {
                debug!(status = status.as_u16(), error = %err, "whatsapp error body unreadable");
                format!("<body unreadable: {err}>")
            }
        };
        Err(SendFailure {
            kind: classify_status(status),
            detail: format!("whatsapp api returned HTTP {}: {body}", status.as_u16()),
        })
    }
}

impl ChannelSender for WhatsAppSender {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    fn send(&self, addresses: &[String], message: &Message, credential: &Credential) -> SendOutcome {
        let Some(number) = addresses.first().map(|number| normalize_number(number)) else {
            return SendOutcome::failed(FailureKind::Permanent, "no whatsapp number", 0);
        };
        if number.is_empty() {
            return SendOutcome::failed(FailureKind::Permanent, "empty whatsapp number", 0);
        }
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": number,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": message.body,
            },
        });
        let payload = payload.to_string().into_bytes();
        self.retry.run(Channel::WhatsApp, |attempt| {
            debug!(channel = %Channel::WhatsApp, attempt, "posting whatsapp message");
            self.post(&payload, credential)
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps an HTTP status to a failure kind.
fn classify_status(status: StatusCode) -> FailureKind {
    match status.as_u16() {
        401 | 403 => FailureKind::CredentialRejected,
        408 | 429 => FailureKind::Transient,
        code if code >= 500 => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}

/// Strips formatting characters from a phone number, keeping digits only.
fn normalize_number(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use flood_alert_core::FailureKind;
    use reqwest::StatusCode;

    use super::classify_status;
    use super::normalize_number;

    #[test]
    fn statuses_classify_by_meaning() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), FailureKind::CredentialRejected);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), FailureKind::CredentialRejected);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), FailureKind::Transient);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), FailureKind::Transient);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), FailureKind::Permanent);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), FailureKind::Permanent);
    }

    #[test]
    fn numbers_keep_digits_only() {
        assert_eq!(normalize_number("+1 (555) 010-0"), "15550100");
        assert_eq!(normalize_number(" +977 9800000000 "), "9779800000000");
    }
}
