// crates/flood-alert-channels/src/email.rs
// ============================================================================
// Module: Email Sender
// Description: SMTP delivery of composed notifications.
// Purpose: Send one message per notification addressed to every recipient address.
// Dependencies: flood-alert-core, lettre, serde, tracing
// ============================================================================

//! ## Overview
//! [`EmailSender`] turns a composed [`Message`] into a plain-text mail with
//! every listed address on the `To` line and hands it to a [`MailTransport`].
//! The production transport, [`SmtpMailTransport`], authenticates with the
//! resolved [`Credential`] on each submission.
//!
//! SMTP reply codes are classified as follows: `530`, `534` and `535` reject
//! the credential, other `5xx` replies and malformed addresses are permanent,
//! and `4xx` replies, timeouts and connection failures are transient.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use flood_alert_core::Channel;
use flood_alert_core::ChannelSender;
use flood_alert_core::Credential;
use flood_alert_core::FailureKind;
use flood_alert_core::Message;
use flood_alert_core::SendFailure;
use flood_alert_core::SendOutcome;
use lettre::SmtpTransport;
use lettre::Transport;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::ChannelError;
use crate::retry::RetryPolicy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// SMTP replies that mean the credential was refused.
const CREDENTIAL_REJECTION_CODES: [u16; 3] = [530, 534, 535];

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection security for the SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmtpTls {
    /// Implicit TLS from the first byte (port 465).
    #[default]
    #[serde(rename = "wrapper")]
    Wrapper,
    /// Plaintext connection upgraded with STARTTLS (port 587).
    #[serde(rename = "starttls")]
    StartTls,
    /// Unencrypted session, for local relays only.
    #[serde(rename = "none")]
    Plain,
}

/// SMTP sender settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSenderConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port.
    pub smtp_port: u16,
    /// Connection security.
    pub tls: SmtpTls,
    /// Sender mailbox, e.g. `Flood Alerts <alerts@example.org>`.
    pub from: String,
    /// Per-attempt network timeout.
    pub timeout_ms: u64,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

// ============================================================================
// SECTION: Transport Seam
// ============================================================================

/// Submits a fully built mail to a relay.
pub trait MailTransport: Send + Sync {
    /// Performs one submission attempt.
    ///
    /// # Errors
    ///
    /// Returns a classified [`SendFailure`] when the relay does not accept the
    /// mail.
    fn submit(&self, mail: &lettre::Message, credential: &Credential) -> Result<(), SendFailure>;
}

/// [`MailTransport`] backed by a `lettre` SMTP session per submission.
#[derive(Debug, Clone)]
pub struct SmtpMailTransport {
    /// Relay host.
    host: String,
    /// Relay port.
    port: u16,
    /// Connection security.
    tls: SmtpTls,
    /// Network timeout.
    timeout: Duration,
}

impl SmtpMailTransport {
    /// Creates an SMTP transport.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, tls: SmtpTls, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            timeout,
        }
    }
}

impl MailTransport for SmtpMailTransport {
    fn submit(&self, mail: &lettre::Message, credential: &Credential) -> Result<(), SendFailure> {
        let builder = match self.tls {
            SmtpTls::Wrapper => SmtpTransport::relay(&self.host),
            SmtpTls::StartTls => SmtpTransport::starttls_relay(&self.host),
            SmtpTls::Plain => Ok(SmtpTransport::builder_dangerous(&self.host)),
        }
        .map_err(|err| SendFailure {
            kind: FailureKind::Permanent,
            detail: format!("smtp relay setup failed: {err}"),
        })?;
        let transport = builder
            .port(self.port)
            .timeout(Some(self.timeout))
            .credentials(Credentials::new(credential.account.clone(), credential.secret.clone()))
            .build();
        transport.send(mail).map(|_| ()).map_err(|err| SendFailure {
            kind: classify_smtp_error(&err),
            detail: format!("smtp: {err}"),
        })
    }
}

/// Maps a `lettre` SMTP error to a failure kind.
fn classify_smtp_error(error: &lettre::transport::smtp::Error) -> FailureKind {
    if let Some(code) = error.status() {
        return classify_reply_code(code.to_string().parse().unwrap_or_default());
    }
    if error.is_permanent() { FailureKind::Permanent } else { FailureKind::Transient }
}

/// Maps a three-digit SMTP reply code to a failure kind.
fn classify_reply_code(code: u16) -> FailureKind {
    if CREDENTIAL_REJECTION_CODES.contains(&code) {
        FailureKind::CredentialRejected
    } else if (500 .. 600).contains(&code) {
        FailureKind::Permanent
    } else {
        FailureKind::Transient
    }
}

// ============================================================================
// SECTION: Sender
// ============================================================================

/// Email channel sender.
pub struct EmailSender {
    /// Sender mailbox.
    from: Mailbox,
    /// Relay submission seam.
    transport: Box<dyn MailTransport>,
    /// Retry policy for transient failures.
    retry: RetryPolicy,
}

impl EmailSender {
    /// Creates an SMTP-backed email sender.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] when the sender address is invalid.
    pub fn new(config: &EmailSenderConfig) -> Result<Self, ChannelError> {
        let transport = SmtpMailTransport::new(
            config.smtp_host.clone(),
            config.smtp_port,
            config.tls,
            Duration::from_millis(config.timeout_ms),
        );
        Self::with_transport(&config.from, transport, config.retry)
    }

    /// Creates an email sender over a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] when the sender address is invalid.
    pub fn with_transport(
        from: &str,
        transport: impl MailTransport + 'static,
        retry: RetryPolicy,
    ) -> Result<Self, ChannelError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|err| ChannelError::Config(format!("invalid sender address `{from}`: {err}")))?;
        Ok(Self {
            from,
            transport: Box::new(transport),
            retry,
        })
    }

    /// Builds the mail for `addresses`.
    fn build_mail(
        &self,
        addresses: &[String],
        message: &Message,
    ) -> Result<lettre::Message, SendFailure> {
        let mut builder = lettre::Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone().unwrap_or_default())
            .header(ContentType::TEXT_PLAIN);
        for address in addresses {
            let mailbox = address.parse::<Mailbox>().map_err(|err| SendFailure {
                kind: FailureKind::Permanent,
                detail: format!("invalid email address `{address}`: {err}"),
            })?;
            builder = builder.to(mailbox);
        }
        builder.body(message.body.clone()).map_err(|err| SendFailure {
            kind: FailureKind::Permanent,
            detail: format!("mail could not be built: {err}"),
        })
    }
}

impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn send(&self, addresses: &[String], message: &Message, credential: &Credential) -> SendOutcome {
        if addresses.is_empty() {
            return SendOutcome::failed(FailureKind::Permanent, "no email address", 0);
        }
        let mail = match self.build_mail(addresses, message) {
            Ok(mail) => mail,
            Err(failure) => {
                return SendOutcome {
                    success: false,
                    failure: Some(failure),
                    attempts: 0,
                };
            }
        };
        self.retry.run(Channel::Email, |attempt| {
            debug!(channel = %Channel::Email, attempt, recipients = addresses.len(), "submitting mail");
            self.transport.submit(&mail, credential)
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use flood_alert_core::FailureKind;

    use super::SmtpTls;
    use super::classify_reply_code;

    #[test]
    fn reply_codes_classify_by_class() {
        assert_eq!(classify_reply_code(535), FailureKind::CredentialRejected);
        assert_eq!(classify_reply_code(530), FailureKind::CredentialRejected);
        assert_eq!(classify_reply_code(550), FailureKind::Permanent);
        assert_eq!(classify_reply_code(421), FailureKind::Transient);
        assert_eq!(classify_reply_code(451), FailureKind::Transient);
    }

    #[test]
    fn tls_modes_use_config_labels() {
        let labels = ["\"wrapper\"", "\"starttls\"", "\"none\""];
        let parsed: Vec<Option<SmtpTls>> =
            labels.iter().map(|label| serde_json::from_str(label).ok()).collect();
        assert_eq!(
            parsed,
            vec![Some(SmtpTls::Wrapper), Some(SmtpTls::StartTls), Some(SmtpTls::Plain)]
        );
    }
}
