// crates/flood-alert-core/src/runtime/composer.rs
// ============================================================================
// Module: Flood Alert Notification Composer
// Description: Renders forecast records into channel-specific messages.
// Purpose: Produce deterministic email and WhatsApp content.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`NotificationComposer::compose`] is a pure function of the forecast record,
//! the channel, and the configured title. It never reads the clock, so the
//! same inputs always render byte-identical messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::channel::Channel;
use crate::core::forecast::ForecastRecord;
use crate::core::message::Message;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default alert title.
pub const DEFAULT_TITLE: &str = "Flood Forecasting System Alert";

/// Width of the email banner.
const BANNER_WIDTH: usize = 75;

/// Width of the label column in email bodies.
const LABEL_WIDTH: usize = 16;

// ============================================================================
// SECTION: Composer
// ============================================================================

/// Renders notification content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationComposer {
    /// Title shown at the top of every message.
    title: String,
}

impl Default for NotificationComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl NotificationComposer {
    /// Creates a composer with a custom title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Composes the message for a record on a channel.
    ///
    /// Channels without a subject concept get `subject: None`.
    #[must_use]
    pub fn compose(&self, record: &ForecastRecord, channel: Channel) -> Message {
        let body = match channel {
            Channel::Email => self.email_body(record),
            Channel::WhatsApp => self.whatsapp_body(record),
        };
        let subject = channel.supports_subject().then(|| self.subject(record));
        Message {
            subject,
            body,
        }
    }

    /// Renders the email subject line.
    fn subject(&self, record: &ForecastRecord) -> String {
        format!(
            "[{}] {}: {} at {}",
            record.severity,
            self.title,
            title_case(record.site().as_str()),
            record.timestamp().human()
        )
    }

    /// Renders the banner-style email body.
    fn email_body(&self, record: &ForecastRecord) -> String {
        let rule = format!(" {:=^width$} ", "", width = BANNER_WIDTH);
        let mut lines = vec![
            rule.clone(),
            String::new(),
            format!(" {:^width$} ", self.title, width = BANNER_WIDTH),
            String::new(),
            labeled("Location", &title_case(record.site().as_str())),
            labeled("Alert Level", record.severity.as_str()),
            labeled("Forecast Time", &record.timestamp().human()),
            labeled("Source", record.key.source.as_str()),
            String::new(),
        ];
        if !record.extras.is_empty() {
            lines.push(format!(" {:-<width$} ", "", width = BANNER_WIDTH));
            lines.push(String::new());
            for (name, value) in &record.extras {
                lines.push(labeled(&title_case(name), value));
            }
            lines.push(String::new());
        }
        lines.push(rule);
        lines.join("\n")
    }

    /// Renders the compact WhatsApp text.
    fn whatsapp_body(&self, record: &ForecastRecord) -> String {
        let mut body = format!(
            "*{}*\nLocation: {}\nAlert level: {}\nForecast time: {}",
            self.title,
            title_case(record.site().as_str()),
            record.severity,
            record.timestamp().human()
        );
        for (name, value) in &record.extras {
            body.push_str(&format!("\n{}: {value}", title_case(name)));
        }
        body
    }
}

/// Formats a `label: value` line with an aligned label column.
fn labeled(label: &str, value: &str) -> String {
    format!(" {label:<width$}: {value}", width = LABEL_WIDTH)
}

/// Title-cases text: letters following a non-letter are uppercased, others lowercased.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if previous_is_letter {
            output.extend(ch.to_lowercase());
        } else {
            output.extend(ch.to_uppercase());
        }
        previous_is_letter = ch.is_alphabetic();
    }
    output
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::title_case;

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("bhaktapur"), "Bhaktapur");
        assert_eq!(title_case("upper narayani-basin_2"), "Upper Narayani-Basin_2");
        assert_eq!(title_case("th1"), "Th1");
        assert_eq!(title_case("S1"), "S1");
    }
}
