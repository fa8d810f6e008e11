// crates/flood-alert-core/tests/composer.rs
// ============================================================================
// Module: Notification Composer Tests
// Description: Layout and determinism of composed messages.
// Purpose: Ensure identical inputs always render identical content.
// Dependencies: flood-alert-core, proptest
// ============================================================================
//! ## Overview
//! Checks the email banner layout, the subject-less WhatsApp rendering, and
//! determinism over arbitrary forecast rows.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;

use flood_alert_core::Channel;
use flood_alert_core::ForecastKey;
use flood_alert_core::ForecastRecord;
use flood_alert_core::ForecastTime;
use flood_alert_core::NotificationComposer;
use flood_alert_core::Severity;
use flood_alert_core::SiteId;
use flood_alert_core::SourceId;
use proptest::prelude::*;

fn record(site: &str, timestamp: &str, level: &str, extras: &[(&str, &str)]) -> ForecastRecord {
    let extras: BTreeMap<String, String> =
        extras.iter().map(|(name, value)| ((*name).to_string(), (*value).to_string())).collect();
    ForecastRecord {
        key: ForecastKey {
            source: SourceId::new("forecast.csv"),
            site: SiteId::new(site),
            timestamp: ForecastTime::parse(timestamp).unwrap(),
        },
        severity: Severity::new(level),
        fields: extras.clone(),
        extras,
    }
}

#[test]
fn email_uses_banner_layout_with_subject() {
    let composer = NotificationComposer::default();
    let message =
        composer.compose(&record("bhaktapur", "2025-07-01T06:00", "red", &[("mean", "10.5")]), Channel::Email);

    assert_eq!(
        message.subject.as_deref(),
        Some("[RED] Flood Forecasting System Alert: Bhaktapur at 01-Jul-2025 06:00 UTC")
    );
    let lines: Vec<&str> = message.body.lines().collect();
    let rule = format!(" {} ", "=".repeat(75));
    assert_eq!(lines.first().copied(), Some(rule.as_str()));
    assert_eq!(lines.last().copied(), Some(rule.as_str()));
    assert!(lines.contains(&" Location        : Bhaktapur"));
    assert!(lines.contains(&" Alert Level     : RED"));
    assert!(lines.contains(&" Forecast Time   : 01-Jul-2025 06:00 UTC"));
    assert!(lines.contains(&" Mean            : 10.5"));
}

#[test]
fn whatsapp_has_no_subject() {
    let composer = NotificationComposer::new("Basin Alert");
    let message = composer.compose(&record("s1", "2025-01-01", "HIGH", &[]), Channel::WhatsApp);
    assert_eq!(message.subject, None);
    assert_eq!(
        message.body,
        "*Basin Alert*\nLocation: S1\nAlert level: HIGH\nForecast time: 01-Jan-2025 00:00 UTC"
    );
}

proptest! {
    #[test]
    fn compose_is_deterministic(
        site in "[a-z][a-z ]{0,12}",
        level in "[A-Za-z]{1,8}",
        hour in 0u8 .. 24,
        extras in proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,10}", 0 .. 4),
    ) {
        let timestamp = format!("2025-03-04T{hour:02}:00");
        let pairs: Vec<(&str, &str)> =
            extras.iter().map(|(name, value)| (name.as_str(), value.as_str())).collect();
        let first = record(&site, &timestamp, &level, &pairs);
        let second = record(&site, &timestamp, &level, &pairs);
        let composer = NotificationComposer::default();
        for channel in Channel::ALL {
            prop_assert_eq!(composer.compose(&first, channel), composer.compose(&second, channel));
        }
    }
}
