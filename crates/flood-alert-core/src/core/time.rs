// crates/flood-alert-core/src/core/time.rs
// ============================================================================
// Module: Flood Alert Time Model
// Description: Forecast timestamps and record timestamps.
// Purpose: Parse forecast times into a canonical UTC form with a stable text encoding.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`ForecastTime`] is the normalized (UTC, second precision) timestamp of a
//! forecast row. Its canonical text form `YYYY-MM-DDTHH:MM:SS` is part of the
//! idempotency key, so it must never depend on the input spelling.
//! [`Timestamp`] is a wall-clock record time in unix milliseconds supplied by a
//! [`crate::Clock`]; the engine never reads the clock directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::Time;
use time::UtcOffset;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Accepted date-time layouts, tried in order after `' '` is normalized to `'T'`.
const DATE_TIME_FORMATS: [&[BorrowedFormatItem<'static>]; 2] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];

/// Date-only layout; interpreted as midnight UTC.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Forecast Time
// ============================================================================

/// Error returned when a forecast timestamp cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized timestamp: {0}")]
pub struct TimeParseError(pub String);

/// Forecast timestamp normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastTime(PrimitiveDateTime);

impl ForecastTime {
    /// Parses a forecast timestamp.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DD[T ]HH:MM`, `YYYY-MM-DD[T ]HH:MM:SS`,
    /// and RFC 3339 values with an offset (converted to UTC).
    ///
    /// # Errors
    ///
    /// Returns [`TimeParseError`] when no accepted layout matches.
    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        let trimmed = text.trim();
        if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            let utc = value.to_offset(UtcOffset::UTC);
            return Ok(Self(PrimitiveDateTime::new(utc.date(), utc.time())));
        }
        let normalized = trimmed.replacen(' ', "T", 1);
        for format in DATE_TIME_FORMATS {
            if let Ok(value) = PrimitiveDateTime::parse(&normalized, format) {
                return Ok(Self(value));
            }
        }
        if let Ok(date) = time::Date::parse(trimmed, DATE_FORMAT) {
            return Ok(Self(PrimitiveDateTime::new(date, Time::MIDNIGHT)));
        }
        Err(TimeParseError(trimmed.to_string()))
    }

    /// Returns the canonical `YYYY-MM-DDTHH:MM:SS` form used in dispatch keys.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }

    /// Returns a human-readable form such as `01-Jan-2025 06:00 UTC`.
    #[must_use]
    pub fn human(&self) -> String {
        let month = self.0.month().to_string();
        let short_month: String = month.chars().take(3).collect();
        format!(
            "{:02}-{}-{:04} {:02}:{:02} UTC",
            self.0.day(),
            short_month,
            self.0.year(),
            self.0.hour(),
            self.0.minute()
        )
    }
}

impl fmt::Display for ForecastTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl Serialize for ForecastTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for ForecastTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Record Timestamps
// ============================================================================

/// Wall-clock record time in unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

    use super::ForecastTime;

    #[test]
    fn equivalent_spellings_share_a_canonical_form() {
        let minute = ForecastTime::parse("2025-01-01T00:00").unwrap();
        let spaced = ForecastTime::parse("2025-01-01 00:00:00").unwrap();
        let date_only = ForecastTime::parse("2025-01-01").unwrap();
        let offset = ForecastTime::parse("2025-01-01T02:00:00+02:00").unwrap();
        assert_eq!(minute.canonical(), "2025-01-01T00:00:00");
        assert_eq!(minute, spaced);
        assert_eq!(minute, date_only);
        assert_eq!(minute, offset);
    }

    #[test]
    fn human_form_uses_short_month_names() {
        let value = ForecastTime::parse("2025-03-07T06:30").unwrap();
        assert_eq!(value.human(), "07-Mar-2025 06:30 UTC");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(ForecastTime::parse("yesterday").is_err());
        assert!(ForecastTime::parse("2025-13-01").is_err());
    }
}
