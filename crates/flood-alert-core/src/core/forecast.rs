// crates/flood-alert-core/src/core/forecast.rs
// ============================================================================
// Module: Flood Alert Forecast Records
// Description: Normalized forecast rows and their idempotency keys.
// Purpose: Give every forecast row a canonical shape and a stable identity.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ForecastRecord`] is one normalized row of flood-forecast data for a
//! site and timestamp. It is uniquely identified by its [`ForecastKey`]
//! (source file, site, timestamp); the key is the idempotency key the
//! dispatch state store deduplicates on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SiteId;
use crate::core::identifiers::SourceId;
use crate::core::time::ForecastTime;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Alert level names ordered by threshold, lowest first.
pub const THRESHOLD_LEVELS: [&str; 4] = ["GREEN", "YELLOW", "ORANGE", "RED"];

/// Level reported when a value exceeds every threshold.
pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

/// Forecast severity / alert level label.
///
/// # Invariants
/// - Stored uppercased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(String);

impl Severity {
    /// Creates a severity label, trimming and uppercasing the input.
    #[must_use]
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_uppercase())
    }

    /// Derives a level from a corrected discharge value and four thresholds.
    ///
    /// The level is the first of [`THRESHOLD_LEVELS`] whose threshold is at or
    /// above `value`; values above every threshold report [`UNKNOWN_LEVEL`].
    #[must_use]
    pub fn from_thresholds(value: f64, thresholds: [f64; 4]) -> Self {
        THRESHOLD_LEVELS
            .iter()
            .zip(thresholds)
            .filter(|(_, threshold)| *threshold >= value)
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map_or_else(|| Self::new(UNKNOWN_LEVEL), |(label, _)| Self::new(label))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Forecast Key
// ============================================================================

/// Idempotency key for a forecast record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForecastKey {
    /// Source file identifier.
    pub source: SourceId,
    /// Site identifier.
    pub site: SiteId,
    /// Forecast timestamp.
    pub timestamp: ForecastTime,
}

impl fmt::Display for ForecastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.source, self.site, self.timestamp.canonical())
    }
}

// ============================================================================
// SECTION: Forecast Record
// ============================================================================

/// One normalized forecast row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Idempotency key (source, site, timestamp).
    pub key: ForecastKey,
    /// Severity / alert level.
    pub severity: Severity,
    /// Raw row content keyed by normalized column name.
    pub fields: BTreeMap<String, String>,
    /// Pass-through columns not consumed into the canonical shape.
    pub extras: BTreeMap<String, String>,
}

impl ForecastRecord {
    /// Returns the site identifier.
    #[must_use]
    pub const fn site(&self) -> &SiteId {
        &self.key.site
    }

    /// Returns the forecast timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> ForecastTime {
        self.key.timestamp
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
