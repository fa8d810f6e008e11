// crates/flood-alert-core/src/runtime/clock.rs
// ============================================================================
// Module: Flood Alert System Clock
// Description: Wall-clock implementation of the clock interface.
// Purpose: Stamp dispatch records with the current UTC time.
// Dependencies: time
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads the UTC wall clock. Tests substitute a fixed clock.

use time::OffsetDateTime;

use crate::core::time::Timestamp;
use crate::interfaces::Clock;

/// UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}
