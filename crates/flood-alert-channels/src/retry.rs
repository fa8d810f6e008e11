// crates/flood-alert-channels/src/retry.rs
// ============================================================================
// Module: Retry Policy
// Description: Capped exponential backoff for transient send failures.
// Purpose: Give every sender the same bounded retry behavior.
// Dependencies: flood-alert-core, serde, tracing
// ============================================================================

//! ## Overview
//! A [`RetryPolicy`] runs one logical send as up to `max_retries + 1`
//! transport attempts. Only [`FailureKind::Transient`] failures are retried;
//! the delay before retry `n` (zero-based) is
//! `min(initial_backoff_ms * multiplier^n, max_backoff_ms)`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use flood_alert_core::Channel;
use flood_alert_core::FailureKind;
use flood_alert_core::SendFailure;
use flood_alert_core::SendOutcome;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of retries after the first attempt.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry (ms).
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
/// Default delay ceiling (ms).
const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;
/// Default backoff growth factor.
const DEFAULT_MULTIPLIER: u32 = 2;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Retry configuration for a channel sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Growth factor applied per retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn no_retries() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1,
        }
    }

    /// Returns the total number of attempts allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns the delay before the zero-based retry `retry`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = u64::from(self.multiplier).saturating_pow(retry);
        let millis = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Runs `attempt` until it succeeds, fails non-transiently, or the budget
    /// is exhausted. `attempt` receives the one-based attempt number.
    pub fn run<F>(&self, channel: Channel, mut attempt: F) -> SendOutcome
    where
        F: FnMut(u32) -> Result<(), SendFailure>,
    {
        let max_attempts = self.max_attempts();
        let mut number = 1;
        loop {
            match attempt(number) {
                Ok(()) => return SendOutcome::delivered(number),
                Err(failure) if failure.kind == FailureKind::Transient && number < max_attempts => {
                    let delay = self.backoff(number - 1);
                    warn!(
                        %channel,
                        attempt = number,
                        error = %failure,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient send failure; retrying"
                    );
                    std::thread::sleep(delay);
                    number += 1;
                }
                Err(failure) => {
                    return SendOutcome {
                        success: false,
                        failure: Some(failure),
                        attempts: number,
                    };
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
