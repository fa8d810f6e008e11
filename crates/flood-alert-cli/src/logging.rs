// crates/flood-alert-cli/src/logging.rs
// ============================================================================
// Module: Logging Bootstrap
// Description: tracing-subscriber setup for the flood-alert binary.
// Purpose: Route structured events to stderr in text or JSON form.
// Dependencies: tracing-subscriber, flood-alert-config
// ============================================================================

//! ## Overview
//! `FLOOD_ALERT_LOG` takes a full filter directive and wins over the
//! configured level. Events always go to stderr; stdout is reserved for the
//! run report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flood_alert_config::LogFormat;
use flood_alert_config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "FLOOD_ALERT_LOG";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive does not parse.
    #[error("invalid log filter `{directive}`: {message}")]
    Filter {
        /// Offending directive.
        directive: String,
        /// Parser detail.
        message: String,
    },
    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    Init(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Chooses the filter directive: a non-blank environment override, else the
/// configured level.
#[must_use]
pub fn filter_directive(env_value: Option<&str>, configured_level: &str) -> String {
    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => configured_level.trim().to_ascii_lowercase(),
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_value = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(env_value.as_deref(), &config.level);
    let filter = EnvFilter::try_new(&directive).map_err(|err| LoggingError::Filter {
        directive: directive.clone(),
        message: err.to_string(),
    })?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| LoggingError::Init(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::filter_directive;

    #[test]
    fn environment_override_wins_when_present() {
        assert_eq!(filter_directive(Some("flood_alert_core=debug"), "info"), "flood_alert_core=debug");
        assert_eq!(filter_directive(Some("  "), "WARN"), "warn");
        assert_eq!(filter_directive(None, "info"), "info");
    }
}
