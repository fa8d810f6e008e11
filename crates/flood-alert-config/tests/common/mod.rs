// crates/flood-alert-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for flood-alert-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use flood_alert_config::AlertConfig;
use flood_alert_config::ConfigError;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into an `AlertConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<AlertConfig, String> {
    AlertConfig::parse(toml_str).map_err(|err| err.to_string())
}

/// Returns the smallest config that validates: email enabled with a sender.
pub fn minimal_config() -> Result<AlertConfig, String> {
    config_from_toml("[email]\nfrom = \"alerts@example.org\"\n")
}

/// Fails unless `result` is an error whose message contains `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
