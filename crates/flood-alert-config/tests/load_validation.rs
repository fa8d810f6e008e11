// crates/flood-alert-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

//! ## Overview
//! File-level guards applied before and after TOML parsing.

use std::fs;
use std::io::Write;
use std::path::Path;

use flood_alert_config::AlertConfig;
use flood_alert_config::CONFIG_FILE_NAME;
use flood_alert_config::ConfigError;
use flood_alert_config::config_toml_example;
use tempfile::NamedTempFile;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(AlertConfig::load(Path::new(&long_path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(AlertConfig::load(Path::new(&long_component)), "config path component too long")
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    match AlertConfig::load_from_dir(dir.path()) {
        Err(ConfigError::Io(message)) if message.contains(CONFIG_FILE_NAME) => Ok(()),
        Err(err) => Err(format!("unexpected error {err}")),
        Ok(_) => Err("missing config loaded".to_string()),
    }
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'#'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(AlertConfig::load(file.path()), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(AlertConfig::load(file.path()), "config file must be utf-8")
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[email\nfrom = ").map_err(|err| err.to_string())?;
    match AlertConfig::load(file.path()) {
        Err(ConfigError::Parse(_)) => Ok(()),
        Err(err) => Err(format!("unexpected error {err}")),
        Ok(_) => Err("malformed toml loaded".to_string()),
    }
}

#[test]
fn load_validates_after_parsing() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[dispatch]\nworkers = 99\n[email]\nfrom = \"a@x.com\"\n")
        .map_err(|err| err.to_string())?;
    assert_invalid(AlertConfig::load(file.path()), "dispatch.workers")
}

#[test]
fn load_from_dir_reads_the_example() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    fs::write(AlertConfig::path_in(dir.path()), config_toml_example())
        .map_err(|err| err.to_string())?;
    let config = AlertConfig::load_from_dir(dir.path()).map_err(|err| err.to_string())?;
    if config.email.from != "Flood Alerts <alerts@example.org>" {
        return Err(format!("unexpected sender {}", config.email.from));
    }
    Ok(())
}
