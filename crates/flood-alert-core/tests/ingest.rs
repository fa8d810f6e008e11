// crates/flood-alert-core/tests/ingest.rs
// ============================================================================
// Module: Forecast Ingestor Tests
// Description: Discovery, parsing, and per-file isolation of forecast files.
// Purpose: Ensure malformed files never block valid forecasts.
// Dependencies: flood-alert-core, tempfile
// ============================================================================
//! ## Overview
//! Covers file discovery order, column aliases, duplicate detection, and
//! restartable scans.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod support;

use flood_alert_core::ForecastIngestor;
use flood_alert_core::ForecastRecord;
use flood_alert_core::ParseError;
use flood_alert_core::runtime::parse_forecast_table;

fn collect(ingestor: &ForecastIngestor) -> (Vec<ForecastRecord>, Vec<ParseError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for file in ingestor.scan() {
        match file {
            Ok(file) => records.extend(file.records),
            Err(err) => errors.push(err),
        }
    }
    (records, errors)
}

#[test]
fn scan_orders_files_by_name_and_ignores_non_forecast_entries() {
    let root = tempfile::tempdir().unwrap();
    let dir = support::forecast_dir(
        root.path(),
        &[
            ("b.csv", "site,timestamp,level\nS2,2025-01-02,LOW\n"),
            ("a.CSV", "site,timestamp,level\nS1,2025-01-01,HIGH\n"),
            (".hidden.csv", "site,timestamp,level\nS9,2025-01-01,HIGH\n"),
            ("notes.txt", "not a forecast"),
        ],
    );
    std::fs::create_dir(dir.join("nested.csv")).unwrap();

    let ingestor = ForecastIngestor::new(&dir);
    let files: Vec<String> = ingestor
        .list_files()
        .unwrap()
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, ["a.CSV", "b.csv"]);

    let (records, errors) = collect(&ingestor);
    assert!(errors.is_empty());
    let keys: Vec<String> = records.iter().map(|record| record.key.to_string()).collect();
    assert_eq!(keys, ["a.CSV|s1|2025-01-01T00:00:00", "b.csv|s2|2025-01-02T00:00:00"]);
}

#[test]
fn malformed_file_is_isolated() {
    let root = tempfile::tempdir().unwrap();
    let dir = support::forecast_dir(
        root.path(),
        &[
            ("a.csv", "site,timestamp,level\nS1,not-a-date,HIGH\n"),
            ("b.csv", support::SCENARIO_FORECAST),
        ],
    );
    let (records, errors) = collect(&ForecastIngestor::new(dir));
    assert_eq!(records.len(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].file, "a.csv");
    assert!(errors[0].message.contains("line 2"), "{}", errors[0].message);
}

#[test]
fn rescanning_yields_the_same_records() {
    let root = tempfile::tempdir().unwrap();
    let dir = support::forecast_dir(root.path(), &[("f.csv", support::SCENARIO_FORECAST)]);
    let ingestor = ForecastIngestor::new(dir);
    let (first, _) = collect(&ingestor);
    let (second, _) = collect(&ingestor);
    assert_eq!(first, second);
    assert_eq!(first[0].severity.as_str(), "HIGH");
    assert_eq!(first[0].extras.get("discharge").map(String::as_str), Some("412.5"));
}

#[test]
fn missing_directory_yields_no_records() {
    let root = tempfile::tempdir().unwrap();
    let (records, errors) = collect(&ForecastIngestor::new(root.path().join("absent")));
    assert!(records.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn equivalent_timestamps_for_one_site_are_duplicates() {
    let err = parse_forecast_table(
        "dup.csv",
        "dup",
        "site,timestamp,level\nS1,2025-01-01,HIGH\ns1,2025-01-01 00:00,LOW\n".as_bytes(),
    )
    .unwrap_err();
    assert_eq!(err.file, "dup.csv");
    assert!(err.message.contains("duplicate"), "{}", err.message);
}

#[test]
fn aliases_cover_location_date_and_severity() {
    let records = parse_forecast_table(
        "alias.csv",
        "alias",
        "Location,Date,Severity\nUpper Basin,2025-02-03T04:05:06Z,moderate\n".as_bytes(),
    )
    .unwrap();
    assert_eq!(records[0].site().as_str(), "upper basin");
    assert_eq!(records[0].timestamp().canonical(), "2025-02-03T04:05:06");
    assert_eq!(records[0].severity.as_str(), "MODERATE");
}

#[test]
fn missing_level_source_fails_the_file() {
    let err = parse_forecast_table(
        "nolevel.csv",
        "nolevel",
        "site,timestamp,corrected,th1\nS1,2025-01-01,3,1\n".as_bytes(),
    )
    .unwrap_err();
    assert!(err.message.contains("missing level column"), "{}", err.message);
}

#[test]
fn non_numeric_threshold_fails_the_file() {
    let err = parse_forecast_table(
        "bad.csv",
        "bad",
        "date,corrected,th1,th2,th3,th4\n2025-01-01,abc,1,2,3,4\n".as_bytes(),
    )
    .unwrap_err();
    assert!(err.message.contains("corrected"), "{}", err.message);
}
