// crates/flood-alert-cli/src/report.rs
// ============================================================================
// Module: Report Rendering
// Description: Text and JSON renderings of a run report.
// Purpose: Give operators and schedulers a stable stdout summary.
// Dependencies: flood-alert-core, serde_json
// ============================================================================

//! ## Overview
//! The text form is for people; the JSON form is the serialized
//! [`RunReport`] and is what automation should parse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use flood_alert_core::RunPhase;
use flood_alert_core::RunReport;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders `report` as human-readable text ending in a newline.
#[must_use]
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let status = report.final_phase().map_or("NOT STARTED", RunPhase::as_str);
    let phases: Vec<&str> = report.phases.iter().copied().map(RunPhase::as_str).collect();
    let _ = writeln!(out, "run: {status}");
    let _ = writeln!(out, "phases: {}", phases.join(" -> "));
    let _ = writeln!(out, "recipients: {}  forecasts: {}", report.recipients, report.forecasts);
    let _ = writeln!(
        out,
        "sent: {}  skipped: {}  failed: {}",
        report.sent, report.skipped, report.failed
    );
    if !report.failures.is_empty() {
        out.push_str("failed notifications:\n");
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "  {} {} {}: {}",
                failure.forecast_key, failure.recipient, failure.channel, failure.error
            );
        }
    }
    if !report.file_failures.is_empty() {
        out.push_str("rejected forecast files:\n");
        for failure in &report.file_failures {
            let _ = writeln!(out, "  {}: {}", failure.file, failure.error);
        }
    }
    if !report.skipped_channels.is_empty() {
        out.push_str("skipped channels:\n");
        for skipped in &report.skipped_channels {
            let _ = writeln!(out, "  {}: {}", skipped.channel, skipped.reason);
        }
    }
    if let Some(abort) = &report.abort {
        let _ = writeln!(out, "aborted ({}): {}", abort.kind.as_str(), abort.message);
    }
    out
}

/// Renders `report` as pretty JSON ending in a newline.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when serialization fails.
pub fn render_json(report: &RunReport) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
