// crates/flood-alert-core/src/runtime/ingest.rs
// ============================================================================
// Module: Flood Alert Forecast Ingestor
// Description: Discovers and parses forecast files in the forecast directory.
// Purpose: Normalize forecast tables into canonical forecast records.
// Dependencies: csv, tracing
// ============================================================================

//! ## Overview
//! The ingestor lists `*.csv` files directly inside the forecast directory
//! once per run, then parses them lazily in file-name order. A file that fails
//! to parse yields a [`ParseError`] for that file only; scanning continues with
//! the next file. Scanning the same directory again yields the same records.
//!
//! Column resolution (header names are case-insensitive):
//! - site: `site` or `location`; otherwise the lowercased file stem.
//! - timestamp: `timestamp` or `date` (required).
//! - level: `level` or `severity`; otherwise derived from `corrected` and
//!   `th1`..`th4`.
//!
//! Every other column is passed through as an extra field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::forecast::ForecastKey;
use crate::core::forecast::ForecastRecord;
use crate::core::forecast::Severity;
use crate::core::identifiers::SiteId;
use crate::core::identifiers::SourceId;
use crate::core::time::ForecastTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Accepted site column names.
const SITE_COLUMNS: [&str; 2] = ["site", "location"];
/// Accepted timestamp column names.
const TIMESTAMP_COLUMNS: [&str; 2] = ["timestamp", "date"];
/// Accepted level column names.
const LEVEL_COLUMNS: [&str; 2] = ["level", "severity"];
/// Corrected discharge column used for threshold-derived levels.
const CORRECTED_COLUMN: &str = "corrected";
/// Threshold columns, lowest first.
const THRESHOLD_COLUMNS: [&str; 4] = ["th1", "th2", "th3", "th4"];
/// Forecast file extension (matched case-insensitively).
const FORECAST_EXTENSION: &str = "csv";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// A forecast file that could not be parsed. Isolated to that file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("forecast file {file}: {message}")]
pub struct ParseError {
    /// File name within the forecast directory.
    pub file: String,
    /// Failure detail.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error for a file.
    #[must_use]
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Ingestor
// ============================================================================

/// Records parsed from a single forecast file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastFile {
    /// Source identifier (file name).
    pub source: SourceId,
    /// Records in file order.
    pub records: Vec<ForecastRecord>,
}

/// Forecast directory reader.
#[derive(Debug, Clone)]
pub struct ForecastIngestor {
    /// Directory holding forecast files.
    directory: PathBuf,
}

impl ForecastIngestor {
    /// Creates an ingestor for a forecast directory.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the forecast directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Lists forecast files currently present, ordered by file name.
    ///
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the directory exists but cannot be listed.
    pub fn list_files(&self) -> Result<Vec<PathBuf>, ParseError> {
        let label = self.directory.display().to_string();
        if !self.directory.exists() {
            warn!(directory = %label, "forecast directory does not exist");
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.directory)
            .map_err(|err| ParseError::new(&label, format!("cannot list directory: {err}")))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| ParseError::new(&label, format!("cannot list directory: {err}")))?;
            let path = entry.path();
            if is_forecast_file(&path) {
                files.push(path);
            }
        }
        files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
        Ok(files)
    }

    /// Starts a lazy scan over the files present now.
    ///
    /// Each item is one file's records or that file's [`ParseError`]. Calling
    /// `scan` again restarts from the current directory listing.
    #[must_use]
    pub fn scan(&self) -> ForecastScan {
        match self.list_files() {
            Ok(files) => ForecastScan {
                files: files.into_iter(),
                listing_error: None,
            },
            Err(err) => ForecastScan {
                files: Vec::new().into_iter(),
                listing_error: Some(err),
            },
        }
    }
}

/// Lazy iterator over parsed forecast files.
#[derive(Debug)]
pub struct ForecastScan {
    /// Remaining files.
    files: std::vec::IntoIter<PathBuf>,
    /// Directory listing failure, reported once.
    listing_error: Option<ParseError>,
}

impl Iterator for ForecastScan {
    type Item = Result<ForecastFile, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.listing_error.take() {
            return Some(Err(err));
        }
        let path = self.files.next()?;
        Some(read_forecast_file(&path))
    }
}

/// Returns true for non-hidden regular files with a `.csv` extension.
fn is_forecast_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name.starts_with('.') || !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FORECAST_EXTENSION))
}

/// Opens and parses one forecast file.
fn read_forecast_file(path: &Path) -> Result<ForecastFile, ParseError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = std::fs::File::open(path).map_err(|err| ParseError::new(&name, err.to_string()))?;
    let records = parse_forecast_table(&name, &stem, file)?;
    debug!(file = %name, records = records.len(), "forecast file parsed");
    Ok(ForecastFile {
        source: SourceId::new(name),
        records,
    })
}

// ============================================================================
// SECTION: Table Parsing
// ============================================================================

/// Resolved column layout of a forecast table.
struct ForecastColumns {
    /// Header names, lowercased, in file order.
    names: Vec<String>,
    /// Site column, if present.
    site: Option<usize>,
    /// Timestamp column.
    timestamp: usize,
    /// How the level is obtained.
    level: LevelSource,
}

/// Origin of the severity value.
enum LevelSource {
    /// An explicit level column.
    Column(usize),
    /// Corrected value compared with four thresholds.
    Thresholds {
        /// Corrected value column.
        corrected: usize,
        /// Threshold columns, lowest first.
        thresholds: [usize; 4],
    },
}

impl ForecastColumns {
    /// Resolves the layout from a header row.
    fn resolve(headers: &csv::StringRecord) -> Result<Self, String> {
        let names: Vec<String> =
            headers.iter().map(|name| name.trim().to_ascii_lowercase()).collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|candidate| names.iter().position(|name| name == candidate))
        };
        let timestamp = find(&TIMESTAMP_COLUMNS[..]).ok_or_else(|| {
            format!("missing timestamp column (one of {})", TIMESTAMP_COLUMNS.join(", "))
        })?;
        let site = find(&SITE_COLUMNS[..]);
        let level = if let Some(index) = find(&LEVEL_COLUMNS[..]) {
            LevelSource::Column(index)
        } else {
            let corrected = find(&[CORRECTED_COLUMN]);
            let thresholds: Vec<usize> =
                THRESHOLD_COLUMNS.iter().filter_map(|column| find(&[*column])).collect();
            match (corrected, <[usize; 4]>::try_from(thresholds)) {
                (Some(corrected), Ok(thresholds)) => LevelSource::Thresholds {
                    corrected,
                    thresholds,
                },
                _ => {
                    return Err(format!(
                        "missing level column (one of {}) or corrected + {} columns",
                        LEVEL_COLUMNS.join(", "),
                        THRESHOLD_COLUMNS.join("/")
                    ));
                }
            }
        };
        Ok(Self {
            names,
            site,
            timestamp,
            level,
        })
    }

    /// Returns true when a column feeds the key or the level.
    fn is_consumed(&self, index: usize) -> bool {
        index == self.timestamp
            || self.site == Some(index)
            || matches!(self.level, LevelSource::Column(level) if level == index)
    }
}

/// Parses a forecast table.
///
/// `file_name` becomes the source identifier and `default_site` is used when
/// the table has no site column.
///
/// # Errors
///
/// Returns [`ParseError`] when a required column is missing, a cell cannot be
/// parsed, or two rows share a (site, timestamp) pair.
pub fn parse_forecast_table<R: Read>(
    file_name: &str,
    default_site: &str,
    reader: R,
) -> Result<Vec<ForecastRecord>, ParseError> {
    let fail = |message: String| ParseError::new(file_name, message);
    let mut csv_reader =
        csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader);
    let headers = csv_reader.headers().map_err(|err| fail(format!("unreadable header: {err}")))?;
    let columns = ForecastColumns::resolve(headers).map_err(fail)?;
    let source = SourceId::new(file_name);

    let mut seen: BTreeSet<(SiteId, ForecastTime)> = BTreeSet::new();
    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(|err| fail(err.to_string()))?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row.position().map_or(0, csv::Position::line);
        let cell = |index: usize| row.get(index).unwrap_or_default();

        let site_text = columns.site.map_or(default_site, cell);
        if site_text.trim().is_empty() {
            return Err(fail(format!("line {line}: site is empty")));
        }
        let site = SiteId::new(site_text);
        let timestamp = ForecastTime::parse(cell(columns.timestamp))
            .map_err(|err| fail(format!("line {line}: {err}")))?;
        let severity = match &columns.level {
            LevelSource::Column(index) => {
                let label = cell(*index);
                if label.is_empty() {
                    return Err(fail(format!("line {line}: level is empty")));
                }
                Severity::new(label)
            }
            LevelSource::Thresholds {
                corrected,
                thresholds,
            } => {
                let number = |index: usize| {
                    parse_number(cell(index)).ok_or_else(|| {
                        fail(format!(
                            "line {line}: column {} is not a number: `{}`",
                            columns.names[index],
                            cell(index)
                        ))
                    })
                };
                let value = number(*corrected)?;
                let mut limits = [0.0; 4];
                for (limit, index) in limits.iter_mut().zip(thresholds) {
                    *limit = number(*index)?;
                }
                Severity::from_thresholds(value, limits)
            }
        };

        if !seen.insert((site.clone(), timestamp)) {
            return Err(fail(format!(
                "line {line}: duplicate row for site {site} at {}",
                timestamp.canonical()
            )));
        }

        let mut fields = BTreeMap::new();
        let mut extras = BTreeMap::new();
        for (index, name) in columns.names.iter().enumerate() {
            let value = cell(index).to_string();
            if !columns.is_consumed(index) {
                extras.insert(name.clone(), value.clone());
            }
            fields.insert(name.clone(), value);
        }
        records.push(ForecastRecord {
            key: ForecastKey {
                source: source.clone(),
                site,
                timestamp,
            },
            severity,
            fields,
            extras,
        });
    }
    Ok(records)
}

/// Parses a numeric cell; blank cells count as zero.
fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

    use super::parse_forecast_table;
    use super::parse_number;

    #[test]
    fn blank_numbers_count_as_zero() {
        assert_eq!(parse_number(""), Some(0.0));
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn site_defaults_to_file_stem_and_level_derives_from_thresholds() {
        let table = "Date,Mean,Corrected,th1,th2,th3,th4\n2025-07-01,10,35,10,20,30,40\n";
        let records = parse_forecast_table("Bhaktapur.csv", "Bhaktapur", table.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.site().as_str(), "bhaktapur");
        assert_eq!(record.severity.as_str(), "RED");
        assert_eq!(record.key.to_string(), "Bhaktapur.csv|bhaktapur|2025-07-01T00:00:00");
        assert_eq!(record.extras.get("mean").map(String::as_str), Some("10"));
        assert!(!record.extras.contains_key("date"));
    }
}
