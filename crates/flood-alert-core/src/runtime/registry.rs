// crates/flood-alert-core/src/runtime/registry.rs
// ============================================================================
// Module: Flood Alert Recipient Registry
// Description: Loads and validates the recipient file.
// Purpose: Produce the recipient snapshot used by a single run.
// Dependencies: csv, tracing
// ============================================================================

//! ## Overview
//! The recipient file is a CSV table with one row per recipient. Required
//! columns are `name`, `email`, `whatsapp`, `notify_email`, and
//! `notify_whatsapp`; an optional `sites` column restricts which sites the
//! recipient hears about. Header names are matched case-insensitively.
//!
//! Loading fails closed: a missing column, a malformed flag, or a row without
//! a usable channel rejects the whole file. Blank rows are skipped silently
//! and duplicate identities are merged in file order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::btree_map::Entry;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::channel::Channel;
use crate::core::identifiers::RecipientId;
use crate::core::identifiers::SiteId;
use crate::core::recipient::Recipient;
use crate::core::recipient::SiteFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Identity column.
const NAME_COLUMN: &str = "name";
/// Email address column.
const EMAIL_COLUMN: &str = "email";
/// WhatsApp number column.
const WHATSAPP_COLUMN: &str = "whatsapp";
/// Email opt-in flag column.
const NOTIFY_EMAIL_COLUMN: &str = "notify_email";
/// WhatsApp opt-in flag column.
const NOTIFY_WHATSAPP_COLUMN: &str = "notify_whatsapp";
/// Optional site subscription column.
const SITES_COLUMN: &str = "sites";

/// Columns every recipient file must carry.
const REQUIRED_COLUMNS: [&str; 5] =
    [NAME_COLUMN, EMAIL_COLUMN, WHATSAPP_COLUMN, NOTIFY_EMAIL_COLUMN, NOTIFY_WHATSAPP_COLUMN];

/// Separator for multi-valued cells.
const LIST_SEPARATOR: char = ';';

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Recipient registry errors. Both variants are fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The recipient file could not be read.
    #[error("recipient file io error: {0}")]
    Io(String),
    /// The recipient file content is invalid.
    #[error("recipient validation error: {0}")]
    Validation(String),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Validated recipient snapshot, ordered by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientRegistry {
    /// Recipients keyed by identity.
    recipients: BTreeMap<RecipientId, Recipient>,
}

impl RecipientRegistry {
    /// Loads and validates the recipient file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the file cannot be opened and
    /// [`RegistryError::Validation`] when its content is invalid.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let file = std::fs::File::open(path)
            .map_err(|err| RegistryError::Io(format!("{}: {err}", path.display())))?;
        let registry = Self::from_reader(file)?;
        debug!(file = %path.display(), recipients = registry.len(), "recipient file loaded");
        Ok(registry)
    }

    /// Parses a recipient table from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the content is unreadable or invalid.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegistryError> {
        let mut csv_reader =
            csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|err| RegistryError::Validation(format!("unreadable header: {err}")))?;
        let columns = ColumnIndex::resolve(headers)?;

        let mut recipients: BTreeMap<RecipientId, Recipient> = BTreeMap::new();
        for row in csv_reader.records() {
            let row = row.map_err(|err| RegistryError::Validation(err.to_string()))?;
            let line = row.position().map_or(0, csv::Position::line);
            if row.iter().all(str::is_empty) {
                continue;
            }
            let recipient = columns.parse_row(&row, line)?;
            match recipients.entry(recipient.id().clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(recipient);
                }
                Entry::Occupied(mut slot) => {
                    warn!(recipient = %slot.key(), line, "duplicate recipient merged");
                    let merged = slot.get().clone().merge(recipient);
                    slot.insert(merged);
                }
            }
        }
        Ok(Self {
            recipients,
        })
    }

    /// Returns recipients in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.recipients.values()
    }

    /// Looks up a recipient by identity.
    #[must_use]
    pub fn get(&self, id: &RecipientId) -> Option<&Recipient> {
        self.recipients.get(id)
    }

    /// Returns the number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Returns true when no recipients were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

// ============================================================================
// SECTION: Row Parsing
// ============================================================================

/// Positions of known columns within the header row.
struct ColumnIndex {
    /// `name` column.
    name: usize,
    /// `email` column.
    email: usize,
    /// `whatsapp` column.
    whatsapp: usize,
    /// `notify_email` column.
    notify_email: usize,
    /// `notify_whatsapp` column.
    notify_whatsapp: usize,
    /// Optional `sites` column.
    sites: Option<usize>,
}

impl ColumnIndex {
    /// Maps header names to positions, failing on missing required columns.
    fn resolve(headers: &StringRecord) -> Result<Self, RegistryError> {
        let positions: BTreeMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.trim().to_ascii_lowercase(), index))
            .collect();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !positions.contains_key(*column))
            .collect();
        if !missing.is_empty() {
            return Err(RegistryError::Validation(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        let required = |column: &str| positions.get(column).copied().unwrap_or_default();
        Ok(Self {
            name: required(NAME_COLUMN),
            email: required(EMAIL_COLUMN),
            whatsapp: required(WHATSAPP_COLUMN),
            notify_email: required(NOTIFY_EMAIL_COLUMN),
            notify_whatsapp: required(NOTIFY_WHATSAPP_COLUMN),
            sites: positions.get(SITES_COLUMN).copied(),
        })
    }

    /// Converts one non-blank row into a recipient.
    fn parse_row(&self, row: &StringRecord, line: u64) -> Result<Recipient, RegistryError> {
        let cell = |index: usize| row.get(index).unwrap_or_default();
        let name = cell(self.name);
        if name.is_empty() {
            return Err(RegistryError::Validation(format!("line {line}: recipient name is empty")));
        }

        let mut contacts = BTreeMap::new();
        contacts.insert(Channel::Email, split_list(cell(self.email)));
        contacts.insert(Channel::WhatsApp, split_list(cell(self.whatsapp)));

        let mut enabled = BTreeSet::new();
        for (channel, index) in
            [(Channel::Email, self.notify_email), (Channel::WhatsApp, self.notify_whatsapp)]
        {
            let flagged = parse_flag(cell(index)).ok_or_else(|| {
                RegistryError::Validation(format!(
                    "line {line}: invalid notify_{channel} flag `{}`",
                    cell(index)
                ))
            })?;
            if !flagged {
                continue;
            }
            if contacts.get(&channel).is_none_or(Vec::is_empty) {
                warn!(recipient = name, %channel, line, "channel enabled without an address; dropped");
                continue;
            }
            enabled.insert(channel);
        }

        let sites = self.sites.map_or(SiteFilter::All, |index| parse_sites(cell(index)));
        Recipient::new(RecipientId::new(name), contacts, enabled, sites)
            .map_err(|err| RegistryError::Validation(format!("line {line}: {err}")))
    }
}

/// Splits a `;`-separated cell into trimmed non-empty values.
fn split_list(cell: &str) -> Vec<String> {
    cell.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses an opt-in flag; blank means false.
fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Some(false),
        "true" | "yes" | "y" | "1" => Some(true),
        _ => None,
    }
}

/// Parses the site subscription cell; blank or `*` subscribes to every site.
fn parse_sites(cell: &str) -> SiteFilter {
    let values = split_list(cell);
    if values.is_empty() || values.iter().any(|value| value == "*") {
        return SiteFilter::All;
    }
    SiteFilter::Only(values.iter().map(SiteId::new).collect())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
