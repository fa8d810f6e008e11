// crates/flood-alert-core/src/core/recipient.rs
// ============================================================================
// Module: Flood Alert Recipients
// Description: Recipient identities, contact addresses, and site subscriptions.
// Purpose: Describe who receives alerts and over which channels.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Recipient`] is a read-only snapshot loaded from the recipient file at
//! the start of every run.
//! Invariants:
//! - Every enabled channel has at least one non-empty address.
//! - At least one channel is enabled.
//!
//! Both invariants are enforced by [`Recipient::new`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::channel::Channel;
use crate::core::identifiers::RecipientId;
use crate::core::identifiers::SiteId;

// ============================================================================
// SECTION: Site Filter
// ============================================================================

/// Sites a recipient subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "sites", rename_all = "snake_case")]
pub enum SiteFilter {
    /// Every site.
    All,
    /// Only the listed sites.
    Only(BTreeSet<SiteId>),
}

impl SiteFilter {
    /// Returns true when the filter admits the site.
    #[must_use]
    pub fn matches(&self, site: &SiteId) -> bool {
        match self {
            Self::All => true,
            Self::Only(sites) => sites.contains(site),
        }
    }

    /// Combines two filters; the union of two lists, or `All` if either is `All`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Only(mut left), Self::Only(right)) => {
                left.extend(right);
                Self::Only(left)
            }
            _ => Self::All,
        }
    }
}

// ============================================================================
// SECTION: Recipient
// ============================================================================

/// Error returned when recipient invariants do not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipientError {
    /// No channel is both enabled and addressable.
    #[error("recipient {0} has no enabled channel with a usable address")]
    NoUsableChannel(RecipientId),
    /// Identity is blank.
    #[error("recipient identity must be non-empty")]
    EmptyIdentity,
}

/// Alert recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Recipient identity.
    id: RecipientId,
    /// Contact addresses keyed by channel, in file order.
    contacts: BTreeMap<Channel, Vec<String>>,
    /// Channels the recipient opted into.
    enabled: BTreeSet<Channel>,
    /// Site subscription.
    sites: SiteFilter,
}

impl Recipient {
    /// Builds a recipient, dropping blank addresses and enabled channels without one.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientError`] when the identity is blank or no enabled
    /// channel keeps a usable address.
    pub fn new(
        id: RecipientId,
        contacts: BTreeMap<Channel, Vec<String>>,
        enabled: BTreeSet<Channel>,
        sites: SiteFilter,
    ) -> Result<Self, RecipientError> {
        if id.as_str().trim().is_empty() {
            return Err(RecipientError::EmptyIdentity);
        }
        let contacts: BTreeMap<Channel, Vec<String>> = contacts
            .into_iter()
            .map(|(channel, addresses)| {
                let cleaned: Vec<String> = addresses
                    .into_iter()
                    .map(|address| address.trim().to_string())
                    .filter(|address| !address.is_empty())
                    .collect();
                (channel, cleaned)
            })
            .filter(|(_, addresses)| !addresses.is_empty())
            .collect();
        let enabled: BTreeSet<Channel> =
            enabled.into_iter().filter(|channel| contacts.contains_key(channel)).collect();
        if enabled.is_empty() {
            return Err(RecipientError::NoUsableChannel(id));
        }
        Ok(Self {
            id,
            contacts,
            enabled,
            sites,
        })
    }

    /// Returns the recipient identity.
    #[must_use]
    pub const fn id(&self) -> &RecipientId {
        &self.id
    }

    /// Returns the enabled channels in dispatch order.
    pub fn enabled_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.enabled.iter().copied()
    }

    /// Returns true when the channel is enabled for this recipient.
    #[must_use]
    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.enabled.contains(&channel)
    }

    /// Returns the addresses for a channel (empty when none are known).
    #[must_use]
    pub fn addresses(&self, channel: Channel) -> &[String] {
        self.contacts.get(&channel).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns true when the recipient should be alerted about the site.
    #[must_use]
    pub fn is_subscribed(&self, site: &SiteId) -> bool {
        self.sites.matches(site)
    }

    /// Merges a duplicate row for the same identity into this recipient.
    ///
    /// Addresses are appended in order without duplicates, channels and
    /// sites are unioned.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (channel, addresses) in other.contacts {
            let existing = self.contacts.entry(channel).or_default();
            for address in addresses {
                if !existing.contains(&address) {
                    existing.push(address);
                }
            }
        }
        self.enabled.extend(other.enabled);
        self.sites = self.sites.union(other.sites);
        self
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
