// crates/flood-alert-core/tests/registry.rs
// ============================================================================
// Module: Recipient Registry Tests
// Description: Loading, validation, and merging of recipient files.
// Purpose: Ensure the registry fails closed on invalid recipient data.
// Dependencies: flood-alert-core, tempfile
// ============================================================================
//! ## Overview
//! Exercises the recipient file contract: required columns, opt-in flags,
//! blank rows, duplicate merging, and site subscriptions.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod support;

use flood_alert_core::Channel;
use flood_alert_core::RecipientId;
use flood_alert_core::RecipientRegistry;
use flood_alert_core::RegistryError;
use flood_alert_core::SiteId;

fn parse(contents: &str) -> Result<RecipientRegistry, RegistryError> {
    RecipientRegistry::from_reader(contents.as_bytes())
}

#[test]
fn loads_recipients_in_identity_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = support::write_file(dir.path(), "recipients.csv", support::SCENARIO_RECIPIENTS);
    let registry = RecipientRegistry::load(&path).unwrap();

    let ids: Vec<&str> = registry.iter().map(|recipient| recipient.id().as_str()).collect();
    assert_eq!(ids, ["A", "B"]);
    let a = registry.get(&RecipientId::new("A")).unwrap();
    assert_eq!(a.enabled_channels().collect::<Vec<_>>(), vec![Channel::Email]);
    assert_eq!(a.addresses(Channel::Email), ["a@x.com"]);
    let b = registry.get(&RecipientId::new("B")).unwrap();
    assert_eq!(b.enabled_channels().collect::<Vec<_>>(), vec![Channel::Email, Channel::WhatsApp]);
}

#[test]
fn headers_match_case_insensitively_and_blank_rows_are_skipped() {
    let registry = parse(
        " Name ,EMAIL,WhatsApp,Notify_Email,NOTIFY_WHATSAPP\n\
         A,a@x.com,,true,false\n\
         ,,,,\n\
         \n\
         C,c@x.com; c2@x.com ,,1,0\n",
    )
    .unwrap();
    assert_eq!(registry.len(), 2);
    let c = registry.get(&RecipientId::new("C")).unwrap();
    assert_eq!(c.addresses(Channel::Email), ["c@x.com", "c2@x.com"]);
}

#[test]
fn missing_required_column_is_a_validation_error() {
    let err = parse("name,email,notify_email\nA,a@x.com,yes\n").unwrap_err();
    match err {
        RegistryError::Validation(message) => {
            assert!(message.contains("whatsapp"), "{message}");
            assert!(message.contains("notify_whatsapp"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn row_without_usable_channel_fails_the_load() {
    let err = parse(
        "name,email,whatsapp,notify_email,notify_whatsapp\n\
         A,a@x.com,,yes,no\n\
         B,,+15550100,yes,no\n",
    )
    .unwrap_err();
    match err {
        RegistryError::Validation(message) => {
            assert!(message.contains("line 3"), "{message}");
            assert!(message.contains('B'), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn flagged_channel_without_address_is_dropped() {
    let registry = parse(
        "name,email,whatsapp,notify_email,notify_whatsapp\n\
         A,a@x.com,,yes,yes\n",
    )
    .unwrap();
    let a = registry.get(&RecipientId::new("A")).unwrap();
    assert!(a.is_enabled(Channel::Email));
    assert!(!a.is_enabled(Channel::WhatsApp));
}

#[test]
fn invalid_flag_is_rejected() {
    let err = parse(
        "name,email,whatsapp,notify_email,notify_whatsapp\n\
         A,a@x.com,,sometimes,no\n",
    )
    .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(message) if message.contains("notify_email")));
}

#[test]
fn duplicate_identities_are_merged_in_file_order() {
    let registry = parse(
        "name,email,whatsapp,notify_email,notify_whatsapp,sites\n\
         A,a@x.com,,yes,no,s1\n\
         A,a2@x.com,+15550100,no,yes,S2\n",
    )
    .unwrap();
    assert_eq!(registry.len(), 1);
    let a = registry.get(&RecipientId::new("A")).unwrap();
    assert_eq!(a.addresses(Channel::Email), ["a@x.com", "a2@x.com"]);
    assert!(a.is_enabled(Channel::Email));
    assert!(a.is_enabled(Channel::WhatsApp));
    assert!(a.is_subscribed(&SiteId::new("s1")));
    assert!(a.is_subscribed(&SiteId::new("s2")));
    assert!(!a.is_subscribed(&SiteId::new("s3")));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RecipientRegistry::load(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, RegistryError::Io(_)));
}
