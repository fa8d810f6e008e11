// crates/flood-alert-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point printed by `config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example lists every section with its default values. It loads and
//! validates as written; WhatsApp is shown disabled until a phone number
//! identifier is filled in.

/// Returns a canonical example `flood-alert.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# flood-alert.toml

# Input locations, relative to --data-dir.
[paths]
recipients = "recipients.csv"
forecasts = "forecasts"

# Dispatch state store, relative to --data-dir.
[store]
path = "state/dispatch.sqlite"
busy_timeout_ms = 5000
journal_mode = "wal"        # wal | delete
sync_mode = "full"          # full | normal

[dispatch]
credential_failure = "abort_run"   # abort_run | skip_channel
max_failed_sends = 0               # failed sends tolerated before a non-zero exit
workers = 1                        # 1..=16

[email]
enabled = true
smtp_host = "smtp.gmail.com"
smtp_port = 465
tls = "wrapper"             # wrapper | starttls | none
from = "Flood Alerts <alerts@example.org>"
# username = "alerts@example.org"
timeout_ms = 30000

[email.retry]
max_retries = 3
initial_backoff_ms = 500
max_backoff_ms = 8000
multiplier = 2

[whatsapp]
enabled = false
api_base_url = "https://graph.facebook.com/v21.0"
phone_number_id = ""
timeout_ms = 30000

[whatsapp.retry]
max_retries = 3
initial_backoff_ms = 500
max_backoff_ms = 8000
multiplier = 2

# Credential cache, relative to --config-dir.
[credentials]
store_file = "credentials.json"
key_file = "credentials.key"
# ttl_days = 90

[composer]
title = "Flood Forecasting System Alert"

# FLOOD_ALERT_LOG overrides the level with a full filter directive.
[logging]
level = "info"
format = "text"             # text | json
"#,
    )
}
