// crates/flood-alert-cli/src/runner.rs
// ============================================================================
// Module: Run Wiring
// Description: Builds the production component graph for one dispatch run.
// Purpose: Connect config, store, credentials, and senders to the orchestrator.
// Dependencies: flood-alert-core, flood-alert-config, flood-alert-channels,
//               flood-alert-credentials, flood-alert-store-sqlite, tracing
// ============================================================================

//! ## Overview
//! A run opens the encrypted credential cache, the `SQLite` dispatch log, and
//! one sender per enabled channel, then hands them to the orchestrator.
//! Every setup failure yields an `ABORTED` report rather than an error, so
//! the caller always has a report to print.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use flood_alert_channels::EmailSender;
use flood_alert_channels::WhatsAppSender;
use flood_alert_config::AlertConfig;
use flood_alert_core::AbortKind;
use flood_alert_core::Channel;
use flood_alert_core::DispatchOrchestrator;
use flood_alert_core::ForecastIngestor;
use flood_alert_core::NotificationComposer;
use flood_alert_core::RunReport;
use flood_alert_core::SystemClock;
use flood_alert_credentials::CredentialManager;
use flood_alert_credentials::EncryptedCredentialStore;
use flood_alert_credentials::NonInteractivePrompt;
use flood_alert_credentials::Prompt;
use flood_alert_credentials::TerminalPrompt;
use flood_alert_store_sqlite::SqliteDispatchStore;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs of one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory holding `flood-alert.toml` and the credential cache.
    pub config_dir: PathBuf,
    /// Directory holding recipients, forecasts, and the state store.
    pub data_dir: PathBuf,
    /// Whether missing credentials may be prompted for.
    pub interactive: bool,
}

/// Errors raised while opening the credential cache.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The credential cache or key cannot be opened.
    #[error("credential store unavailable: {0}")]
    Credentials(String),
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Opens the credential manager for `config_dir` with the given prompt.
///
/// # Errors
///
/// Returns [`RunnerError::Credentials`] when the key file cannot be loaded.
pub fn open_credentials(
    config: &AlertConfig,
    config_dir: &Path,
    prompt: impl Prompt + 'static,
) -> Result<CredentialManager, RunnerError> {
    let store = EncryptedCredentialStore::open(
        &config.credential_store_path(config_dir),
        &config.credential_key_path(config_dir),
    )
    .map_err(|err| RunnerError::Credentials(err.to_string()))?;
    Ok(CredentialManager::new(store, prompt, config.credential_manager_config()))
}

/// Executes one dispatch run.
///
/// Setup failures abort the run while loading: an unreadable credential key
/// as `authentication`, an unopenable store as `state_store`, and a sender
/// that rejects its settings as `sender`.
#[must_use]
pub fn run_dispatch(config: &AlertConfig, options: &RunOptions) -> RunReport {
    let opened = if options.interactive {
        open_credentials(config, &options.config_dir, TerminalPrompt)
    } else {
        open_credentials(config, &options.config_dir, NonInteractivePrompt)
    };
    let credentials = match opened {
        Ok(credentials) => credentials,
        Err(err) => return setup_abort(AbortKind::Authentication, &err.to_string()),
    };
    let store = match SqliteDispatchStore::new(&config.sqlite_store_config(&options.data_dir)) {
        Ok(store) => store,
        Err(err) => return setup_abort(AbortKind::StateStore, &err.to_string()),
    };

    let mut orchestrator =
        DispatchOrchestrator::new(store, credentials, SystemClock, config.orchestrator_config())
            .with_composer(NotificationComposer::new(config.composer.title.trim()));
    for channel in config.enabled_channels() {
        let built = match channel {
            Channel::Email => EmailSender::new(&config.email_sender_config())
                .map(|sender| orchestrator.with_sender(sender)),
            Channel::WhatsApp => WhatsAppSender::new(&config.whatsapp_sender_config())
                .map(|sender| orchestrator.with_sender(sender)),
        };
        orchestrator = match built {
            Ok(orchestrator) => orchestrator,
            Err(err) => {
                return setup_abort(
                    AbortKind::Sender,
                    &format!("{channel} sender misconfigured: {err}"),
                );
            }
        };
    }

    let recipients = config.recipients_path(&options.data_dir);
    let forecasts = ForecastIngestor::new(config.forecasts_dir(&options.data_dir));
    info!(
        recipients = %recipients.display(),
        forecasts = %forecasts.directory().display(),
        interactive = options.interactive,
        "starting dispatch run"
    );
    let report = orchestrator.run(&recipients, &forecasts);
    if let Err(err) = orchestrator.credentials().persist() {
        warn!(error = %err, "credential cache not written at run end");
    }
    report
}

/// Logs a setup failure and returns the matching aborted report.
fn setup_abort(kind: AbortKind, message: &str) -> RunReport {
    error!(kind = kind.as_str(), error = message, "run setup failed");
    RunReport::aborted_while_loading(kind, message)
}
