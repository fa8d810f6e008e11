// crates/flood-alert-config/src/config.rs
// ============================================================================
// Module: Flood Alert Configuration
// Description: Configuration loading and validation for flood alert runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: flood-alert-core, flood-alert-channels, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is read from `flood-alert.toml` in the configuration
//! directory. Every section is optional and defaulted, unknown keys are
//! rejected, and the loaded document is validated before use. Data paths are
//! resolved against the data directory and credential files against the
//! configuration directory; absolute paths are used as written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use flood_alert_channels::EmailSenderConfig;
use flood_alert_channels::RetryPolicy;
use flood_alert_channels::SmtpTls;
use flood_alert_channels::WhatsAppSenderConfig;
use flood_alert_core::Channel;
use flood_alert_core::CredentialFailurePolicy;
use flood_alert_core::MAX_WORKERS;
use flood_alert_core::OrchestratorConfig;
use flood_alert_core::runtime::DEFAULT_TITLE;
use flood_alert_credentials::CredentialManagerConfig;
use flood_alert_store_sqlite::SqliteStoreConfig;
use flood_alert_store_sqlite::SqliteStoreMode;
use flood_alert_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Configuration file name inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "flood-alert.toml";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum network timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum network timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Default network timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum retries after the first attempt.
pub(crate) const MAX_RETRIES: u32 = 10;
/// Maximum backoff between attempts in milliseconds.
pub(crate) const MAX_BACKOFF_MS: u64 = 60_000;
/// Maximum credential lifetime in days.
pub(crate) const MAX_TTL_DAYS: u32 = 3650;
/// Maximum length of the alert title.
pub(crate) const MAX_TITLE_LENGTH: usize = 200;
/// Log levels accepted by `[logging] level`.
pub(crate) const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Flood alert dispatch configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertConfig {
    /// Input file locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Dispatch state store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Run policy settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Email channel settings.
    #[serde(default)]
    pub email: EmailConfig,
    /// WhatsApp channel settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    /// Credential cache settings.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Message composition settings.
    #[serde(default)]
    pub composer: ComposerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AlertConfig {
    /// Returns the configuration file path for `config_dir`.
    #[must_use]
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads and validates `flood-alert.toml` from `config_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&Self::path_in(config_dir))
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.store.validate()?;
        self.dispatch.validate()?;
        self.email.validate()?;
        self.whatsapp.validate()?;
        self.credentials.validate()?;
        self.composer.validate()?;
        self.logging.validate()?;
        if self.enabled_channels().is_empty() {
            return Err(ConfigError::Invalid(
                "at least one of email.enabled or whatsapp.enabled must be true".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the enabled channels in dispatch order.
    #[must_use]
    pub fn enabled_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|channel| match channel {
                Channel::Email => self.email.enabled,
                Channel::WhatsApp => self.whatsapp.enabled,
            })
            .collect()
    }

    /// Returns the recipient file path under `data_dir`.
    #[must_use]
    pub fn recipients_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.paths.recipients)
    }

    /// Returns the forecast directory under `data_dir`.
    #[must_use]
    pub fn forecasts_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.paths.forecasts)
    }

    /// Returns the state store settings with the path resolved under `data_dir`.
    #[must_use]
    pub fn sqlite_store_config(&self, data_dir: &Path) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: data_dir.join(&self.store.path),
            busy_timeout_ms: self.store.busy_timeout_ms,
            journal_mode: self.store.journal_mode,
            sync_mode: self.store.sync_mode,
        }
    }

    /// Returns the orchestrator settings.
    #[must_use]
    pub const fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            credential_failure: self.dispatch.credential_failure,
            workers: self.dispatch.workers,
        }
    }

    /// Returns the email sender settings.
    #[must_use]
    pub fn email_sender_config(&self) -> EmailSenderConfig {
        EmailSenderConfig {
            smtp_host: self.email.smtp_host.clone(),
            smtp_port: self.email.smtp_port,
            tls: self.email.tls,
            from: self.email.from.clone(),
            timeout_ms: self.email.timeout_ms,
            retry: self.email.retry,
        }
    }

    /// Returns the WhatsApp sender settings.
    #[must_use]
    pub fn whatsapp_sender_config(&self) -> WhatsAppSenderConfig {
        WhatsAppSenderConfig {
            api_base_url: self.whatsapp.api_base_url.clone(),
            phone_number_id: self.whatsapp.phone_number_id.clone(),
            timeout_ms: self.whatsapp.timeout_ms,
            retry: self.whatsapp.retry,
        }
    }

    /// Returns the credential manager settings.
    #[must_use]
    pub fn credential_manager_config(&self) -> CredentialManagerConfig {
        let mut accounts = BTreeMap::new();
        accounts.insert(Channel::Email, self.email.account());
        accounts.insert(Channel::WhatsApp, self.whatsapp.phone_number_id.trim().to_string());
        CredentialManagerConfig {
            accounts,
            ttl_days: self.credentials.ttl_days,
        }
    }

    /// Returns the credential cache path under `config_dir`.
    #[must_use]
    pub fn credential_store_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.credentials.store_file)
    }

    /// Returns the credential key path under `config_dir`.
    #[must_use]
    pub fn credential_key_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.credentials.key_file)
    }
}

/// Input file locations, relative to the data directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Recipient CSV file.
    #[serde(default = "default_recipients_path")]
    pub recipients: String,
    /// Directory scanned for forecast CSV files.
    #[serde(default = "default_forecasts_path")]
    pub forecasts: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            recipients: default_recipients_path(),
            forecasts: default_forecasts_path(),
        }
    }
}

impl PathsConfig {
    /// Validates input paths.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.recipients", &self.recipients)?;
        validate_path_string("paths.forecasts", &self.forecasts)
    }
}

/// Dispatch state store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `SQLite` database path, relative to the data directory.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path)?;
        if self.busy_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be at most {MAX_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Run policy settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Policy when a channel credential cannot be obtained.
    #[serde(default)]
    pub credential_failure: CredentialFailurePolicy,
    /// Failed sends tolerated before the run exits non-zero.
    #[serde(default)]
    pub max_failed_sends: usize,
    /// Dispatch worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            credential_failure: CredentialFailurePolicy::default(),
            max_failed_sends: 0,
            workers: default_workers(),
        }
    }
}

impl DispatchConfig {
    /// Validates run policy settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "dispatch.workers must be between 1 and {MAX_WORKERS}"
            )));
        }
        Ok(())
    }
}

/// Email channel settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Whether email notifications are sent.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Connection security.
    #[serde(default)]
    pub tls: SmtpTls,
    /// Sender mailbox, e.g. `Flood Alerts <alerts@example.org>`.
    #[serde(default)]
    pub from: String,
    /// SMTP login; defaults to the sender address.
    #[serde(default)]
    pub username: Option<String>,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            tls: SmtpTls::default(),
            from: String::new(),
            username: None,
            timeout_ms: default_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EmailConfig {
    /// Returns the SMTP login used as the credential account.
    #[must_use]
    pub fn account(&self) -> String {
        if let Some(username) = &self.username
            && !username.trim().is_empty()
        {
            return username.trim().to_string();
        }
        mailbox_address(&self.from).to_string()
    }

    /// Validates email settings; transport fields are only required when enabled.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_retry("email.retry", &self.retry)?;
        if !self.enabled {
            return Ok(());
        }
        if self.smtp_host.trim().is_empty() {
            return Err(ConfigError::Invalid("email.smtp_host must be set".to_string()));
        }
        if self.smtp_port == 0 {
            return Err(ConfigError::Invalid("email.smtp_port must be non-zero".to_string()));
        }
        let address = mailbox_address(&self.from);
        if address.is_empty() {
            return Err(ConfigError::Invalid("email.from must be set".to_string()));
        }
        if !address.contains('@') {
            return Err(ConfigError::Invalid(format!(
                "email.from `{}` is not an email address",
                self.from
            )));
        }
        validate_timeout("email.timeout_ms", self.timeout_ms)
    }
}

/// WhatsApp channel settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Whether WhatsApp notifications are sent.
    #[serde(default)]
    pub enabled: bool,
    /// Cloud API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Business phone number identifier.
    #[serde(default)]
    pub phone_number_id: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: default_api_base_url(),
            phone_number_id: String::new(),
            timeout_ms: default_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl WhatsAppConfig {
    /// Validates WhatsApp settings; transport fields are only required when enabled.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_retry("whatsapp.retry", &self.retry)?;
        if !self.enabled {
            return Ok(());
        }
        let url = Url::parse(self.api_base_url.trim()).map_err(|err| {
            ConfigError::Invalid(format!("whatsapp.api_base_url is not a valid url: {err}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "whatsapp.api_base_url must use http or https".to_string(),
            ));
        }
        let phone_number_id = self.phone_number_id.trim();
        if phone_number_id.is_empty() {
            return Err(ConfigError::Invalid("whatsapp.phone_number_id must be set".to_string()));
        }
        if !phone_number_id.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid(
                "whatsapp.phone_number_id must be alphanumeric".to_string(),
            ));
        }
        validate_timeout("whatsapp.timeout_ms", self.timeout_ms)
    }
}

/// Credential cache settings, relative to the configuration directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Encrypted cache file.
    #[serde(default = "default_credential_store_file")]
    pub store_file: String,
    /// Key file.
    #[serde(default = "default_credential_key_file")]
    pub key_file: String,
    /// Days a stored credential stays valid; unset never expires.
    #[serde(default)]
    pub ttl_days: Option<u32>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            store_file: default_credential_store_file(),
            key_file: default_credential_key_file(),
            ttl_days: None,
        }
    }
}

impl CredentialsConfig {
    /// Validates credential cache settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("credentials.store_file", &self.store_file)?;
        validate_path_string("credentials.key_file", &self.key_file)?;
        if self.store_file.trim() == self.key_file.trim() {
            return Err(ConfigError::Invalid(
                "credentials.store_file and credentials.key_file must differ".to_string(),
            ));
        }
        if let Some(days) = self.ttl_days
            && (days == 0 || days > MAX_TTL_DAYS)
        {
            return Err(ConfigError::Invalid(format!(
                "credentials.ttl_days must be between 1 and {MAX_TTL_DAYS}"
            )));
        }
        Ok(())
    }
}

/// Message composition settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposerConfig {
    /// Title line of every alert.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

impl ComposerConfig {
    /// Validates composer settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ConfigError::Invalid("composer.title must be non-empty".to_string()));
        }
        if title.len() > MAX_TITLE_LENGTH || title.contains(['\r', '\n']) {
            return Err(ConfigError::Invalid(format!(
                "composer.title must be a single line of at most {MAX_TITLE_LENGTH} bytes"
            )));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level when `FLOOD_ALERT_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the config file path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a network timeout.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Validates a retry policy.
fn validate_retry(field: &str, retry: &RetryPolicy) -> Result<(), ConfigError> {
    if retry.max_retries > MAX_RETRIES {
        return Err(ConfigError::Invalid(format!(
            "{field}.max_retries must be at most {MAX_RETRIES}"
        )));
    }
    if retry.multiplier == 0 {
        return Err(ConfigError::Invalid(format!("{field}.multiplier must be at least 1")));
    }
    if retry.max_backoff_ms > MAX_BACKOFF_MS {
        return Err(ConfigError::Invalid(format!(
            "{field}.max_backoff_ms must be at most {MAX_BACKOFF_MS}"
        )));
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        return Err(ConfigError::Invalid(format!(
            "{field}.initial_backoff_ms must not exceed max_backoff_ms"
        )));
    }
    Ok(())
}

/// Extracts the address from `Name <addr>` or returns the trimmed input.
fn mailbox_address(mailbox: &str) -> &str {
    let trimmed = mailbox.trim();
    match (trimmed.rfind('<'), trimmed.rfind('>')) {
        (Some(start), Some(end)) if start < end => trimmed[start + 1 .. end].trim(),
        _ => trimmed,
    }
}

/// Default recipient file.
fn default_recipients_path() -> String {
    "recipients.csv".to_string()
}

/// Default forecast directory.
fn default_forecasts_path() -> String {
    "forecasts".to_string()
}

/// Default state store path.
fn default_store_path() -> String {
    "state/dispatch.sqlite".to_string()
}

/// Default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    5_000
}

/// Default worker count.
const fn default_workers() -> usize {
    1
}

/// Serde helper for `true` defaults.
const fn default_true() -> bool {
    true
}

/// Default SMTP relay.
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

/// Default SMTP port for implicit TLS.
const fn default_smtp_port() -> u16 {
    465
}

/// Default network timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default WhatsApp Cloud API base URL.
fn default_api_base_url() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

/// Default credential cache file.
fn default_credential_store_file() -> String {
    "credentials.json".to_string()
}

/// Default credential key file.
fn default_credential_key_file() -> String {
    "credentials.key".to_string()
}

/// Default alert title.
fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Default log level.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::mailbox_address;

    #[test]
    fn mailbox_address_strips_display_names() {
        assert_eq!(mailbox_address("Flood Alerts <alerts@example.org>"), "alerts@example.org");
        assert_eq!(mailbox_address(" ops@example.org "), "ops@example.org");
        assert_eq!(mailbox_address(""), "");
    }
}
