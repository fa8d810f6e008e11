// crates/flood-alert-cli/src/main.rs
// ============================================================================
// Module: Flood Alert CLI Entry Point
// Description: Command dispatcher for dispatch runs, credentials, and config.
// Purpose: Provide the scheduled-run entry point and operator utilities.
// Dependencies: clap, flood-alert-cli, flood-alert-config, thiserror
// ============================================================================

//! ## Overview
//! `flood-alert run` performs one dispatch run and prints its report to
//! stdout; the exit code is zero only when the run reached `DONE` with no more
//! failed sends than `dispatch.max_failed_sends`. `credentials` seeds or
//! clears cached channel secrets and `config` validates or prints the
//! configuration file. Logs go to stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use flood_alert_cli::logging::init_logging;
use flood_alert_cli::report::render_json;
use flood_alert_cli::report::render_text;
use flood_alert_cli::runner::RunOptions;
use flood_alert_cli::runner::open_credentials;
use flood_alert_cli::runner::run_dispatch;
use flood_alert_config::AlertConfig;
use flood_alert_config::config_toml_example;
use flood_alert_core::Channel;
use flood_alert_credentials::Prompt;
use flood_alert_credentials::TerminalPrompt;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "flood-alert", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Dispatch alerts for every unsent forecast, recipient, and channel.
    Run(RunCommand),
    /// Credential cache utilities.
    Credentials {
        /// Selected credentials subcommand.
        #[command(subcommand)]
        command: CredentialsCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Directory containing flood-alert.toml and the credential cache.
    #[arg(long, value_name = "DIR")]
    config_dir: PathBuf,
    /// Directory containing recipients, forecasts, and dispatch state.
    #[arg(long, value_name = "DIR")]
    data_dir: PathBuf,
    /// Fail on missing credentials instead of prompting.
    #[arg(long, action = ArgAction::SetTrue)]
    non_interactive: bool,
    /// Print the report as JSON.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

/// Credentials subcommands.
#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Read a secret from the terminal (or stdin) and cache it.
    Set(CredentialsTarget),
    /// Remove a cached secret.
    Clear(CredentialsTarget),
}

/// Arguments shared by credentials subcommands.
#[derive(Args, Debug)]
struct CredentialsTarget {
    /// Directory containing flood-alert.toml and the credential cache.
    #[arg(long, value_name = "DIR")]
    config_dir: PathBuf,
    /// Channel whose credential is managed.
    #[arg(long, value_enum)]
    channel: ChannelArg,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate flood-alert.toml.
    Validate(ConfigValidateCommand),
    /// Print a complete example flood-alert.toml.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Directory containing flood-alert.toml.
    #[arg(long, value_name = "DIR")]
    config_dir: PathBuf,
}

/// Channel selector.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ChannelArg {
    /// SMTP email.
    Email,
    /// WhatsApp Cloud API.
    Whatsapp,
}

impl From<ChannelArg> for Channel {
    fn from(value: ChannelArg) -> Self {
        match value {
            ChannelArg::Email => Self::Email,
            ChannelArg::Whatsapp => Self::WhatsApp,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(&command),
        Commands::Credentials {
            command,
        } => match command {
            CredentialsCommand::Set(target) => command_credentials_set(&target),
            CredentialsCommand::Clear(target) => command_credentials_clear(&target),
        },
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
            ConfigCommand::Example => command_config_example(),
        },
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config_dir)?;
    start_logging(&config)?;
    let options = RunOptions {
        config_dir: command.config_dir.clone(),
        data_dir: command.data_dir.clone(),
        interactive: !command.non_interactive,
    };
    let report = run_dispatch(&config, &options);
    let rendered = if command.json {
        render_json(&report)
            .map_err(|err| CliError::new(format!("failed to serialize report: {err}")))?
    } else {
        render_text(&report)
    };
    write_stdout(&rendered)?;
    if report.is_success(config.dispatch.max_failed_sends) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// SECTION: Credentials Commands
// ============================================================================

/// Executes `credentials set`.
fn command_credentials_set(target: &CredentialsTarget) -> CliResult<ExitCode> {
    let config = load_config(&target.config_dir)?;
    start_logging(&config)?;
    let channel = Channel::from(target.channel);
    let manager = open_credentials(&config, &target.config_dir, TerminalPrompt)
        .map_err(|err| CliError::new(err.to_string()))?;
    let account = manager.account(channel).to_string();
    let secret = TerminalPrompt
        .read_secret(channel, &account)
        .map_err(|err| CliError::new(format!("failed to read {channel} secret: {err}")))?;
    manager
        .set(channel, &secret)
        .map_err(|err| CliError::new(format!("failed to store {channel} credential: {err}")))?;
    info!(%channel, "credential seeded");
    write_stdout(&format!("stored {channel} credential for account `{account}`\n"))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `credentials clear`.
fn command_credentials_clear(target: &CredentialsTarget) -> CliResult<ExitCode> {
    let config = load_config(&target.config_dir)?;
    start_logging(&config)?;
    let channel = Channel::from(target.channel);
    let manager = open_credentials(&config, &target.config_dir, TerminalPrompt)
        .map_err(|err| CliError::new(err.to_string()))?;
    let removed = manager
        .clear(channel)
        .map_err(|err| CliError::new(format!("failed to clear {channel} credential: {err}")))?;
    if removed {
        write_stdout(&format!("cleared {channel} credential\n"))?;
    } else {
        write_stdout(&format!("no {channel} credential cached\n"))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config_dir)?;
    let channels: Vec<&str> = config.enabled_channels().into_iter().map(Channel::as_str).collect();
    write_stdout(&format!("config ok; enabled channels: {}\n", channels.join(", ")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config example`.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout(&config_toml_example())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates the configuration in `config_dir`.
fn load_config(config_dir: &Path) -> CliResult<AlertConfig> {
    AlertConfig::load_from_dir(config_dir)
        .map_err(|err| CliError::new(format!("failed to load configuration: {err}")))
}

/// Installs the stderr subscriber from the logging section.
fn start_logging(config: &AlertConfig) -> CliResult<()> {
    init_logging(&config.logging).map_err(|err| CliError::new(err.to_string()))
}

/// Writes `text` to stdout unchanged.
fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
