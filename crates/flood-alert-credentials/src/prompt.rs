// crates/flood-alert-credentials/src/prompt.rs
// ============================================================================
// Module: Credential Prompt
// Description: Interactive and non-interactive secret entry.
// Purpose: Let the credential manager ask an operator for a missing secret.
// Dependencies: flood-alert-core, crossterm
// ============================================================================

//! ## Overview
//! [`TerminalPrompt`] writes its question to stderr and reads the secret from
//! stdin, and only claims to be interactive when stdin is a terminal. On a
//! terminal the secret is typed in raw mode with echo off; piped stdin is read
//! as one line so seeding can be scripted.
//! [`NonInteractivePrompt`] never prompts, which turns a missing credential
//! into an authentication error instead of a hang.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::Write;

use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::terminal;
use crossterm::tty::IsTty;
use flood_alert_core::Channel;

// ============================================================================
// SECTION: Prompt Trait
// ============================================================================

/// Source of operator-entered secrets.
pub trait Prompt: Send + Sync {
    /// Returns true when the prompt can reach an operator.
    fn is_interactive(&self) -> bool;

    /// Asks for the secret of `account` on `channel`.
    ///
    /// # Errors
    ///
    /// Returns a message when the prompt fails or the operator enters nothing.
    fn read_secret(&self, channel: Channel, account: &str) -> Result<String, String>;
}

// ============================================================================
// SECTION: Terminal Prompt
// ============================================================================

/// Prompt on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_tty()
    }

    fn read_secret(&self, channel: Channel, account: &str) -> Result<String, String> {
        let label = if account.is_empty() {
            format!("{channel} secret: ")
        } else {
            format!("{channel} secret for {account}: ")
        };
        write_stderr(&label).map_err(|err| err.to_string())?;
        let secret = if std::io::stdin().is_tty() {
            let hidden = read_hidden_line();
            write_stderr("\n").map_err(|err| err.to_string())?;
            hidden?
        } else {
            read_piped_line()?
        };
        if secret.is_empty() {
            return Err("no secret entered".to_string());
        }
        Ok(secret)
    }
}

/// Writes prompt text to stderr and flushes it.
fn write_stderr(text: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    stderr.write_all(text.as_bytes()).and_then(|()| stderr.flush())
}

/// Reads one line from piped stdin without its line terminator.
fn read_piped_line() -> Result<String, String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).map_err(|err| err.to_string())?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Reads a line from the terminal in raw mode so typed characters are not
/// echoed. Raw mode is always switched off again before returning.
fn read_hidden_line() -> Result<String, String> {
    terminal::enable_raw_mode().map_err(|err| format!("cannot hide input: {err}"))?;
    let read = read_keys();
    let restored = terminal::disable_raw_mode();
    let line = read?;
    restored.map_err(|err| format!("cannot restore terminal: {err}"))?;
    Ok(line)
}

/// Collects key presses until the line is submitted or cancelled.
fn read_keys() -> Result<String, String> {
    let mut line = String::new();
    loop {
        let Event::Key(key) = event::read().map_err(|err| err.to_string())? else {
            continue;
        };
        match apply_key(&mut line, &key) {
            KeyStep::Continue => {}
            KeyStep::Submit => return Ok(line),
            KeyStep::Cancel => return Err("secret entry cancelled".to_string()),
        }
    }
}

/// Effect of one key event on hidden entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyStep {
    /// Keep reading.
    Continue,
    /// The line is complete.
    Submit,
    /// The operator abandoned entry.
    Cancel,
}

/// Applies `key` to the line being typed.
fn apply_key(line: &mut String, key: &KeyEvent) -> KeyStep {
    if key.kind == KeyEventKind::Release {
        return KeyStep::Continue;
    }
    match key.code {
        KeyCode::Enter => KeyStep::Submit,
        KeyCode::Esc => KeyStep::Cancel,
        KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyStep::Cancel
        }
        KeyCode::Char(ch) => {
            line.push(ch);
            KeyStep::Continue
        }
        KeyCode::Backspace => {
            line.pop();
            KeyStep::Continue
        }
        _ => KeyStep::Continue,
    }
}

// ============================================================================
// SECTION: Non-Interactive Prompt
// ============================================================================

/// Prompt that never reaches an operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompt;

impl Prompt for NonInteractivePrompt {
    fn is_interactive(&self) -> bool {
        false
    }

    fn read_secret(&self, channel: Channel, _account: &str) -> Result<String, String> {
        Err(format!("cannot prompt for {channel} secret in non-interactive mode"))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
