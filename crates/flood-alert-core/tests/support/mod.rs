// crates/flood-alert-core/tests/support/mod.rs
// ============================================================================
// Module: Core Test Support
// Description: Shared fixtures for flood alert core integration tests.
// Purpose: Provide scripted senders, credentials, clocks, and input files.
// ============================================================================

//! ## Overview
//! Test doubles for the orchestrator interfaces plus helpers that write
//! recipient and forecast files into a temporary directory.

#![allow(dead_code, reason = "Each test binary uses a subset of the shared fixtures.")]

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use flood_alert_core::AuthenticationError;
use flood_alert_core::Channel;
use flood_alert_core::ChannelSender;
use flood_alert_core::Clock;
use flood_alert_core::Credential;
use flood_alert_core::CredentialProvider;
use flood_alert_core::Message;
use flood_alert_core::SendOutcome;
use flood_alert_core::Timestamp;

/// Recipient file used by the reference scenario.
pub const SCENARIO_RECIPIENTS: &str = "\
name,email,whatsapp,notify_email,notify_whatsapp
A,a@x.com,,yes,no
B,b@x.com,+15550100,yes,yes
";

/// Forecast file used by the reference scenario.
pub const SCENARIO_FORECAST: &str = "\
site,timestamp,level,discharge
S1,2025-01-01T00:00,HIGH,412.5
";

/// Clock returning a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.0)
    }
}

/// One call observed by a scripted sender.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Addresses passed to the sender.
    pub addresses: Vec<String>,
    /// Message passed to the sender.
    pub message: Message,
    /// Secret of the credential used.
    pub secret: String,
    /// Whether the scripted outcome was a success.
    pub success: bool,
}

/// Mutable state behind a scripted sender.
#[derive(Debug, Default)]
struct SenderState {
    /// Outcomes returned in order; success once exhausted.
    script: VecDeque<SendOutcome>,
    /// Calls observed so far.
    deliveries: Vec<Delivery>,
}

/// Sender returning scripted outcomes and recording every call.
#[derive(Debug, Clone)]
pub struct ScriptedSender {
    /// Channel served.
    channel: Channel,
    /// Shared state, observable after the sender moves into an orchestrator.
    state: Arc<Mutex<SenderState>>,
}

impl ScriptedSender {
    /// Creates a sender that always succeeds.
    pub fn new(channel: Channel) -> Self {
        Self::with_script(channel, Vec::new())
    }

    /// Creates a sender returning `outcomes` in order, then succeeding.
    pub fn with_script(channel: Channel, outcomes: Vec<SendOutcome>) -> Self {
        Self {
            channel,
            state: Arc::new(Mutex::new(SenderState {
                script: outcomes.into(),
                deliveries: Vec::new(),
            })),
        }
    }

    /// Appends outcomes to the script.
    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = SendOutcome>) {
        self.state.lock().unwrap().script.extend(outcomes);
    }

    /// Returns every observed call.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.lock().unwrap().deliveries.clone()
    }

    /// Returns the number of observed calls.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().deliveries.len()
    }
}

impl ChannelSender for ScriptedSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn send(
        &self,
        addresses: &[String],
        message: &Message,
        credential: &Credential,
    ) -> SendOutcome {
        let mut state = self.state.lock().unwrap();
        let outcome = state.script.pop_front().unwrap_or_else(|| SendOutcome::delivered(1));
        state.deliveries.push(Delivery {
            addresses: addresses.to_vec(),
            message: message.clone(),
            secret: credential.secret.clone(),
            success: outcome.success,
        });
        outcome
    }
}

/// Credential provider backed by maps, standing in for the cache and the prompt.
#[derive(Debug, Clone, Default)]
pub struct MapCredentials {
    /// Currently cached credentials.
    cached: Arc<Mutex<BTreeMap<Channel, Credential>>>,
    /// Credentials a prompt would supply after invalidation.
    prompt: Arc<Mutex<BTreeMap<Channel, Credential>>>,
    /// Invalidation log.
    invalidated: Arc<Mutex<Vec<Channel>>>,
}

impl MapCredentials {
    /// Creates a provider with cached credentials for the given channels.
    pub fn cached(channels: &[Channel]) -> Self {
        let provider = Self::default();
        for channel in channels {
            provider
                .cached
                .lock()
                .unwrap()
                .insert(*channel, Credential::new("sender", format!("{channel}-secret")));
        }
        provider
    }

    /// Registers the credential a prompt supplies after invalidation.
    pub fn with_prompt(self, channel: Channel, secret: &str) -> Self {
        self.prompt.lock().unwrap().insert(channel, Credential::new("sender", secret));
        self
    }

    /// Returns channels invalidated so far.
    pub fn invalidated(&self) -> Vec<Channel> {
        self.invalidated.lock().unwrap().clone()
    }
}

impl CredentialProvider for MapCredentials {
    fn get(&self, channel: Channel) -> Result<Credential, AuthenticationError> {
        if let Some(credential) = self.cached.lock().unwrap().get(&channel) {
            return Ok(credential.clone());
        }
        let prompted = self.prompt.lock().unwrap().remove(&channel);
        match prompted {
            Some(credential) => {
                self.cached.lock().unwrap().insert(channel, credential.clone());
                Ok(credential)
            }
            None => Err(AuthenticationError::NonInteractive(channel)),
        }
    }

    fn invalidate(&self, channel: Channel) {
        self.cached.lock().unwrap().remove(&channel);
        self.invalidated.lock().unwrap().push(channel);
    }
}

/// Writes a file under `dir` and returns its path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Creates a forecast directory under `root` holding the given files.
pub fn forecast_dir(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join("forecasts");
    std::fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        write_file(&dir, name, contents);
    }
    dir
}
