// crates/flood-alert-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Flood Alert Dispatch Orchestrator
// Description: Run state machine joining forecasts, recipients, and channels.
// Purpose: Deliver every new notification at most once and report the run.
// Dependencies: crate::{core, interfaces, runtime}, tracing
// ============================================================================

//! ## Overview
//! A run moves through `LOADING -> DISPATCHING -> REPORTING -> DONE`. Loading
//! aborts when the state store or the recipient registry is unusable; a
//! malformed forecast file is recorded and skipped.
//!
//! Dispatch walks every (forecast, recipient, enabled channel) combination in
//! stable order (forecast timestamp, forecast key, recipient identity,
//! channel). Combinations already recorded as `sent` are skipped. For the
//! rest, a `pending` record is written before the send and the final outcome
//! after it, so a crash between the two biases the next run toward resending.
//!
//! Security posture: credentials are resolved through [`CredentialProvider`]
//! and only handed to the sender for the channel they belong to.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::channel::Channel;
use crate::core::dispatch::DispatchKey;
use crate::core::dispatch::DispatchRecord;
use crate::core::forecast::ForecastRecord;
use crate::core::identifiers::RecipientId;
use crate::core::message::Message;
use crate::core::recipient::Recipient;
use crate::core::report::AbortKind;
use crate::core::report::FileFailure;
use crate::core::report::NotificationFailure;
use crate::core::report::RunAbort;
use crate::core::report::RunPhase;
use crate::core::report::RunReport;
use crate::core::report::SkippedChannel;
use crate::interfaces::AuthenticationError;
use crate::interfaces::ChannelSender;
use crate::interfaces::Clock;
use crate::interfaces::CredentialProvider;
use crate::interfaces::DispatchStateStore;
use crate::interfaces::FailureKind;
use crate::interfaces::SendOutcome;
use crate::interfaces::StateStoreError;
use crate::runtime::composer::NotificationComposer;
use crate::runtime::ingest::ForecastIngestor;
use crate::runtime::registry::RecipientRegistry;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Upper bound on dispatch worker threads.
pub const MAX_WORKERS: usize = 16;

/// Policy applied when a channel credential cannot be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialFailurePolicy {
    /// Abort the whole run.
    #[default]
    AbortRun,
    /// Record the channel's notifications as failed and continue with the others.
    SkipChannel,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Credential failure policy.
    pub credential_failure: CredentialFailurePolicy,
    /// Worker threads used for dispatch (clamped to `1..=MAX_WORKERS`).
    pub workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            credential_failure: CredentialFailurePolicy::AbortRun,
            workers: 1,
        }
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Top-level dispatch controller.
pub struct DispatchOrchestrator<S, C, K> {
    /// Durable dispatch log.
    store: S,
    /// Credential source.
    credentials: C,
    /// Record timestamp source.
    clock: K,
    /// Registered senders keyed by channel.
    senders: BTreeMap<Channel, Box<dyn ChannelSender>>,
    /// Message renderer.
    composer: NotificationComposer,
    /// Run configuration.
    config: OrchestratorConfig,
}

impl<S, C, K> DispatchOrchestrator<S, C, K>
where
    S: DispatchStateStore,
    C: CredentialProvider,
    K: Clock,
{
    /// Creates an orchestrator with no senders and the default composer.
    #[must_use]
    pub fn new(store: S, credentials: C, clock: K, config: OrchestratorConfig) -> Self {
        Self {
            store,
            credentials,
            clock,
            senders: BTreeMap::new(),
            composer: NotificationComposer::default(),
            config,
        }
    }

    /// Replaces the composer.
    #[must_use]
    pub fn with_composer(mut self, composer: NotificationComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Registers a sender for its channel, replacing any previous one.
    #[must_use]
    pub fn with_sender(mut self, sender: impl ChannelSender + 'static) -> Self {
        self.senders.insert(sender.channel(), Box::new(sender));
        self
    }

    /// Returns the dispatch state store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the credential provider.
    #[must_use]
    pub const fn credentials(&self) -> &C {
        &self.credentials
    }

    /// Executes one run and returns its report.
    ///
    /// The report is produced even when the run aborts; inspect
    /// [`RunReport::abort`] and [`RunReport::final_phase`].
    pub fn run(&self, recipients: &Path, forecasts: &ForecastIngestor) -> RunReport {
        let mut report = RunReport::default();
        if !enter(&mut report, RunPhase::Loading) {
            return report;
        }

        if let Err(err) = self.store.readiness() {
            abort_run(&mut report, AbortKind::StateStore, err.to_string());
            return report;
        }
        let registry = match RecipientRegistry::load(recipients) {
            Ok(registry) => registry,
            Err(err) => {
                abort_run(&mut report, AbortKind::Registry, err.to_string());
                return report;
            }
        };
        let records = load_forecasts(forecasts, &mut report);
        report.recipients = registry.len();
        report.forecasts = records.len();
        info!(
            recipients = report.recipients,
            forecasts = report.forecasts,
            rejected_files = report.file_failures.len(),
            "run inputs loaded"
        );

        self.dispatch(&registry, records, report)
    }

    /// Runs the `DISPATCHING` and `REPORTING` phases over loaded inputs.
    fn dispatch(
        &self,
        registry: &RecipientRegistry,
        mut records: Vec<ForecastRecord>,
        mut report: RunReport,
    ) -> RunReport {
        if !enter(&mut report, RunPhase::Dispatching) {
            return report;
        }
        records.sort_by(|left, right| {
            left.timestamp().cmp(&right.timestamp()).then_with(|| left.key.cmp(&right.key))
        });

        let plan = match self.plan(registry, &records, &mut report) {
            Ok(plan) => plan,
            Err(abort) => {
                abort_run(&mut report, abort.kind, abort.message);
                return report;
            }
        };
        let control = RunControl::default();
        if let Err(abort) = self.preflight_credentials(&plan, &control) {
            abort_run(&mut report, abort.kind, abort.message);
            return report;
        }

        let partial = self.execute(plan, &control);
        report.absorb(partial);
        report.skipped_channels.extend(control.skipped_channels());
        if let Some(abort) = control.take_abort() {
            abort_run(&mut report, abort.kind, abort.message);
            return report;
        }

        if !enter(&mut report, RunPhase::Reporting) {
            return report;
        }
        info!(
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            rejected_files = report.file_failures.len(),
            "run summary"
        );
        enter(&mut report, RunPhase::Done);
        report
    }

    /// Expands records and recipients into unsent work items.
    fn plan<'a>(
        &self,
        registry: &'a RecipientRegistry,
        records: &'a [ForecastRecord],
        report: &mut RunReport,
    ) -> Result<Vec<WorkItem<'a>>, RunAbort> {
        let mut unsupported: BTreeMap<Channel, usize> = BTreeMap::new();
        let mut items = Vec::new();
        for record in records {
            let eligible = registry.iter().filter(|recipient| recipient.is_subscribed(record.site()));
            for recipient in eligible {
                for channel in recipient.enabled_channels() {
                    if !self.senders.contains_key(&channel) {
                        *unsupported.entry(channel).or_default() += 1;
                        continue;
                    }
                    let key = DispatchKey::new(record.key.clone(), recipient.id().clone(), channel);
                    if self.store.has_sent(&key).map_err(store_abort)? {
                        debug!(
                            forecast_key = %key.forecast,
                            recipient = %key.recipient,
                            %channel,
                            "already sent; skipping"
                        );
                        report.skipped += 1;
                        continue;
                    }
                    items.push(WorkItem {
                        record,
                        recipient,
                        key,
                    });
                }
            }
        }
        for (channel, count) in unsupported {
            warn!(%channel, notifications = count, "channel has no configured sender");
            report.skipped_channels.push(SkippedChannel {
                channel,
                reason: format!("no sender configured; {count} notification(s) not attempted"),
            });
        }
        Ok(items)
    }

    /// Resolves credentials for every channel with unsent work before any send.
    fn preflight_credentials(
        &self,
        plan: &[WorkItem<'_>],
        control: &RunControl,
    ) -> Result<(), RunAbort> {
        let channels: BTreeSet<Channel> = plan.iter().map(|item| item.key.channel).collect();
        for channel in channels {
            if let Err(err) = self.credentials.get(channel)
                && let Some(abort) = self.apply_credential_policy(channel, &err, control)
            {
                return Err(abort);
            }
        }
        Ok(())
    }

    /// Runs work items, in parallel partitions when more than one worker is configured.
    fn execute(&self, plan: Vec<WorkItem<'_>>, control: &RunControl) -> RunReport {
        let workers = self.config.workers.clamp(1, MAX_WORKERS);
        if workers == 1 {
            return self.process(&plan, control);
        }

        let mut partitions: BTreeMap<(RecipientId, Channel), Vec<WorkItem<'_>>> = BTreeMap::new();
        for item in plan {
            partitions
                .entry((item.key.recipient.clone(), item.key.channel))
                .or_default()
                .push(item);
        }
        let bucket_count = workers.min(partitions.len());
        if bucket_count == 0 {
            return RunReport::default();
        }
        let mut buckets: Vec<Vec<WorkItem<'_>>> = (0 .. bucket_count).map(|_| Vec::new()).collect();
        for (index, (_, items)) in partitions.into_iter().enumerate() {
            buckets[index % bucket_count].extend(items);
        }
        debug!(workers = bucket_count, "dispatching with worker threads");

        let mut report = std::thread::scope(|scope| {
            let handles: Vec<_> = buckets
                .iter()
                .map(|bucket| scope.spawn(move || self.process(bucket, control)))
                .collect();
            let mut report = RunReport::default();
            for handle in handles {
                match handle.join() {
                    Ok(partial) => report.absorb(partial),
                    Err(_) => control.abort(RunAbort {
                        kind: AbortKind::Internal,
                        message: "dispatch worker panicked".to_string(),
                    }),
                }
            }
            report
        });
        report.failures.sort_by(|left, right| {
            (&left.recipient, left.channel, &left.forecast_key).cmp(&(
                &right.recipient,
                right.channel,
                &right.forecast_key,
            ))
        });
        report
    }

    /// Processes work items in order until done or aborted.
    fn process(&self, items: &[WorkItem<'_>], control: &RunControl) -> RunReport {
        let mut report = RunReport::default();
        for item in items {
            if control.is_aborted() {
                break;
            }
            if let Err(abort) = self.dispatch_item(item, control, &mut report) {
                control.abort(abort);
                break;
            }
        }
        report
    }

    /// Sends one notification and records its outcome.
    fn dispatch_item(
        &self,
        item: &WorkItem<'_>,
        control: &RunControl,
        report: &mut RunReport,
    ) -> Result<(), RunAbort> {
        let key = &item.key;
        let channel = key.channel;
        if let Some(reason) = control.skipped_reason(channel) {
            let detail = format!("channel skipped: {reason}");
            self.store_record(&DispatchRecord::failed(key.clone(), self.clock.now(), 0, &detail))?;
            report.push_failure(notification_failure(key, detail));
            return Ok(());
        }
        let Some(sender) = self.senders.get(&channel) else {
            return Ok(());
        };

        let message = self.composer.compose(item.record, channel);
        self.store_record(&DispatchRecord::pending(key.clone(), self.clock.now()))?;
        let (outcome, abort) =
            self.deliver(sender.as_ref(), item.recipient.addresses(channel), &message, key, control);

        let now = self.clock.now();
        if outcome.success {
            self.store_record(&DispatchRecord::sent(key.clone(), now, outcome.attempts))?;
            info!(
                forecast_key = %key.forecast,
                recipient = %key.recipient,
                %channel,
                attempts = outcome.attempts,
                "notification sent"
            );
            report.sent += 1;
        } else {
            let detail = outcome.error().unwrap_or_else(|| "send failed".to_string());
            self.store_record(&DispatchRecord::failed(key.clone(), now, outcome.attempts, &detail))?;
            warn!(
                forecast_key = %key.forecast,
                recipient = %key.recipient,
                %channel,
                attempts = outcome.attempts,
                error = %detail,
                "notification failed"
            );
            report.push_failure(notification_failure(key, detail));
        }
        abort.map_or(Ok(()), Err)
    }

    /// Sends with the cached credential, re-resolving once after a rejection.
    fn deliver(
        &self,
        sender: &dyn ChannelSender,
        addresses: &[String],
        message: &Message,
        key: &DispatchKey,
        control: &RunControl,
    ) -> (SendOutcome, Option<RunAbort>) {
        let channel = key.channel;
        let credential = match self.credentials.get(channel) {
            Ok(credential) => credential,
            Err(err) => return self.credential_unavailable(channel, &err, 0, control),
        };
        let first = sender.send(addresses, message, &credential);
        if first.failure_kind() != Some(FailureKind::CredentialRejected) {
            return (first, None);
        }

        warn!(
            forecast_key = %key.forecast,
            recipient = %key.recipient,
            %channel,
            "credential rejected; re-resolving"
        );
        self.credentials.invalidate(channel);
        let fresh = match self.credentials.get(channel) {
            Ok(credential) => credential,
            Err(err) => return self.credential_unavailable(channel, &err, first.attempts, control),
        };
        let retried = sender.send(addresses, message, &fresh);
        let attempts = first.attempts + retried.attempts;
        if retried.failure_kind() == Some(FailureKind::CredentialRejected) {
            self.credentials.invalidate(channel);
            return self.credential_unavailable(
                channel,
                &AuthenticationError::Rejected(channel),
                attempts,
                control,
            );
        }
        (
            SendOutcome {
                attempts,
                ..retried
            },
            None,
        )
    }

    /// Builds the failed outcome for a credential failure and applies the policy.
    fn credential_unavailable(
        &self,
        channel: Channel,
        err: &AuthenticationError,
        attempts: u32,
        control: &RunControl,
    ) -> (SendOutcome, Option<RunAbort>) {
        let abort = self.apply_credential_policy(channel, err, control);
        (SendOutcome::failed(FailureKind::CredentialRejected, err.to_string(), attempts), abort)
    }

    /// Applies the credential failure policy; returns the abort reason under `abort_run`.
    fn apply_credential_policy(
        &self,
        channel: Channel,
        err: &AuthenticationError,
        control: &RunControl,
    ) -> Option<RunAbort> {
        match self.config.credential_failure {
            CredentialFailurePolicy::AbortRun => Some(RunAbort {
                kind: AbortKind::Authentication,
                message: err.to_string(),
            }),
            CredentialFailurePolicy::SkipChannel => {
                warn!(%channel, error = %err, "credential unavailable; skipping channel for this run");
                control.skip_channel(channel, err.to_string());
                None
            }
        }
    }

    /// Writes a dispatch record, mapping failures to a run abort.
    fn store_record(&self, record: &DispatchRecord) -> Result<(), RunAbort> {
        self.store.record(record).map_err(store_abort)
    }
}

// ============================================================================
// SECTION: Work Items
// ============================================================================

/// One unsent (forecast, recipient, channel) combination.
struct WorkItem<'a> {
    /// Forecast record.
    record: &'a ForecastRecord,
    /// Recipient.
    recipient: &'a Recipient,
    /// Dispatch key.
    key: DispatchKey,
}

/// Shared abort and channel-skip state for one run.
#[derive(Default)]
struct RunControl {
    /// Fast abort flag checked before each send.
    aborted: AtomicBool,
    /// First abort reason.
    abort: Mutex<Option<RunAbort>>,
    /// Channels skipped for the rest of the run, with the reason.
    skipped: Mutex<BTreeMap<Channel, String>>,
}

impl RunControl {
    /// Returns true once any worker has aborted.
    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Records the abort reason (first one wins) and raises the flag.
    fn abort(&self, reason: RunAbort) {
        let mut slot = self.abort.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(reason);
        }
        drop(slot);
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Takes the abort reason, if any.
    fn take_abort(&self) -> Option<RunAbort> {
        self.abort.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Marks a channel as skipped for the rest of the run.
    fn skip_channel(&self, channel: Channel, reason: String) {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel)
            .or_insert(reason);
    }

    /// Returns the skip reason for a channel, if skipped.
    fn skipped_reason(&self, channel: Channel) -> Option<String> {
        self.skipped.lock().unwrap_or_else(PoisonError::into_inner).get(&channel).cloned()
    }

    /// Returns skipped channels in channel order.
    fn skipped_channels(&self) -> Vec<SkippedChannel> {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(channel, reason)| SkippedChannel {
                channel: *channel,
                reason: reason.clone(),
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Scans the forecast directory, recording rejected files in the report.
fn load_forecasts(ingestor: &ForecastIngestor, report: &mut RunReport) -> Vec<ForecastRecord> {
    let mut records = Vec::new();
    for file in ingestor.scan() {
        match file {
            Ok(file) => records.extend(file.records),
            Err(err) => {
                warn!(file = %err.file, error = %err.message, "forecast file rejected");
                report.file_failures.push(FileFailure {
                    file: err.file,
                    error: err.message,
                });
            }
        }
    }
    records
}

/// Enters a phase. A move the state machine forbids aborts the run instead
/// and returns false.
fn enter(report: &mut RunReport, phase: RunPhase) -> bool {
    if report.advance(phase) {
        debug!(%phase, "run phase");
        return true;
    }
    let from = report.final_phase().map_or("none", RunPhase::as_str);
    abort_run(report, AbortKind::Internal, format!("illegal phase transition {from} -> {phase}"));
    false
}

/// Moves the run to `ABORTED`. Ignored, with an error event, when the current
/// phase cannot abort.
fn abort_run(report: &mut RunReport, kind: AbortKind, message: String) {
    let phase = report.final_phase().map_or("none", RunPhase::as_str);
    if !report.advance(RunPhase::Aborted) {
        error!(phase, kind = kind.as_str(), error = %message, "abort outside an abortable phase");
        return;
    }
    error!(phase, kind = kind.as_str(), error = %message, "run aborted");
    report.abort = Some(RunAbort {
        kind,
        message,
    });
}

/// Maps a state store error into a run abort.
fn store_abort(err: StateStoreError) -> RunAbort {
    RunAbort {
        kind: AbortKind::StateStore,
        message: err.to_string(),
    }
}

/// Builds a report entry for a failed notification.
fn notification_failure(key: &DispatchKey, error: String) -> NotificationFailure {
    NotificationFailure {
        forecast_key: key.forecast.to_string(),
        recipient: key.recipient.clone(),
        channel: key.channel,
        error,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::abort_run;
    use super::enter;
    use crate::core::report::AbortKind;
    use crate::core::report::RunPhase;
    use crate::core::report::RunReport;

    #[test]
    fn illegal_phase_move_aborts_as_internal() {
        let mut report = RunReport::default();
        assert!(enter(&mut report, RunPhase::Loading));
        assert!(!enter(&mut report, RunPhase::Reporting));
        assert_eq!(report.phases, vec![RunPhase::Loading, RunPhase::Aborted]);
        let abort = report.abort.as_ref().map(|abort| (abort.kind, abort.message.as_str()));
        assert_eq!(
            abort,
            Some((AbortKind::Internal, "illegal phase transition LOADING -> REPORTING"))
        );
    }

    #[test]
    fn abort_after_done_keeps_the_finished_report() {
        let mut report = RunReport::default();
        for phase in [RunPhase::Loading, RunPhase::Dispatching, RunPhase::Reporting, RunPhase::Done] {
            assert!(enter(&mut report, phase));
        }
        abort_run(&mut report, AbortKind::StateStore, "late".to_string());
        assert!(report.is_done());
        assert!(report.abort.is_none());
    }

    #[test]
    fn second_abort_does_not_replace_the_first() {
        let mut report = RunReport::default();
        assert!(enter(&mut report, RunPhase::Loading));
        abort_run(&mut report, AbortKind::Registry, "missing column".to_string());
        abort_run(&mut report, AbortKind::StateStore, "locked".to_string());
        assert_eq!(report.phases, vec![RunPhase::Loading, RunPhase::Aborted]);
        assert_eq!(report.abort.map(|abort| abort.kind), Some(AbortKind::Registry));
    }
}
