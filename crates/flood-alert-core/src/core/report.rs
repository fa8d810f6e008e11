// crates/flood-alert-core/src/core/report.rs
// ============================================================================
// Module: Flood Alert Run Report
// Description: Run phases and the per-run outcome summary.
// Purpose: Surface sent, skipped, and failed notifications to operators.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RunReport`] is created fresh for every run and discarded after it is
//! surfaced. It always exists, even when the run aborts, so operators see
//! what happened before the abort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::channel::Channel;
use crate::core::identifiers::RecipientId;

// ============================================================================
// SECTION: Run Phase
// ============================================================================

/// Orchestrator state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Loading recipients, forecasts, and the state store.
    Loading,
    /// Sending notifications.
    Dispatching,
    /// Aggregating the report.
    Reporting,
    /// Terminal success state.
    Done,
    /// Terminal failure state.
    Aborted,
}

impl RunPhase {
    /// Returns the uppercase phase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "LOADING",
            Self::Dispatching => "DISPATCHING",
            Self::Reporting => "REPORTING",
            Self::Done => "DONE",
            Self::Aborted => "ABORTED",
        }
    }

    /// Returns true when the state machine permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Loading, Self::Dispatching)
                | (Self::Loading | Self::Dispatching, Self::Aborted)
                | (Self::Dispatching, Self::Reporting)
                | (Self::Reporting, Self::Done)
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// A notification that could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFailure {
    /// Canonical forecast key text.
    pub forecast_key: String,
    /// Recipient identity.
    pub recipient: RecipientId,
    /// Delivery channel.
    pub channel: Channel,
    /// Failure detail.
    pub error: String,
}

/// A forecast file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// File name within the forecast directory.
    pub file: String,
    /// Parse error detail.
    pub error: String,
}

/// A channel skipped for the run because no credential could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedChannel {
    /// Skipped channel.
    pub channel: Channel,
    /// Authentication error detail.
    pub reason: String,
}

/// Category of a fatal run error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortKind {
    /// Recipient registry failed to load or validate.
    Registry,
    /// Dispatch state store failed.
    StateStore,
    /// A channel credential could not be resolved.
    Authentication,
    /// A channel sender could not be built from its settings.
    Sender,
    /// A dispatch worker terminated unexpectedly or a phase move was refused.
    Internal,
}

impl AbortKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::StateStore => "state_store",
            Self::Authentication => "authentication",
            Self::Sender => "sender",
            Self::Internal => "internal",
        }
    }
}

/// Reason a run reached `ABORTED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAbort {
    /// Failure category.
    pub kind: AbortKind,
    /// Failure detail.
    pub message: String,
}

// ============================================================================
// SECTION: Run Report
// ============================================================================

/// Summary of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Phases entered, in order.
    pub phases: Vec<RunPhase>,
    /// Forecast records loaded from parseable files.
    pub forecasts: usize,
    /// Recipients loaded.
    pub recipients: usize,
    /// Notifications delivered this run.
    pub sent: usize,
    /// Notifications skipped because they were already sent.
    pub skipped: usize,
    /// Notifications that failed this run.
    pub failed: usize,
    /// Per-notification failures.
    pub failures: Vec<NotificationFailure>,
    /// Per-file parse failures.
    pub file_failures: Vec<FileFailure>,
    /// Channels skipped for authentication failures.
    pub skipped_channels: Vec<SkippedChannel>,
    /// Abort reason when the run reached `ABORTED`.
    pub abort: Option<RunAbort>,
}

impl RunReport {
    /// Builds the report of a run that aborted while its inputs were being
    /// opened, before the orchestrator could start.
    #[must_use]
    pub fn aborted_while_loading(kind: AbortKind, message: impl Into<String>) -> Self {
        Self {
            phases: vec![RunPhase::Loading, RunPhase::Aborted],
            abort: Some(RunAbort {
                kind,
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    /// Returns the final phase, if any phase was entered.
    #[must_use]
    pub fn final_phase(&self) -> Option<RunPhase> {
        self.phases.last().copied()
    }

    /// Appends `phase` when the state machine permits the move.
    ///
    /// The first phase must be `Loading`. A refused move leaves the history
    /// unchanged and returns false.
    pub fn advance(&mut self, phase: RunPhase) -> bool {
        let allowed = self
            .final_phase()
            .map_or(phase == RunPhase::Loading, |current| current.can_transition_to(phase));
        if allowed {
            self.phases.push(phase);
        }
        allowed
    }

    /// Returns true when the run reached `DONE`.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.final_phase() == Some(RunPhase::Done)
    }

    /// Returns true when the run reached `DONE` with at most `max_failed` failures.
    #[must_use]
    pub fn is_success(&self, max_failed: usize) -> bool {
        self.is_done() && self.failed <= max_failed
    }

    /// Records a per-notification failure and bumps the failed count.
    pub fn push_failure(&mut self, failure: NotificationFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }

    /// Folds a partial report produced by a worker into this report.
    pub fn absorb(&mut self, other: Self) {
        self.sent += other.sent;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.failures.extend(other.failures);
        self.file_failures.extend(other.file_failures);
        self.skipped_channels.extend(other.skipped_channels);
        if self.abort.is_none() {
            self.abort = other.abort;
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::AbortKind;
    use super::RunPhase;
    use super::RunReport;

    #[test]
    fn phase_transitions_follow_the_state_machine() {
        assert!(RunPhase::Loading.can_transition_to(RunPhase::Dispatching));
        assert!(RunPhase::Loading.can_transition_to(RunPhase::Aborted));
        assert!(RunPhase::Dispatching.can_transition_to(RunPhase::Reporting));
        assert!(RunPhase::Reporting.can_transition_to(RunPhase::Done));
        assert!(!RunPhase::Loading.can_transition_to(RunPhase::Done));
        assert!(!RunPhase::Done.can_transition_to(RunPhase::Loading));
        assert!(!RunPhase::Reporting.can_transition_to(RunPhase::Aborted));
    }

    #[test]
    fn advance_refuses_moves_outside_the_state_machine() {
        let mut report = RunReport::default();
        assert!(!report.advance(RunPhase::Dispatching));
        assert!(report.phases.is_empty());
        assert!(report.advance(RunPhase::Loading));
        assert!(!report.advance(RunPhase::Reporting));
        assert!(report.advance(RunPhase::Dispatching));
        assert!(report.advance(RunPhase::Reporting));
        assert!(!report.advance(RunPhase::Aborted));
        assert!(report.advance(RunPhase::Done));
        assert!(!report.advance(RunPhase::Loading));
        assert_eq!(
            report.phases,
            vec![RunPhase::Loading, RunPhase::Dispatching, RunPhase::Reporting, RunPhase::Done]
        );
    }

    #[test]
    fn success_requires_done_and_failures_within_threshold() {
        let mut report = RunReport {
            phases: vec![
                RunPhase::Loading,
                RunPhase::Dispatching,
                RunPhase::Reporting,
                RunPhase::Done,
            ],
            failed: 1,
            ..RunReport::default()
        };
        assert!(!report.is_success(0));
        assert!(report.is_success(1));
        report.phases.push(RunPhase::Aborted);
        assert!(!report.is_success(5));
    }

    #[test]
    fn loading_abort_is_terminal_and_unsuccessful() {
        let report = RunReport::aborted_while_loading(AbortKind::StateStore, "locked");
        assert_eq!(report.final_phase(), Some(RunPhase::Aborted));
        assert!(!report.is_success(usize::MAX));
        assert_eq!(report.abort.map(|abort| abort.message), Some("locked".to_string()));
    }
}
