// ABOUTME: Terminal result of one webhook delivery and the pipeline stages it passes through
// ABOUTME: Outcomes are immutable once built and carry enough context for operator diagnosis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::FailureReason;

/// Replacement state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplacementStage {
    /// Event received and parsed
    Received,
    /// Owner grant and credentials resolved
    ScopeChecked,
    /// Activity metadata and streams fetched
    StreamsFetched,
    /// Cadence channel synthesized
    CadenceDerived,
    /// Track file produced
    Encoded,
    /// Original activity deleted
    Deleted,
    /// Replacement file submitted
    Uploaded,
    /// Waiting for upload processing
    Polling,
    /// Terminal
    Done,
}

impl fmt::Display for ReplacementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementStatus {
    /// Original deleted, replacement with cadence is live
    Replaced,
    /// Nothing to do for this event
    NotRequired,
    /// Delivery failed; see the reason
    Failed,
}

/// Why a delivery was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Not an activity create/update
    UnsupportedEvent,
    /// Activity id already handled by this process
    AlreadyProcessed,
    /// Another delivery for the same id is running
    InProgress,
    /// Activity type is not a ride
    NotCycling,
    /// Activity already carries cadence
    CadencePresent,
    /// Description has no gear ratio
    GearRatioUnset,
}

/// Reason attached to a non-success outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code")]
pub enum OutcomeReason {
    /// Replacement succeeded
    None,
    /// Delivery skipped
    Skipped(SkipReason),
    /// Delivery failed
    Failed(FailureReason),
}

/// Result of handling one webhook delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementOutcome {
    original_activity_id: u64,
    owner_id: Option<u64>,
    new_activity_id: Option<u64>,
    status: ReplacementStatus,
    reason: OutcomeReason,
    stage: ReplacementStage,
    message: String,
    original_deleted: bool,
}

impl ReplacementOutcome {
    /// Successful replacement
    #[must_use]
    pub fn replaced(original_activity_id: u64, owner_id: u64, new_activity_id: u64) -> Self {
        Self {
            original_activity_id,
            owner_id: Some(owner_id),
            new_activity_id: Some(new_activity_id),
            status: ReplacementStatus::Replaced,
            reason: OutcomeReason::None,
            stage: ReplacementStage::Done,
            message: format!("activity {original_activity_id} replaced by {new_activity_id}"),
            original_deleted: true,
        }
    }

    /// Skipped delivery
    #[must_use]
    pub fn not_required(
        original_activity_id: u64,
        owner_id: Option<u64>,
        reason: SkipReason,
        stage: ReplacementStage,
    ) -> Self {
        Self {
            original_activity_id,
            owner_id,
            new_activity_id: None,
            status: ReplacementStatus::NotRequired,
            reason: OutcomeReason::Skipped(reason),
            stage,
            message: format!("{reason:?}"),
            original_deleted: false,
        }
    }

    /// Failed delivery
    ///
    /// `stage` is the state the machine was trying to reach when it failed.
    #[must_use]
    pub fn failed(
        original_activity_id: u64,
        owner_id: Option<u64>,
        reason: FailureReason,
        stage: ReplacementStage,
        message: impl Into<String>,
        original_deleted: bool,
    ) -> Self {
        Self {
            original_activity_id,
            owner_id,
            new_activity_id: None,
            status: ReplacementStatus::Failed,
            reason: OutcomeReason::Failed(reason),
            stage,
            message: message.into(),
            original_deleted,
        }
    }

    /// Activity the event referred to
    #[must_use]
    pub const fn original_activity_id(&self) -> u64 {
        self.original_activity_id
    }

    /// Owning athlete, when the event could be parsed
    #[must_use]
    pub const fn owner_id(&self) -> Option<u64> {
        self.owner_id
    }

    /// Replacement activity id on success
    #[must_use]
    pub const fn new_activity_id(&self) -> Option<u64> {
        self.new_activity_id
    }

    /// Terminal status
    #[must_use]
    pub const fn status(&self) -> ReplacementStatus {
        self.status
    }

    /// Skip or failure reason
    #[must_use]
    pub const fn reason(&self) -> OutcomeReason {
        self.reason
    }

    /// Failure reason, if failed
    #[must_use]
    pub const fn failure_reason(&self) -> Option<FailureReason> {
        match self.reason {
            OutcomeReason::Failed(reason) => Some(reason),
            OutcomeReason::None | OutcomeReason::Skipped(_) => None,
        }
    }

    /// Skip reason, if skipped
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self.reason {
            OutcomeReason::Skipped(reason) => Some(reason),
            OutcomeReason::None | OutcomeReason::Failed(_) => None,
        }
    }

    /// Stage at termination
    #[must_use]
    pub const fn stage(&self) -> ReplacementStage {
        self.stage
    }

    /// Human-readable detail
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the original activity no longer exists on the platform
    #[must_use]
    pub const fn original_deleted(&self) -> bool {
        self.original_deleted
    }

    /// Failed after the original was deleted: the activity is lost
    #[must_use]
    pub const fn is_data_loss(&self) -> bool {
        self.original_deleted && matches!(self.status, ReplacementStatus::Failed)
    }
}
