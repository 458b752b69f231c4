// ABOUTME: Replacement orchestrator: the delete-then-upload state machine for one webhook delivery
// ABOUTME: Gates on dedup, checks scopes, derives cadence, encodes, deletes, uploads, and polls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! # Replacement orchestrator
//!
//! ```text
//! Received -> ScopeChecked -> StreamsFetched -> CadenceDerived -> Encoded
//!          -> Deleted -> Uploaded -> Polling -> Done
//! ```
//!
//! Everything up to `Encoded` is side-effect free on the platform; a failure
//! there leaves the original activity untouched. Deletion is the point of no
//! return: it runs at most once per delivery, and any failure after it is
//! reported with `original_deleted = true`.
//!
//! Each stage returns an explicit result; [`Halt`] carries skip or failure
//! details and is converted to a [`ReplacementOutcome`] in one place.

use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::cadence::{derive_cadence, CadenceParams};
use crate::constants::channels;
use crate::constants::strava::{SCOPE_ACTIVITY_READ_ALL, SCOPE_ACTIVITY_WRITE};
use crate::dedup::{DedupStore, InFlight};
use crate::errors::{EncodeError, FailureReason};
use crate::gpx;
use crate::models::{
    Activity, ReplacementOutcome, ReplacementStage, ReplacementStatus, SampleStream, SkipReason,
    WebhookEvent,
};
use crate::providers::{
    AccessCredential, AccountCredential, ActivitySource, ActivityUploader, CredentialResolver,
    DeletionCapability, TelemetrySource, UploadMetadata,
};
use crate::upload::{PollConfig, UploadPoller};

/// Scopes an owner must have granted for replacement
pub const REQUIRED_SCOPES: &[&str] = &[SCOPE_ACTIVITY_READ_ALL, SCOPE_ACTIVITY_WRITE];

/// Remote collaborators and shared state the orchestrator needs
#[derive(Clone)]
pub struct Collaborators {
    /// Activity metadata
    pub activities: Arc<dyn ActivitySource>,
    /// Sample streams
    pub telemetry: Arc<dyn TelemetrySource>,
    /// Replacement upload
    pub uploader: Arc<dyn ActivityUploader>,
    /// Original deletion
    pub deletion: Arc<dyn DeletionCapability>,
    /// Owner credentials
    pub credentials: Arc<dyn CredentialResolver>,
    /// Processed activity ids
    pub dedup: Arc<dyn DedupStore>,
}

/// Why a delivery stopped before `Done(success)`
enum Halt {
    Skipped {
        reason: SkipReason,
        stage: ReplacementStage,
    },
    Failed {
        reason: FailureReason,
        stage: ReplacementStage,
        message: String,
        original_deleted: bool,
    },
}

impl Halt {
    const fn skip(reason: SkipReason, stage: ReplacementStage) -> Self {
        Self::Skipped { reason, stage }
    }

    fn fail(reason: FailureReason, stage: ReplacementStage, message: impl Into<String>) -> Self {
        Self::Failed {
            reason,
            stage,
            message: message.into(),
            original_deleted: false,
        }
    }

    fn fail_after_delete(
        reason: FailureReason,
        stage: ReplacementStage,
        message: impl Into<String>,
    ) -> Self {
        Self::Failed {
            reason,
            stage,
            message: message.into(),
            original_deleted: true,
        }
    }

    fn encoding(error: &EncodeError, stage: ReplacementStage) -> Self {
        Self::fail(FailureReason::from(error), stage, error.to_string())
    }

    fn into_outcome(self, activity_id: u64, owner_id: u64) -> ReplacementOutcome {
        match self {
            Self::Skipped { reason, stage } => {
                ReplacementOutcome::not_required(activity_id, Some(owner_id), reason, stage)
            }
            Self::Failed {
                reason,
                stage,
                message,
                original_deleted,
            } => ReplacementOutcome::failed(
                activity_id,
                Some(owner_id),
                reason,
                stage,
                message,
                original_deleted,
            ),
        }
    }
}

/// Credentials resolved at `ScopeChecked`
struct Authorized {
    access: AccessCredential,
    account: AccountCredential,
}

/// Sequences one replacement per delivery
pub struct ReplacementOrchestrator {
    collaborators: Collaborators,
    poller: UploadPoller,
    cadence: CadenceParams,
    in_flight: InFlight,
    shutdown: CancellationToken,
}

impl ReplacementOrchestrator {
    /// Orchestrator over `collaborators`
    #[must_use]
    pub fn new(collaborators: Collaborators, poll: PollConfig, cadence: CadenceParams) -> Self {
        let poller = UploadPoller::new(Arc::clone(&collaborators.uploader), poll);
        Self {
            collaborators,
            poller,
            cadence,
            in_flight: InFlight::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Use `token` to abandon upload polling on shutdown
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Parse and handle a raw webhook body
    pub async fn handle_payload(&self, body: &[u8]) -> ReplacementOutcome {
        match WebhookEvent::parse(body) {
            Ok(event) => self.handle_event(&event).await,
            Err(e) => malformed_event_outcome(body, &e),
        }
    }

    /// Handle one parsed webhook event
    #[instrument(skip(self, event), fields(activity.id = event.object_id, owner.id = event.owner_id))]
    pub async fn handle_event(&self, event: &WebhookEvent) -> ReplacementOutcome {
        let outcome = match self.run(event).await {
            Ok(new_activity_id) => {
                ReplacementOutcome::replaced(event.object_id, event.owner_id, new_activity_id)
            }
            Err(halt) => halt.into_outcome(event.object_id, event.owner_id),
        };
        log_outcome(&outcome);
        outcome
    }

    async fn run(&self, event: &WebhookEvent) -> Result<u64, Halt> {
        if !event.is_activity_change() {
            return Err(Halt::skip(
                SkipReason::UnsupportedEvent,
                ReplacementStage::Received,
            ));
        }

        let activity_id = event.object_id;
        let dedup = &self.collaborators.dedup;
        if dedup.seen(activity_id) {
            return Err(Halt::skip(
                SkipReason::AlreadyProcessed,
                ReplacementStage::Received,
            ));
        }
        let Some(_guard) = self.in_flight.try_acquire(activity_id) else {
            return Err(Halt::skip(SkipReason::InProgress, ReplacementStage::Received));
        };
        // A concurrent delivery may have finished between the check and the claim
        if dedup.seen(activity_id) {
            return Err(Halt::skip(
                SkipReason::AlreadyProcessed,
                ReplacementStage::Received,
            ));
        }

        let authorized = self.check_scopes(event.owner_id).await?;
        let activity = self.fetch_activity(activity_id, &authorized.access).await?;
        let stream = self.fetch_streams(activity_id, &authorized.access).await?;
        let stream = self.derive(&activity, stream)?;
        let file = gpx::encode(&stream, &activity, &activity.start_date)
            .map_err(|e| Halt::encoding(&e, ReplacementStage::Encoded))?;
        debug!(bytes = file.len(), "encoded replacement track");

        self.delete_original(&authorized.account, activity_id).await?;

        let metadata = UploadMetadata::from_activity(&activity);
        let new_activity_id = self
            .poller
            .submit_and_wait(&authorized.access, file, &metadata, &self.shutdown)
            .await
            .map_err(|e| {
                let stage = if e.upload_id().is_some() {
                    ReplacementStage::Polling
                } else {
                    ReplacementStage::Uploaded
                };
                Halt::fail_after_delete(e.failure_reason(), stage, e.to_string())
            })?;

        dedup.mark_seen(new_activity_id);
        dedup.mark_seen(activity_id);
        Ok(new_activity_id)
    }

    async fn check_scopes(&self, owner_id: u64) -> Result<Authorized, Halt> {
        let unavailable = |message: &str| {
            Halt::fail(
                FailureReason::ScopeOrCredentialUnavailable,
                ReplacementStage::ScopeChecked,
                message,
            )
        };

        let grant = self
            .collaborators
            .credentials
            .resolve(owner_id)
            .await
            .ok_or_else(|| unavailable("owner has not authorized this application"))?;
        if !grant.covers(REQUIRED_SCOPES) {
            return Err(unavailable("owner grant lacks activity:read_all or activity:write"));
        }
        let access = grant
            .access
            .ok_or_else(|| unavailable("no valid access token for owner"))?;
        let account = grant
            .account
            .ok_or_else(|| unavailable("no account login configured for owner"))?;
        Ok(Authorized { access, account })
    }

    async fn fetch_activity(
        &self,
        activity_id: u64,
        access: &AccessCredential,
    ) -> Result<Activity, Halt> {
        let activity = self
            .collaborators
            .activities
            .fetch_activity(activity_id, access)
            .await
            .map_err(|e| {
                Halt::fail(
                    FailureReason::RemoteFetchFailed,
                    ReplacementStage::StreamsFetched,
                    e.to_string(),
                )
            })?;

        if !activity.is_cycling() {
            return Err(Halt::skip(
                SkipReason::NotCycling,
                ReplacementStage::ScopeChecked,
            ));
        }
        if activity.has_cadence() {
            return Err(Halt::skip(
                SkipReason::CadencePresent,
                ReplacementStage::ScopeChecked,
            ));
        }
        if activity.gear_ratio.is_none() {
            return Err(Halt::skip(
                SkipReason::GearRatioUnset,
                ReplacementStage::ScopeChecked,
            ));
        }
        Ok(activity)
    }

    async fn fetch_streams(
        &self,
        activity_id: u64,
        access: &AccessCredential,
    ) -> Result<SampleStream, Halt> {
        let stream = self
            .collaborators
            .telemetry
            .fetch_streams(activity_id, access)
            .await
            .map_err(|e| {
                Halt::fail(
                    FailureReason::RemoteFetchFailed,
                    ReplacementStage::StreamsFetched,
                    e.to_string(),
                )
            })?;

        if stream.has_recorded_cadence() {
            return Err(Halt::skip(
                SkipReason::CadencePresent,
                ReplacementStage::StreamsFetched,
            ));
        }
        Ok(stream)
    }

    fn derive(&self, activity: &Activity, stream: SampleStream) -> Result<SampleStream, Halt> {
        let stage = ReplacementStage::CadenceDerived;
        let Some(ratio) = activity.gear_ratio else {
            return Err(Halt::skip(SkipReason::GearRatioUnset, stage));
        };
        let missing_distance = || EncodeError::MissingRequiredChannel {
            channel: channels::DISTANCE.to_owned(),
        };

        let distance = stream
            .get(channels::DISTANCE)
            .ok_or_else(missing_distance)
            .map_err(|e| Halt::encoding(&e, stage))?;
        let distances = distance.data.as_scalars().ok_or_else(|| {
            Halt::encoding(
                &EncodeError::UnexpectedSampleShape {
                    channel: channels::DISTANCE.to_owned(),
                    expected: "scalar",
                },
                stage,
            )
        })?;

        let cadence = derive_cadence(distances, ratio.chainring, ratio.cog, &self.cadence)
            .map_err(|e| Halt::fail(FailureReason::from(&e), stage, e.to_string()))?;
        debug!(samples = cadence.len(), gear = %ratio, "derived cadence");

        stream
            .with_synthesized_cadence(cadence)
            .ok_or_else(|| Halt::encoding(&missing_distance(), stage))
    }

    async fn delete_original(
        &self,
        account: &AccountCredential,
        activity_id: u64,
    ) -> Result<(), Halt> {
        if self.shutdown.is_cancelled() {
            return Err(Halt::fail(
                FailureReason::DeletionFailed,
                ReplacementStage::Deleted,
                "shutdown requested before deleting the original",
            ));
        }
        if !self
            .collaborators
            .deletion
            .delete(account, activity_id)
            .await
        {
            return Err(Halt::fail(
                FailureReason::DeletionFailed,
                ReplacementStage::Deleted,
                "deletion was not confirmed; original presumed intact",
            ));
        }
        info!(activity.id = activity_id, "original activity deleted");
        Ok(())
    }
}

/// Outcome for a body that fails to parse as a webhook event
///
/// The activity id is recovered from `object_id` when the body is still JSON.
#[must_use]
pub fn malformed_event_outcome(body: &[u8], error: &serde_json::Error) -> ReplacementOutcome {
    let object_id = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("object_id").and_then(Value::as_u64))
        .unwrap_or_default();
    let outcome = ReplacementOutcome::failed(
        object_id,
        None,
        FailureReason::MalformedEvent,
        ReplacementStage::Received,
        format!("malformed webhook payload: {error}"),
        false,
    );
    log_outcome(&outcome);
    outcome
}

/// Log an outcome at a level matching its severity
pub fn log_outcome(outcome: &ReplacementOutcome) {
    let activity_id = outcome.original_activity_id();
    let owner_id = outcome.owner_id();
    let stage = outcome.stage();

    match outcome.status() {
        ReplacementStatus::Replaced => info!(
            activity.id = activity_id,
            owner.id = ?owner_id,
            new_activity.id = ?outcome.new_activity_id(),
            "activity replaced with cadence"
        ),
        ReplacementStatus::NotRequired => debug!(
            activity.id = activity_id,
            owner.id = ?owner_id,
            reason = ?outcome.skip_reason(),
            replacement.stage = %stage,
            "replacement not required"
        ),
        ReplacementStatus::Failed if outcome.is_data_loss() => error!(
            activity.id = activity_id,
            owner.id = ?owner_id,
            reason = ?outcome.failure_reason(),
            replacement.stage = %stage,
            original_deleted = true,
            message = outcome.message(),
            "DATA LOSS: original activity was deleted but no replacement exists; restore from the source file"
        ),
        ReplacementStatus::Failed => match outcome.failure_reason() {
            Some(FailureReason::MalformedEvent) => warn!(
                activity.id = activity_id,
                message = outcome.message(),
                "ignored malformed webhook payload"
            ),
            reason => error!(
                activity.id = activity_id,
                owner.id = ?owner_id,
                reason = ?reason,
                replacement.stage = %stage,
                original_deleted = false,
                message = outcome.message(),
                "replacement failed; original activity untouched"
            ),
        },
    }
}
