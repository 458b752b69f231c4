// ABOUTME: Collaborator traits the replacement pipeline is written against
// ABOUTME: Activity/telemetry fetch, deletion, upload, and credential resolution seams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! # Collaborator seams
//!
//! The orchestrator never talks to the platform directly. Each remote step is
//! a trait so tests can substitute in-memory doubles:
//!
//! - [`ActivitySource`]: activity metadata snapshot
//! - [`TelemetrySource`]: raw sample streams
//! - [`DeletionCapability`]: removes the original activity (non-idempotent)
//! - [`ActivityUploader`]: submits a track file and reports processing status
//! - [`CredentialResolver`]: owner id to grant and credentials
//!
//! Credentials are passed explicitly on every call; implementations hold no
//! per-athlete state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::errors::provider::ProviderResult;
use crate::models::{Activity, SampleStream};

/// Bearer token for platform API calls
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    token: String,
}

impl AccessCredential {
    /// Wrap a bearer token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw token for the `Authorization` header
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Web login for the account, used only by deletion
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredential {
    /// Login email
    pub email: String,
    password: String,
}

impl AccountCredential {
    /// Build from email and password
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Login password
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the pipeline may know about one owner
#[derive(Debug, Clone, Default)]
pub struct OwnerGrant {
    /// Scopes the owner granted
    pub scopes: BTreeSet<String>,
    /// Current access token, if any
    pub access: Option<AccessCredential>,
    /// Account login, if any
    pub account: Option<AccountCredential>,
}

impl OwnerGrant {
    /// Whether every scope in `required` was granted
    #[must_use]
    pub fn covers(&self, required: &[&str]) -> bool {
        required.iter().all(|scope| self.scopes.contains(*scope))
    }
}

/// Fields copied from the original activity onto its replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Title
    pub name: String,
    /// Description, forwarded unchanged
    pub description: Option<String>,
    /// Indoor trainer flag
    pub trainer: bool,
    /// Commute flag
    pub commute: bool,
    /// Platform activity type (`Ride`, `VirtualRide`)
    pub activity_type: String,
    /// Caller-chosen identifier echoed back by the platform
    pub external_id: String,
}

impl UploadMetadata {
    /// Copy the user-visible fields of `activity`
    #[must_use]
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            name: activity.name.clone(),
            description: activity.description.clone(),
            trainer: activity.trainer,
            commute: activity.commute,
            activity_type: activity.activity_type.clone(),
            external_id: format!("cadecalc-{}.gpx", activity.id),
        }
    }
}

/// Processing status of a submitted upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Still processing
    Pending,
    /// Processing finished and produced this activity id
    Ready(u64),
    /// Processing failed
    Error(String),
}

/// Fetches activity metadata
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch the activity snapshot with its gear ratio parsed
    async fn fetch_activity(
        &self,
        activity_id: u64,
        credential: &AccessCredential,
    ) -> ProviderResult<Activity>;
}

/// Fetches raw sample streams
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch time, latlng, distance, altitude, heartrate and cadence channels
    async fn fetch_streams(
        &self,
        activity_id: u64,
        credential: &AccessCredential,
    ) -> ProviderResult<SampleStream>;
}

/// Removes an activity from the platform
///
/// Not idempotent and not observable until it returns. `true` means the
/// deletion was confirmed; anything else must be treated as "original
/// still present".
#[async_trait]
pub trait DeletionCapability: Send + Sync {
    /// Delete `activity_id` as `account`
    async fn delete(&self, account: &AccountCredential, activity_id: u64) -> bool;
}

/// Submits track files and reports processing status
#[async_trait]
pub trait ActivityUploader: Send + Sync {
    /// Submit a GPX file, returning the upload session id
    async fn submit(
        &self,
        credential: &AccessCredential,
        file: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> ProviderResult<u64>;

    /// Query processing status of an upload session
    async fn poll_status(
        &self,
        credential: &AccessCredential,
        upload_id: u64,
    ) -> ProviderResult<UploadStatus>;
}

/// Maps an owner id to its grant
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// `None` when the owner never authorized this application
    async fn resolve(&self, owner_id: u64) -> Option<OwnerGrant>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_redact_secrets() {
        let access = AccessCredential::new("secret-token");
        let account = AccountCredential::new("rider@example.com", "hunter2");
        let rendered = format!("{access:?} {account:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("rider@example.com"));
    }

    #[test]
    fn test_grant_scope_coverage() {
        let grant = OwnerGrant {
            scopes: ["read", "activity:read_all"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            ..OwnerGrant::default()
        };
        assert!(grant.covers(&["activity:read_all"]));
        assert!(!grant.covers(&["activity:read_all", "activity:write"]));
    }
}
