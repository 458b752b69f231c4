// ABOUTME: Remote collaborators for the activity replacement pipeline
// ABOUTME: Core traits, shared HTTP client, Strava REST/OAuth/subscription clients, deletion adapters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! Remote platform collaborators.
//!
//! The replacement pipeline depends only on the traits in [`core`]; the
//! Strava implementations and the command-backed deletion adapter live
//! alongside them so the server binary can wire everything together.

pub use cadecalc_core::constants;
pub use cadecalc_core::errors;
pub use cadecalc_core::models;

/// Collaborator traits and credential types
pub mod core;
/// Deletion capability adapters
pub mod deletion;
/// Shared HTTP client for provider API calls
pub mod http_client;
/// Strava REST, OAuth, and push subscription clients
pub mod strava;

pub use core::{
    AccessCredential, AccountCredential, ActivitySource, ActivityUploader, CredentialResolver,
    DeletionCapability, OwnerGrant, TelemetrySource, UploadMetadata, UploadStatus,
};
pub use deletion::{CommandDeletion, DisabledDeletion};
pub use http_client::{initialize_shared_client, shared_client};
pub use cadecalc_core::errors::provider::{ProviderError, ProviderResult};
pub use strava::{StravaClient, StravaConfig, StravaOAuthClient, StravaSubscriptions};
