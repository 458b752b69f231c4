// ABOUTME: Strava REST client implementing activity, telemetry, and upload collaborators
// ABOUTME: Each call takes the caller's bearer token; the client itself is stateless
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, instrument};

use super::dto::{StravaActivityResponse, StravaUploadResponse};
use super::{read_json, transport_error, StravaConfig};
use crate::constants::channels::REQUESTED_KEYS;
use crate::constants::strava::UPLOAD_DATA_TYPE_GPX;
use crate::core::{
    AccessCredential, ActivitySource, ActivityUploader, TelemetrySource, UploadMetadata,
    UploadStatus,
};
use crate::errors::provider::ProviderResult;
use crate::http_client::shared_client;
use crate::models::{Activity, SampleStream};

const GPX_MIME_TYPE: &str = "application/gpx+xml";

/// Strava v3 REST API client
#[derive(Debug, Clone)]
pub struct StravaClient {
    config: StravaConfig,
    client: Client,
}

impl StravaClient {
    /// Client on the process-wide connection pool
    #[must_use]
    pub fn new(config: StravaConfig) -> Self {
        Self::with_client(config, shared_client().clone())
    }

    /// Client on a caller-supplied `reqwest` client
    #[must_use]
    pub const fn with_client(config: StravaConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Endpoint configuration
    #[must_use]
    pub const fn config(&self) -> &StravaConfig {
        &self.config
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[async_trait]
impl ActivitySource for StravaClient {
    #[instrument(skip(self, credential), fields(activity.id = activity_id))]
    async fn fetch_activity(
        &self,
        activity_id: u64,
        credential: &AccessCredential,
    ) -> ProviderResult<Activity> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("activities/{activity_id}")))
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let activity: StravaActivityResponse =
            read_json(response, "activity", &activity_id.to_string()).await?;
        Ok(Activity::from(activity))
    }
}

#[async_trait]
impl TelemetrySource for StravaClient {
    #[instrument(skip(self, credential), fields(activity.id = activity_id))]
    async fn fetch_streams(
        &self,
        activity_id: u64,
        credential: &AccessCredential,
    ) -> ProviderResult<SampleStream> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("activities/{activity_id}/streams")))
            .query(&[("keys", REQUESTED_KEYS), ("key_by_type", "true")])
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let stream: SampleStream = read_json(response, "streams", &activity_id.to_string()).await?;
        debug!(
            channels = ?stream.channel_names().collect::<Vec<_>>(),
            "fetched activity streams"
        );
        Ok(stream)
    }
}

#[async_trait]
impl ActivityUploader for StravaClient {
    #[instrument(skip(self, credential, file), fields(upload.bytes = file.len()))]
    async fn submit(
        &self,
        credential: &AccessCredential,
        file: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> ProviderResult<u64> {
        let part = Part::bytes(file)
            .file_name(metadata.external_id.clone())
            .mime_str(GPX_MIME_TYPE)
            .map_err(|e| transport_error(&e))?;

        let mut form = Form::new()
            .part("file", part)
            .text("data_type", UPLOAD_DATA_TYPE_GPX)
            .text("name", metadata.name.clone())
            .text("trainer", flag(metadata.trainer))
            .text("commute", flag(metadata.commute))
            .text("activity_type", metadata.activity_type.clone())
            .text("external_id", metadata.external_id.clone());
        if let Some(description) = &metadata.description {
            form = form.text("description", description.clone());
        }

        let response = self
            .client
            .post(self.config.endpoint("uploads"))
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let upload: StravaUploadResponse =
            read_json(response, "upload", &metadata.external_id).await?;
        debug!(upload.id = upload.id, "upload accepted");
        Ok(upload.id)
    }

    #[instrument(skip(self, credential), fields(upload.id = upload_id))]
    async fn poll_status(
        &self,
        credential: &AccessCredential,
        upload_id: u64,
    ) -> ProviderResult<UploadStatus> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("uploads/{upload_id}")))
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let upload: StravaUploadResponse =
            read_json(response, "upload", &upload_id.to_string()).await?;
        Ok(upload.upload_status())
    }
}
