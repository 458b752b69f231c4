// ABOUTME: Strava platform integration: REST API, OAuth token endpoint, push subscriptions
// ABOUTME: Shared endpoint configuration and response handling used by all Strava clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;

use crate::constants::strava::{API_BASE_URL, AUTH_URL, PROVIDER_NAME, TOKEN_URL};
use crate::errors::provider::{ProviderError, ProviderResult};

/// Activity, stream, and upload endpoints
pub mod client;
/// Wire formats returned by the Strava API
mod dto;
/// OAuth authorization and token exchange
pub mod oauth;
/// Push subscription management
pub mod subscriptions;

pub use client::StravaClient;
pub use oauth::{StravaOAuthClient, TokenGrant};
pub use subscriptions::{PushSubscription, StravaSubscriptions};

/// Endpoints and application credentials for Strava
#[derive(Clone)]
pub struct StravaConfig {
    /// OAuth application client id
    pub client_id: String,
    /// OAuth application client secret
    pub client_secret: String,
    /// REST API base URL
    pub api_base_url: String,
    /// Authorization page URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl Default for StravaConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base_url: API_BASE_URL.to_owned(),
            auth_url: AUTH_URL.to_owned(),
            token_url: TOKEN_URL.to_owned(),
        }
    }
}

impl fmt::Debug for StravaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StravaConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl StravaConfig {
    /// Absolute URL for an API path
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn transport_error(error: &reqwest::Error) -> ProviderError {
    ProviderError::from_reqwest(PROVIDER_NAME, error)
}

/// Turn a non-success response into a [`ProviderError`]
async fn ensure_success(
    response: Response,
    resource_type: &str,
    resource_id: &str,
) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        return Err(ProviderError::RateLimited {
            provider: PROVIDER_NAME.to_owned(),
            retry_after_secs,
        });
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(
        PROVIDER_NAME,
        status.as_u16(),
        resource_type,
        resource_id,
        body,
    ))
}

/// Check status and decode a JSON body
async fn read_json<T: DeserializeOwned>(
    response: Response,
    resource_type: &str,
    resource_id: &str,
) -> ProviderResult<T> {
    ensure_success(response, resource_type, resource_id)
        .await?
        .json::<T>()
        .await
        .map_err(|e| transport_error(&e))
}
