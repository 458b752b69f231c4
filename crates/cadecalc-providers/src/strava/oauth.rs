// ABOUTME: Strava OAuth client for the authorization redirect, code exchange, and token refresh
// ABOUTME: Tokens are returned to the caller; persistence is the credential store's job
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use chrono::{DateTime, Utc};
use reqwest::Client;
use std::fmt;
use tracing::{info, instrument};
use url::Url;

use super::dto::StravaTokenResponse;
use super::{read_json, transport_error, StravaConfig};
use crate::constants::strava::{
    PROVIDER_NAME, SCOPE_ACTIVITY_READ_ALL, SCOPE_ACTIVITY_WRITE, SCOPE_READ,
};
use crate::errors::provider::{ProviderError, ProviderResult};
use crate::http_client::shared_client;

/// Tokens issued by the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token
    pub access_token: String,
    /// Token used to obtain the next access token
    pub refresh_token: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    /// Athlete the tokens belong to (code exchange only)
    pub athlete_id: Option<u64>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("expires_at", &self.expires_at)
            .field("athlete_id", &self.athlete_id)
            .finish_non_exhaustive()
    }
}

impl TryFrom<StravaTokenResponse> for TokenGrant {
    type Error = ProviderError;

    fn try_from(response: StravaTokenResponse) -> Result<Self, Self::Error> {
        let expires_at = DateTime::from_timestamp(response.expires_at, 0).ok_or_else(|| {
            ProviderError::InvalidResponse {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("token expiry {} out of range", response.expires_at),
            }
        })?;
        Ok(Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            athlete_id: response.athlete.map(|athlete| athlete.id),
        })
    }
}

/// Strava OAuth 2.0 client
#[derive(Debug, Clone)]
pub struct StravaOAuthClient {
    config: StravaConfig,
    client: Client,
}

impl StravaOAuthClient {
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

    /// Page the athlete visits to grant access
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is malformed
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        let scope = [SCOPE_READ, SCOPE_ACTIVITY_READ_ALL, SCOPE_ACTIVITY_WRITE].join(",");
        let mut url = Url::parse(&self.config.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("approval_prompt", "auto")
            .append_pair("scope", &scope);
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint is unreachable or rejects the code
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> ProviderResult<TokenGrant> {
        let grant = self
            .token_request(&[("code", code), ("grant_type", "authorization_code")])
            .await?;
        info!(athlete.id = ?grant.athlete_id, "exchanged Strava authorization code");
        Ok(grant)
    }

    /// Obtain a fresh access token
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint is unreachable or rejects the refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<TokenGrant> {
        self.token_request(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> ProviderResult<TokenGrant> {
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        form.extend_from_slice(params);

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let token: StravaTokenResponse = read_json(response, "token", "oauth").await?;
        TokenGrant::try_from(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_requests_write_scope() {
        let client = StravaOAuthClient::with_client(
            StravaConfig {
                client_id: "1234".to_owned(),
                ..StravaConfig::default()
            },
            Client::new(),
        );
        let url = client
            .authorization_url("https://cadence.example.com/auth")
            .unwrap();
        assert!(url.starts_with("https://www.strava.com/oauth/authorize?"));
        assert!(url.contains("client_id=1234"));
        assert!(url.contains("activity%3Awrite"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fcadence.example.com%2Fauth"));
    }
}
