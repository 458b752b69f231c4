// ABOUTME: Strava push subscription management (create, list, delete, ensure)
// ABOUTME: Subscriptions are per application, so calls use client credentials instead of tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{ensure_success, read_json, transport_error, StravaConfig};
use crate::errors::provider::ProviderResult;
use crate::http_client::shared_client;

const PUSH_SUBSCRIPTIONS_PATH: &str = "push_subscriptions";

/// One registered webhook subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    /// Subscription id
    pub id: u64,
    /// URL the platform delivers events to
    pub callback_url: String,
    /// Creation time as reported by the platform
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedSubscription {
    id: u64,
}

/// Push subscription API client
///
/// Creating a subscription makes the platform call the callback URL with a
/// validation challenge before this call returns, so the webhook route must
/// already be serving.
#[derive(Debug, Clone)]
pub struct StravaSubscriptions {
    config: StravaConfig,
    client: Client,
}

impl StravaSubscriptions {
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

    fn client_credentials(&self) -> [(&'static str, &str); 2] {
        [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ]
    }

    /// Register `callback_url` for event delivery
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the subscription (including a
    /// failed callback validation)
    #[instrument(skip(self, verify_token))]
    pub async fn create(&self, callback_url: &str, verify_token: &str) -> ProviderResult<u64> {
        let [client_id, client_secret] = self.client_credentials();
        let form = [
            client_id,
            client_secret,
            ("callback_url", callback_url),
            ("verify_token", verify_token),
        ];

        let response = self
            .client
            .post(self.config.endpoint(PUSH_SUBSCRIPTIONS_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let created: CreatedSubscription =
            read_json(response, "push_subscription", callback_url).await?;
        info!(subscription.id = created.id, "created push subscription");
        Ok(created.id)
    }

    /// Subscriptions registered for this application
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded
    pub async fn list(&self) -> ProviderResult<Vec<PushSubscription>> {
        let response = self
            .client
            .get(self.config.endpoint(PUSH_SUBSCRIPTIONS_PATH))
            .query(&self.client_credentials())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        read_json(response, "push_subscription", "list").await
    }

    /// Remove a subscription
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the subscription does not exist
    #[instrument(skip(self))]
    pub async fn delete(&self, subscription_id: u64) -> ProviderResult<()> {
        let response = self
            .client
            .delete(
                self.config
                    .endpoint(&format!("{PUSH_SUBSCRIPTIONS_PATH}/{subscription_id}")),
            )
            .query(&self.client_credentials())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        ensure_success(response, "push_subscription", &subscription_id.to_string()).await?;
        info!(subscription.id = subscription_id, "deleted push subscription");
        Ok(())
    }

    /// Reuse a subscription for `callback_url` or replace whatever exists
    ///
    /// The platform allows one subscription per application, so a
    /// subscription pointing elsewhere is deleted first.
    ///
    /// # Errors
    ///
    /// Returns an error if listing, deleting, or creating fails
    pub async fn ensure(&self, callback_url: &str, verify_token: &str) -> ProviderResult<u64> {
        let existing = self.list().await?;
        if let Some(subscription) = existing.iter().find(|s| s.callback_url == callback_url) {
            info!(subscription.id = subscription.id, "reusing push subscription");
            return Ok(subscription.id);
        }

        for stale in existing {
            warn!(
                subscription.id = stale.id,
                callback_url = %stale.callback_url,
                "replacing push subscription with a different callback"
            );
            self.delete(stale.id).await?;
        }

        self.create(callback_url, verify_token).await
    }
}
