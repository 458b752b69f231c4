// ABOUTME: In-memory credential store resolving athlete ids to scopes, tokens, and account logins
// ABOUTME: Refreshes access tokens close to expiry before handing them to the pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! # Credential store
//!
//! Entries are created by the OAuth redirect (tokens and scopes) and by the
//! configured account (login for deletion). Both halves are optional; the
//! orchestrator decides what is sufficient.
//!
//! Refresh happens outside the map lock: the entry is copied out, refreshed
//! over the network, and written back.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::ProviderResult;
use crate::providers::strava::{StravaOAuthClient, TokenGrant};
use crate::providers::{AccessCredential, AccountCredential, CredentialResolver, OwnerGrant};

/// Tokens expiring sooner than this are refreshed before use
pub const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Obtains a new access token from a refresh token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a new grant
    async fn refresh(&self, refresh_token: &str) -> ProviderResult<TokenGrant>;
}

/// Trades an OAuth authorization code for tokens
#[async_trait]
pub trait CodeExchange: Send + Sync {
    /// Exchange `code` from the redirect for a grant
    async fn exchange_code(&self, code: &str) -> ProviderResult<TokenGrant>;
}

#[async_trait]
impl TokenRefresher for StravaOAuthClient {
    async fn refresh(&self, refresh_token: &str) -> ProviderResult<TokenGrant> {
        Self::refresh(self, refresh_token).await
    }
}

#[async_trait]
impl CodeExchange for StravaOAuthClient {
    async fn exchange_code(&self, code: &str) -> ProviderResult<TokenGrant> {
        Self::exchange_code(self, code).await
    }
}

#[derive(Clone, Default)]
struct StoredTokens {
    access_token: String,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Default)]
struct StoredCredential {
    scopes: BTreeSet<String>,
    tokens: Option<StoredTokens>,
    account: Option<AccountCredential>,
}

impl StoredCredential {
    fn to_grant(&self) -> OwnerGrant {
        OwnerGrant {
            scopes: self.scopes.clone(),
            access: self
                .tokens
                .as_ref()
                .filter(|tokens| tokens.expires_at.is_none_or(|at| at > Utc::now()))
                .map(|tokens| AccessCredential::new(tokens.access_token.clone())),
            account: self.account.clone(),
        }
    }
}

/// Split a comma- or space-separated scope list
#[must_use]
pub fn parse_scopes(scopes: &str) -> BTreeSet<String> {
    scopes
        .split([',', ' '])
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Owner id to credential map
#[derive(Default)]
pub struct CredentialStore {
    entries: DashMap<u64, StoredCredential>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl CredentialStore {
    /// Store that never refreshes tokens
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refreshes tokens through `refresher`
    #[must_use]
    pub fn with_refresher(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            entries: DashMap::new(),
            refresher: Some(refresher),
        }
    }

    /// Record tokens and granted scopes for `owner_id`, keeping any account login
    pub fn store_grant(&self, owner_id: u64, grant: TokenGrant, scopes: BTreeSet<String>) {
        let mut entry = self.entries.entry(owner_id).or_default();
        entry.scopes = scopes;
        entry.tokens = Some(StoredTokens {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: Some(grant.expires_at),
        });
        info!(owner.id = owner_id, "stored athlete authorization");
    }

    /// Record the web login used for deletion
    pub fn set_account(&self, owner_id: u64, account: AccountCredential) {
        self.entries.entry(owner_id).or_default().account = Some(account);
    }

    /// Whether anything is known about `owner_id`
    #[must_use]
    pub fn contains(&self, owner_id: u64) -> bool {
        self.entries.contains_key(&owner_id)
    }

    async fn refresh_if_needed(&self, owner_id: u64, stored: &mut StoredCredential) {
        let Some(tokens) = stored.tokens.as_ref() else {
            return;
        };
        let Some(expires_at) = tokens.expires_at else {
            return;
        };
        if Utc::now() + TimeDelta::minutes(REFRESH_MARGIN_MINUTES) < expires_at {
            return;
        }
        let Some(refresher) = &self.refresher else {
            return;
        };

        match refresher.refresh(&tokens.refresh_token).await {
            Ok(grant) => {
                let refreshed = StoredTokens {
                    access_token: grant.access_token,
                    refresh_token: grant.refresh_token,
                    expires_at: Some(grant.expires_at),
                };
                if let Some(mut entry) = self.entries.get_mut(&owner_id) {
                    entry.tokens = Some(refreshed.clone());
                }
                stored.tokens = Some(refreshed);
                info!(owner.id = owner_id, "refreshed access token");
            }
            Err(e) => {
                warn!(owner.id = owner_id, error = %e, "access token refresh failed");
            }
        }
    }
}

#[async_trait]
impl CredentialResolver for CredentialStore {
    #[instrument(skip(self), fields(owner.id = owner_id))]
    async fn resolve(&self, owner_id: u64) -> Option<OwnerGrant> {
        let mut stored = self.entries.get(&owner_id).map(|entry| entry.value().clone())?;
        self.refresh_if_needed(owner_id, &mut stored).await;
        Some(stored.to_grant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes_accepts_commas_and_spaces() {
        let scopes = parse_scopes("read,activity:read_all, activity:write");
        assert_eq!(scopes.len(), 3);
        assert!(scopes.contains("activity:write"));
        assert!(parse_scopes("").is_empty());
    }
}
