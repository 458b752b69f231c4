// ABOUTME: OAuth redirect endpoint completing athlete authorization
// ABOUTME: Checks granted scopes, exchanges the code, and stores tokens in the credential store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::AppState;
use crate::auth::parse_scopes;
use crate::constants::routes::AUTH;
use crate::constants::strava::PROVIDER_NAME;
use crate::errors::AppError;
use crate::replacement::REQUIRED_SCOPES;

/// Redirect query parameters
#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    /// Authorization code
    pub code: Option<String>,
    /// Scopes the athlete accepted
    pub scope: Option<String>,
    /// Set when the athlete declined
    pub error: Option<String>,
}

/// OAuth routes implementation
pub struct OAuthRoutes;

impl OAuthRoutes {
    /// Create the redirect route
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route(AUTH, get(Self::handle_callback))
            .with_state(state)
    }

    /// Handle GET /auth - complete the authorization code flow
    async fn handle_callback(
        State(state): State<Arc<AppState>>,
        Query(query): Query<AuthCallbackQuery>,
    ) -> Result<Response, AppError> {
        if let Some(error) = query.error {
            warn!(error = %error, "athlete declined authorization");
            return Err(AppError::permission_denied(format!(
                "authorization was not granted: {error}"
            )));
        }
        let code = query
            .code
            .ok_or_else(|| AppError::invalid_input("code is required"))?;

        let scopes = parse_scopes(query.scope.as_deref().unwrap_or_default());
        let missing: Vec<&str> = REQUIRED_SCOPES
            .iter()
            .copied()
            .filter(|scope| !scopes.contains(*scope))
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "authorization lacks required scopes");
            return Err(AppError::permission_denied(format!(
                "missing required scopes: {}",
                missing.join(",")
            )));
        }

        let exchange = state
            .oauth
            .as_ref()
            .ok_or_else(|| AppError::config("OAuth code exchange is not configured"))?;
        let grant = exchange.exchange_code(&code).await?;
        let athlete_id = grant.athlete_id.ok_or_else(|| {
            AppError::external_service(PROVIDER_NAME, "token response did not identify the athlete")
        })?;

        state.credentials.store_grant(athlete_id, grant, scopes);
        info!(owner.id = athlete_id, "athlete authorized");

        Ok((
            StatusCode::OK,
            Json(json!({ "status": "authorized", "athlete_id": athlete_id })),
        )
            .into_response())
    }
}
