// ABOUTME: Webhook subscription endpoints: hub challenge validation and event delivery
// ABOUTME: Events are acknowledged immediately and handed to the orchestrator on a tracked task
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! Strava push subscription callback
//!
//! Strava expects the POST to be acknowledged within two seconds, so the
//! replacement runs after the response is sent. The outcome is only logged.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::AppState;
use crate::constants::routes::SUBSCRIBE;
use crate::constants::webhook::HUB_MODE_SUBSCRIBE;
use crate::errors::AppError;
use crate::models::WebhookEvent;
use crate::replacement::malformed_event_outcome;

/// Subscription validation query
#[derive(Debug, Deserialize)]
pub struct HubChallengeQuery {
    /// Always `subscribe`
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// Value to echo back
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
    /// Token supplied when the subscription was created
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
}

/// Webhook routes implementation
pub struct WebhookRoutes;

impl WebhookRoutes {
    /// Create the subscription callback routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route(
                SUBSCRIBE,
                get(Self::handle_validation).post(Self::handle_event),
            )
            .with_state(state)
    }

    /// Handle GET /subscribe - echo the hub challenge
    async fn handle_validation(
        State(state): State<Arc<AppState>>,
        Query(query): Query<HubChallengeQuery>,
    ) -> Result<Response, AppError> {
        let token_matches = query.verify_token.as_deref() == Some(state.verify_token.as_str());
        if query.mode.as_deref() != Some(HUB_MODE_SUBSCRIBE) || !token_matches {
            warn!(mode = ?query.mode, "rejected subscription validation request");
            return Err(AppError::permission_denied(
                "subscription validation failed: mode or verify token mismatch",
            ));
        }
        let challenge = query
            .challenge
            .ok_or_else(|| AppError::invalid_input("hub.challenge is required"))?;

        info!("subscription validation succeeded");
        Ok((StatusCode::OK, Json(json!({ "hub.challenge": challenge }))).into_response())
    }

    /// Handle POST /subscribe - acknowledge and process an event
    async fn handle_event(
        State(state): State<Arc<AppState>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let event = match WebhookEvent::parse(&body) {
            Ok(event) => event,
            Err(e) => {
                let _outcome = malformed_event_outcome(&body, &e);
                return Err(AppError::invalid_input(format!(
                    "malformed webhook payload: {e}"
                )));
            }
        };

        let delivery_id = Uuid::new_v4();
        let span = info_span!(
            "webhook_delivery",
            delivery.id = %delivery_id,
            activity.id = event.object_id,
            owner.id = event.owner_id,
            aspect = ?event.aspect_type,
        );
        let orchestrator = Arc::clone(&state.orchestrator);
        state.tasks.spawn(
            async move {
                orchestrator.handle_event(&event).await;
            }
            .instrument(span),
        );

        Ok((
            StatusCode::OK,
            Json(json!({ "status": "accepted", "delivery_id": delivery_id })),
        )
            .into_response())
    }
}
