// ABOUTME: Route module organization for the cadecalc HTTP endpoints
// ABOUTME: Shared handler state and the router assembly with request tracing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! HTTP routes
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the orchestrator or the credential store.

/// Health check routes
pub mod health;
/// OAuth redirect routes
pub mod oauth;
/// Webhook subscription routes
pub mod webhook;

pub use health::HealthRoutes;
pub use oauth::OAuthRoutes;
pub use webhook::WebhookRoutes;

use axum::extract::Request;
use axum::Router;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;
use tracing::info_span;
use uuid::Uuid;

use crate::auth::{CodeExchange, CredentialStore};
use crate::replacement::ReplacementOrchestrator;

/// State shared by every handler
pub struct AppState {
    /// Pipeline run for each webhook delivery
    pub orchestrator: Arc<ReplacementOrchestrator>,
    /// Credentials populated by the OAuth redirect
    pub credentials: Arc<CredentialStore>,
    /// Authorization code exchange; `None` disables `/auth`
    pub oauth: Option<Arc<dyn CodeExchange>>,
    /// Token expected during subscription validation
    pub verify_token: String,
    /// Spawned replacement tasks, drained on shutdown
    pub tasks: TaskTracker,
}

/// Assemble every route with request tracing
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes())
        .merge(WebhookRoutes::routes(Arc::clone(&state)))
        .merge(OAuthRoutes::routes(state))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request.id = %Uuid::new_v4(),
                )
            }),
        )
}
