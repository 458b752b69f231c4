// ABOUTME: HTTP tests for the webhook, OAuth redirect, and health routes
// ABOUTME: Drives the assembled router with oneshot requests against test doubles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use cadecalc::auth::{CodeExchange, CredentialStore};
use cadecalc::errors::ProviderResult;
use cadecalc::providers::strava::TokenGrant;
use cadecalc::routes::{router, AppState};
use common::{token_grant, Harness, MockDeletion, ACTIVITY_ID, OWNER_ID};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "verify-me";

struct FixedExchange;

#[async_trait]
impl CodeExchange for FixedExchange {
    async fn exchange_code(&self, _code: &str) -> ProviderResult<TokenGrant> {
        Ok(token_grant())
    }
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    deletion: Arc<MockDeletion>,
}

fn app() -> TestApp {
    let harness = Harness::happy();
    let deletion = Arc::clone(&harness.deletion);
    let exchange: Arc<dyn CodeExchange> = Arc::new(FixedExchange);
    let state = Arc::new(AppState {
        orchestrator: Arc::new(harness.orchestrator),
        credentials: Arc::new(CredentialStore::new()),
        oauth: Some(exchange),
        verify_token: VERIFY_TOKEN.to_owned(),
        tasks: TaskTracker::new(),
    });
    TestApp {
        router: router(Arc::clone(&state)),
        state,
        deletion,
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Body) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = send(&app.router, Method::GET, "/health", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_subscription_challenge_is_echoed() {
    let app = app();
    let uri =
        format!("/subscribe?hub.mode=subscribe&hub.challenge=15f7d1a9&hub.verify_token={VERIFY_TOKEN}");

    let response = send(&app.router, Method::GET, &uri, Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["hub.challenge"], "15f7d1a9");
}

#[tokio::test]
async fn test_subscription_challenge_with_wrong_token_is_forbidden() {
    let app = app();
    let uri = "/subscribe?hub.mode=subscribe&hub.challenge=15f7d1a9&hub.verify_token=guess";

    let response = send(&app.router, Method::GET, uri, Body::empty()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_event_is_acknowledged_then_processed() {
    let app = app();
    let body = format!(
        r#"{{"object_type":"activity","object_id":{ACTIVITY_ID},"aspect_type":"create","owner_id":{OWNER_ID},"subscription_id":1,"event_time":1714546800}}"#
    );

    let response = send(&app.router, Method::POST, "/subscribe", Body::from(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "accepted");

    app.state.tasks.close();
    app.state.tasks.wait().await;
    assert_eq!(app.deletion.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_event_is_bad_request() {
    let app = app();

    let response = send(
        &app.router,
        Method::POST,
        "/subscribe",
        Body::from(r#"{"object_type":"activity"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.state.tasks.is_empty());
    assert_eq!(app.deletion.call_count(), 0);
}

#[tokio::test]
async fn test_authorization_redirect_stores_grant() {
    let app = app();
    let uri = "/auth?code=abc&scope=read,activity:read_all,activity:write";

    let response = send(&app.router, Method::GET, uri, Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["athlete_id"], OWNER_ID);
    assert!(app.state.credentials.contains(OWNER_ID));
}

#[tokio::test]
async fn test_authorization_without_write_scope_is_refused() {
    let app = app();
    let uri = "/auth?code=abc&scope=read,activity:read_all";

    let response = send(&app.router, Method::GET, uri, Body::empty()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!app.state.credentials.contains(OWNER_ID));
}

#[tokio::test]
async fn test_declined_authorization_is_refused() {
    let app = app();

    let response = send(
        &app.router,
        Method::GET,
        "/auth?error=access_denied",
        Body::empty(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
