// ABOUTME: HTTP-level tests for the Strava REST, OAuth, and subscription clients
// ABOUTME: Runs each client against a local mock server and checks requests and error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use cadecalc_providers::models::StreamData;
use cadecalc_providers::{
    AccessCredential, ActivitySource, ActivityUploader, ProviderError, StravaClient, StravaConfig,
    StravaOAuthClient, StravaSubscriptions, TelemetrySource, UploadMetadata, UploadStatus,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> StravaConfig {
    StravaConfig {
        client_id: "1234".to_owned(),
        client_secret: "secret".to_owned(),
        api_base_url: server.uri(),
        token_url: format!("{}/oauth/token", server.uri()),
        ..StravaConfig::default()
    }
}

fn credential() -> AccessCredential {
    AccessCredential::new("token-abc")
}

fn metadata() -> UploadMetadata {
    UploadMetadata {
        name: "Morning fixie".to_owned(),
        description: Some("48x16".to_owned()),
        trainer: false,
        commute: true,
        activity_type: "VirtualRide".to_owned(),
        external_id: "cadecalc-9001.gpx".to_owned(),
    }
}

#[tokio::test]
async fn test_fetch_activity_parses_gear_ratio() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities/9001"))
        .and(header("authorization", "Bearer token-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9001,
            "athlete": {"id": 134_815, "resource_state": 1},
            "name": "Morning fixie",
            "type": "Ride",
            "description": "48x16\r\non the track bike",
            "trainer": false,
            "commute": true,
            "start_date": "2024-05-01T07:00:00Z",
            "distance": 20_000.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StravaClient::with_client(config(&server), Client::new());
    let activity = client.fetch_activity(9001, &credential()).await.unwrap();

    assert_eq!(activity.owner_id, 134_815);
    assert_eq!(activity.activity_type, "Ride");
    assert!(activity.commute);
    let gear = activity.gear_ratio.unwrap();
    assert_eq!((gear.chainring, gear.cog), (48, 16));
}

#[tokio::test]
async fn test_fetch_streams_requests_keyed_channels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities/9001/streams"))
        .and(query_param("key_by_type", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latlng": {"data": [[37.77, -122.42], [37.7701, -122.42]], "series_type": "distance", "original_size": 2, "resolution": "high"},
            "distance": {"data": [0.0, 5.0], "series_type": "distance", "original_size": 2, "resolution": "high"},
            "time": {"data": [0, 1], "series_type": "distance", "original_size": 2, "resolution": "high"}
        })))
        .mount(&server)
        .await;

    let client = StravaClient::with_client(config(&server), Client::new());
    let stream = client.fetch_streams(9001, &credential()).await.unwrap();

    assert!(!stream.has_recorded_cadence());
    let distance = stream.get("distance").unwrap();
    assert_eq!(distance.data, StreamData::Scalars(vec![0.0, 5.0]));
    assert_eq!(distance.resolution, "high");
    assert_eq!(
        stream.get("latlng").unwrap().data.as_coordinates().unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_missing_activity_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities/1"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Record Not Found"}"#))
        .mount(&server)
        .await;

    let client = StravaClient::with_client(config(&server), Client::new());
    let err = client.fetch_activity(1, &credential()).await.unwrap_err();

    assert!(matches!(err, ProviderError::NotFound { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities/1"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "15"))
        .mount(&server)
        .await;

    let client = StravaClient::with_client(config(&server), Client::new());
    let err = client.fetch_activity(1, &credential()).await.unwrap_err();

    assert!(matches!(
        err,
        ProviderError::RateLimited {
            retry_after_secs: Some(15),
            ..
        }
    ));
}

#[tokio::test]
async fn test_submit_sends_gpx_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .and(header("authorization", "Bearer token-abc"))
        .and(body_string_contains("cadecalc-9001.gpx"))
        .and(body_string_contains("<gpx/>"))
        .and(body_string_contains("Morning fixie"))
        .and(body_string_contains("VirtualRide"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 555,
            "status": "Your activity is still being processed.",
            "error": null,
            "activity_id": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StravaClient::with_client(config(&server), Client::new());
    let upload_id = client
        .submit(&credential(), b"<gpx/>".to_vec(), &metadata())
        .await
        .unwrap();

    assert_eq!(upload_id, 555);
}

#[tokio::test]
async fn test_poll_status_maps_upload_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "error": null, "activity_id": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "error": null, "activity_id": 9002})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "error": "malformed GPX", "activity_id": null})))
        .mount(&server)
        .await;

    let client = StravaClient::with_client(config(&server), Client::new());

    assert_eq!(
        client.poll_status(&credential(), 1).await.unwrap(),
        UploadStatus::Pending
    );
    assert_eq!(
        client.poll_status(&credential(), 2).await.unwrap(),
        UploadStatus::Ready(9002)
    );
    assert_eq!(
        client.poll_status(&credential(), 3).await.unwrap(),
        UploadStatus::Error("malformed GPX".to_owned())
    );
}

#[tokio::test]
async fn test_exchange_code_returns_athlete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("client_secret=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "access",
            "refresh_token": "refresh",
            "expires_at": 1_714_568_400,
            "athlete": {"id": 134_815}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let oauth = StravaOAuthClient::with_client(config(&server), Client::new());
    let grant = oauth.exchange_code("abc").await.unwrap();

    assert_eq!(grant.access_token, "access");
    assert_eq!(grant.athlete_id, Some(134_815));
    assert_eq!(grant.expires_at.timestamp(), 1_714_568_400);
}

#[tokio::test]
async fn test_rejected_refresh_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid refresh token"))
        .mount(&server)
        .await;

    let oauth = StravaOAuthClient::with_client(config(&server), Client::new());
    let err = oauth.refresh("stale").await.unwrap_err();

    assert!(matches!(err, ProviderError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_ensure_reuses_matching_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/push_subscriptions"))
        .and(query_param("client_id", "1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "callback_url": "https://cadence.example.com/subscribe", "created_at": "2024-05-01T07:00:00Z"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/push_subscriptions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 8})))
        .expect(0)
        .mount(&server)
        .await;

    let subscriptions = StravaSubscriptions::with_client(config(&server), Client::new());
    let id = subscriptions
        .ensure("https://cadence.example.com/subscribe", "verify")
        .await
        .unwrap();

    assert_eq!(id, 7);
}

#[tokio::test]
async fn test_ensure_replaces_stale_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/push_subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "callback_url": "https://old.example.com/subscribe"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/push_subscriptions/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/push_subscriptions"))
        .and(body_string_contains("verify_token=verify"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 8})))
        .expect(1)
        .mount(&server)
        .await;

    let subscriptions = StravaSubscriptions::with_client(config(&server), Client::new());
    let id = subscriptions
        .ensure("https://cadence.example.com/subscribe", "verify")
        .await
        .unwrap();

    assert_eq!(id, 8);
}
