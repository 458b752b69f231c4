// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Scripted platform and deletion doubles plus activity and stream fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `cadecalc`

use async_trait::async_trait;
use cadecalc::auth::{parse_scopes, CredentialStore};
use cadecalc::cadence::CadenceParams;
use cadecalc::dedup::{DedupStore, InMemoryDedupStore};
use cadecalc::errors::{ProviderError, ProviderResult};
use cadecalc::models::{Activity, AspectType, SampleStream, StreamChannel, StreamData, WebhookEvent};
use cadecalc::providers::strava::TokenGrant;
use cadecalc::providers::{
    AccessCredential, AccountCredential, ActivitySource, ActivityUploader, DeletionCapability,
    TelemetrySource, UploadMetadata, UploadStatus,
};
use cadecalc::replacement::{Collaborators, ReplacementOrchestrator};
use cadecalc::upload::PollConfig;
use chrono::{TimeDelta, Utc};
use std::collections::VecDeque;
use std::future::pending;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub const OWNER_ID: u64 = 134_815;
pub const ACTIVITY_ID: u64 = 9_001;
pub const NEW_ACTIVITY_ID: u64 = 9_002;
pub const UPLOAD_ID: u64 = 555;

/// Fixed-gear ride with gearing in its description
pub fn ride_activity(id: u64) -> Activity {
    Activity {
        id,
        owner_id: OWNER_ID,
        activity_type: "Ride".to_owned(),
        name: "Morning fixie".to_owned(),
        description: Some("48x16\r\non the track bike".to_owned()),
        trainer: false,
        commute: true,
        start_date: "2024-05-01T07:00:00Z".to_owned(),
        average_cadence: None,
        gear_ratio: None,
    }
    .with_parsed_gear_ratio()
}

pub fn channel(data: StreamData, series_type: &str) -> StreamChannel {
    let original_size = data.len();
    StreamChannel {
        data,
        series_type: series_type.to_owned(),
        original_size,
        resolution: "high".to_owned(),
    }
}

/// Stream of `points` samples, one second and five metres apart
pub fn ride_stream(points: usize) -> SampleStream {
    let mut stream = SampleStream::new();
    stream.insert(
        "latlng",
        channel(
            StreamData::Coordinates(
                (0..points)
                    .map(|i| [37.77 + i as f64 * 0.0001, -122.42])
                    .collect(),
            ),
            "distance",
        ),
    );
    stream.insert(
        "time",
        channel(
            StreamData::Integers((0..points).map(|i| i as i32).collect()),
            "distance",
        ),
    );
    stream.insert(
        "distance",
        channel(
            StreamData::Scalars((1..=points).map(|i| i as f64 * 5.0).collect()),
            "distance",
        ),
    );
    stream.insert(
        "altitude",
        channel(StreamData::Scalars(vec![12.0; points]), "distance"),
    );
    stream
}

/// Activity create event for `activity_id`
pub fn create_event(activity_id: u64) -> WebhookEvent {
    WebhookEvent {
        object_type: "activity".to_owned(),
        object_id: activity_id,
        aspect_type: AspectType::Create,
        owner_id: OWNER_ID,
        subscription_id: Some(1),
        event_time: Some(1_714_546_800),
        updates: None,
    }
}

pub fn token_grant() -> TokenGrant {
    TokenGrant {
        access_token: "access".to_owned(),
        refresh_token: "refresh".to_owned(),
        expires_at: Utc::now() + TimeDelta::hours(6),
        athlete_id: Some(OWNER_ID),
    }
}

/// Store with full scopes, a valid token, and an account login for the owner
pub fn authorized_store() -> CredentialStore {
    let store = CredentialStore::new();
    store.store_grant(
        OWNER_ID,
        token_grant(),
        parse_scopes("read,activity:read_all,activity:write"),
    );
    store.set_account(
        OWNER_ID,
        AccountCredential::new("rider@example.com", "hunter2"),
    );
    store
}

/// Millisecond-scale poll schedule with `max_attempts` queries
pub fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        initial_delay: Duration::from_millis(1),
        interval: Duration::from_millis(1),
        max_attempts,
        query_timeout: Duration::from_millis(20),
    }
}

pub fn network_error() -> ProviderError {
    ProviderError::Network {
        provider: "strava".to_owned(),
        message: "connection reset".to_owned(),
    }
}

/// Scripted stand-in for the Strava REST API
#[derive(Default)]
pub struct MockPlatform {
    pub activity: Mutex<Option<Activity>>,
    pub streams: Mutex<Option<SampleStream>>,
    pub submit_error: Mutex<Option<ProviderError>>,
    /// Status replies in order; `Pending` once exhausted
    pub statuses: Mutex<VecDeque<ProviderResult<UploadStatus>>>,
    /// Submissions never complete
    pub hang_submit: AtomicBool,
    /// Status queries never complete
    pub hang_status: AtomicBool,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub uploaded: Mutex<Option<(Vec<u8>, UploadMetadata)>>,
}

impl MockPlatform {
    /// Platform serving a ride without cadence whose upload becomes ready
    pub fn with_ride() -> Self {
        let platform = Self::default();
        *platform.activity.lock().unwrap() = Some(ride_activity(ACTIVITY_ID));
        *platform.streams.lock().unwrap() = Some(ride_stream(4));
        platform.push_status(Ok(UploadStatus::Pending));
        platform.push_status(Ok(UploadStatus::Ready(NEW_ACTIVITY_ID)));
        platform
    }

    pub fn push_status(&self, status: ProviderResult<UploadStatus>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn uploaded_gpx(&self) -> String {
        let uploaded = self.uploaded.lock().unwrap();
        String::from_utf8(uploaded.as_ref().unwrap().0.clone()).unwrap()
    }
}

fn not_found(resource_type: &str, id: u64) -> ProviderError {
    ProviderError::NotFound {
        provider: "strava".to_owned(),
        resource_type: resource_type.to_owned(),
        resource_id: id.to_string(),
    }
}

#[async_trait]
impl ActivitySource for MockPlatform {
    async fn fetch_activity(
        &self,
        activity_id: u64,
        _credential: &AccessCredential,
    ) -> ProviderResult<Activity> {
        self.activity
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| not_found("activity", activity_id))
    }
}

#[async_trait]
impl TelemetrySource for MockPlatform {
    async fn fetch_streams(
        &self,
        activity_id: u64,
        _credential: &AccessCredential,
    ) -> ProviderResult<SampleStream> {
        self.streams
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| not_found("streams", activity_id))
    }
}

#[async_trait]
impl ActivityUploader for MockPlatform {
    async fn submit(
        &self,
        _credential: &AccessCredential,
        file: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> ProviderResult<u64> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.hang_submit.load(Ordering::SeqCst) {
            pending::<()>().await;
        }
        if let Some(error) = self.submit_error.lock().unwrap().take() {
            return Err(error);
        }
        *self.uploaded.lock().unwrap() = Some((file, metadata.clone()));
        Ok(UPLOAD_ID)
    }

    async fn poll_status(
        &self,
        _credential: &AccessCredential,
        _upload_id: u64,
    ) -> ProviderResult<UploadStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.hang_status.load(Ordering::SeqCst) {
            pending::<()>().await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(UploadStatus::Pending))
    }
}

/// Deletion double with a fixed answer
pub struct MockDeletion {
    pub confirm: bool,
    pub calls: AtomicUsize,
}

impl MockDeletion {
    pub fn confirming() -> Self {
        Self {
            confirm: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn refusing() -> Self {
        Self {
            confirm: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeletionCapability for MockDeletion {
    async fn delete(&self, _account: &AccountCredential, _activity_id: u64) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.confirm
    }
}

/// Orchestrator wired to doubles, with handles for assertions
pub struct Harness {
    pub platform: Arc<MockPlatform>,
    pub deletion: Arc<MockDeletion>,
    pub dedup: Arc<InMemoryDedupStore>,
    pub orchestrator: ReplacementOrchestrator,
}

impl Harness {
    pub fn new(platform: MockPlatform, deletion: MockDeletion, store: CredentialStore) -> Self {
        Self::with_poll(platform, deletion, store, fast_poll(3))
    }

    pub fn with_poll(
        platform: MockPlatform,
        deletion: MockDeletion,
        store: CredentialStore,
        poll: PollConfig,
    ) -> Self {
        init_test_logging();
        let platform = Arc::new(platform);
        let deletion = Arc::new(deletion);
        let dedup = Arc::new(InMemoryDedupStore::new());
        let collaborators = Collaborators {
            activities: Arc::clone(&platform) as Arc<dyn ActivitySource>,
            telemetry: Arc::clone(&platform) as Arc<dyn TelemetrySource>,
            uploader: Arc::clone(&platform) as Arc<dyn ActivityUploader>,
            deletion: Arc::clone(&deletion) as Arc<dyn DeletionCapability>,
            credentials: Arc::new(store),
            dedup: Arc::clone(&dedup) as Arc<dyn DedupStore>,
        };
        let orchestrator =
            ReplacementOrchestrator::new(collaborators, poll, CadenceParams::default());
        Self {
            platform,
            deletion,
            dedup,
            orchestrator,
        }
    }

    /// Ride platform, confirming deletion, authorized owner
    pub fn happy() -> Self {
        Self::new(
            MockPlatform::with_ride(),
            MockDeletion::confirming(),
            authorized_store(),
        )
    }
}
