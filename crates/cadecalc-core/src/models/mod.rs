// ABOUTME: Domain models shared by provider clients and the replacement pipeline
// ABOUTME: Activity snapshots, gear ratios, sample streams, webhook events, and outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

/// Activity snapshot and gear ratio parsing
pub mod activity;
/// Replacement outcomes and pipeline stages
pub mod outcome;
/// Per-channel telemetry sample streams
pub mod stream;
/// Inbound push-subscription events
pub mod webhook;

pub use activity::{Activity, GearRatio};
pub use outcome::{OutcomeReason, ReplacementOutcome, ReplacementStage, ReplacementStatus, SkipReason};
pub use stream::{SampleStream, StreamChannel, StreamData};
pub use webhook::{AspectType, WebhookEvent};
