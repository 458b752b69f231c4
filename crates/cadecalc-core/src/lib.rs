// ABOUTME: Core types and constants for the cadecalc activity replacement service
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

#![deny(unsafe_code)]

//! # Cadecalc Core
//!
//! Foundation crate providing shared types for the cadence replacement
//! pipeline. Nothing in here performs I/O, so the models can be shared by the
//! provider clients and the orchestrator without pulling in the HTTP stack.
//!
//! ## Modules
//!
//! - **errors**: `AppError`/`ErrorCode`, provider errors, and the replacement failure taxonomy
//! - **models**: Activity snapshot, gear ratio, sample streams, webhook events, outcomes
//! - **constants**: Wheel geometry defaults, Strava endpoints, stream channel names

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (Activity, SampleStream, WebhookEvent, `ReplacementOutcome`)
pub mod models;
