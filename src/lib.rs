// ABOUTME: Main library entry point for the cadecalc cadence synthesis service
// ABOUTME: Replaces Strava rides lacking cadence with copies carrying derived cadence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

#![deny(unsafe_code)]

//! # cadecalc
//!
//! A webhook-driven service that gives single-speed and fixed-gear rides a
//! cadence channel. Crank cadence is derived from distance samples and the
//! gear ratio written in the activity description (`48x16`), encoded as a GPX
//! track, and uploaded in place of the original.
//!
//! ## Pipeline
//!
//! 1. Strava delivers an activity event to `POST /subscribe`
//! 2. The [`replacement::ReplacementOrchestrator`] checks dedup and scopes,
//!    then fetches the activity and its streams
//! 3. [`cadence`] derives one cadence sample per distance sample
//! 4. [`gpx`] encodes the augmented stream
//! 5. The original is deleted, the GPX uploaded, and [`upload`] polls until
//!    the new activity exists
//!
//! ## Crates
//!
//! - `cadecalc-core`: models, constants, and error types
//! - `cadecalc-providers`: Strava REST clients and the deletion helper
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadecalc::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("cadecalc will listen on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

pub use cadecalc_core::{constants, errors, models};
pub use cadecalc_providers as providers;

/// Credential store and token refresh
pub mod auth;

/// Cadence derivation from distance and gearing
pub mod cadence;

/// Environment-driven configuration
pub mod config;

/// Processed-event tracking
pub mod dedup;

/// GPX track encoding
pub mod gpx;

/// Structured logging setup
pub mod logging;

/// Delete-then-upload replacement orchestration
pub mod replacement;

/// HTTP routes
pub mod routes;

/// Upload submission and completion polling
pub mod upload;
