// ABOUTME: Configuration module for the cadecalc server
// ABOUTME: Re-exports the environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! Configuration loaded from environment variables at startup

/// Environment and server configuration
pub mod environment;

pub use environment::{
    DeletionConfig, HttpClientConfig, SeedAccount, ServerConfig, StravaAppConfig,
};
