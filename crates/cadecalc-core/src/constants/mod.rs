// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Wheel geometry, Strava endpoints, stream channel names, and env variable keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! Constants grouped by domain.

/// Drivetrain and wheel geometry defaults
pub mod geometry {
    /// ISO 622 mm bead seat diameter (700c road wheel)
    pub const DEFAULT_WHEEL_DIAMETER_MM: f64 = 622.0;
    /// Default tire width in millimetres
    pub const DEFAULT_TIRE_WIDTH_MM: f64 = 25.0;
    /// Millimetres per metre
    pub const MM_PER_METER: f64 = 1000.0;
    /// Seconds per minute
    pub const SECONDS_PER_MINUTE: f64 = 60.0;
}

/// Sample stream channel names as returned by the Strava streams API
pub mod channels {
    /// Seconds since activity start
    pub const TIME: &str = "time";
    /// Latitude/longitude pairs
    pub const LATLNG: &str = "latlng";
    /// Cumulative distance in metres
    pub const DISTANCE: &str = "distance";
    /// Altitude in metres
    pub const ALTITUDE: &str = "altitude";
    /// Heart rate in BPM
    pub const HEARTRATE: &str = "heartrate";
    /// Cadence in RPM
    pub const CADENCE: &str = "cadence";
    /// Series type used for the synthesized cadence channel
    pub const SERIES_TYPE_TIME: &str = "time";
    /// Keys requested from the streams endpoint
    pub const REQUESTED_KEYS: &str = "time,latlng,distance,altitude,heartrate,cadence";
}

/// Strava provider constants
pub mod strava {
    /// Provider name used in logs
    pub const PROVIDER_NAME: &str = "strava";
    /// REST API base URL
    pub const API_BASE_URL: &str = "https://www.strava.com/api/v3";
    /// OAuth authorization page
    pub const AUTH_URL: &str = "https://www.strava.com/oauth/authorize";
    /// OAuth token endpoint
    pub const TOKEN_URL: &str = "https://www.strava.com/oauth/token";
    /// Scope needed to read private activities and their streams
    pub const SCOPE_ACTIVITY_READ_ALL: &str = "activity:read_all";
    /// Scope needed to upload the replacement activity
    pub const SCOPE_ACTIVITY_WRITE: &str = "activity:write";
    /// Scope granting profile read access
    pub const SCOPE_READ: &str = "read";
    /// Upload data type for the re-encoded track file
    pub const UPLOAD_DATA_TYPE_GPX: &str = "gpx";
    /// Activity types eligible for cadence synthesis
    pub const CYCLING_ACTIVITY_TYPES: &[&str] = &["Ride", "VirtualRide"];
}

/// Webhook event vocabulary
pub mod webhook {
    /// `object_type` for activity events
    pub const OBJECT_TYPE_ACTIVITY: &str = "activity";
    /// Subscription validation mode
    pub const HUB_MODE_SUBSCRIBE: &str = "subscribe";
}

/// Upload polling defaults
pub mod polling {
    /// Delay before the first status query
    pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2_000;
    /// Delay between status queries
    pub const DEFAULT_INTERVAL_MS: u64 = 2_000;
    /// Maximum number of status queries
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;
}

/// Environment variable names
pub mod env_config {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Public domain used to build the webhook callback URL
    pub const SERVER_DOMAIN: &str = "SERVER_DOMAIN";
    /// Strava OAuth client id
    pub const STRAVA_CLIENT_ID: &str = "STRAVA_CLIENT_ID";
    /// Strava OAuth client secret
    pub const STRAVA_CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
    /// Token echoed back during subscription validation
    pub const STRAVA_VERIFY_TOKEN: &str = "STRAVA_VERIFY_TOKEN";
    /// Override for the Strava REST base URL
    pub const STRAVA_API_BASE_URL: &str = "STRAVA_API_BASE_URL";
    /// Override for the Strava OAuth token URL
    pub const STRAVA_TOKEN_URL: &str = "STRAVA_TOKEN_URL";
    /// Delay before first upload status query
    pub const POLL_INITIAL_DELAY_MS: &str = "CADECALC_POLL_INITIAL_DELAY_MS";
    /// Delay between upload status queries
    pub const POLL_INTERVAL_MS: &str = "CADECALC_POLL_INTERVAL_MS";
    /// Maximum upload status queries
    pub const POLL_MAX_ATTEMPTS: &str = "CADECALC_POLL_MAX_ATTEMPTS";
    /// Wheel bead seat diameter
    pub const WHEEL_DIAMETER_MM: &str = "CADECALC_WHEEL_DIAMETER_MM";
    /// Tire width
    pub const TIRE_WIDTH_MM: &str = "CADECALC_TIRE_WIDTH_MM";
    /// External helper program that deletes an activity
    pub const DELETE_COMMAND: &str = "CADECALC_DELETE_COMMAND";
    /// Timeout for the deletion helper
    pub const DELETE_TIMEOUT_SECS: &str = "CADECALC_DELETE_TIMEOUT_SECS";
    /// Athlete whose account credential is seeded at startup
    pub const ATHLETE_ID: &str = "CADECALC_ATHLETE_ID";
    /// Account login for the seeded athlete
    pub const ATHLETE_EMAIL: &str = "CADECALC_ATHLETE_EMAIL";
    /// Account password for the seeded athlete
    pub const ATHLETE_PASSWORD: &str = "CADECALC_ATHLETE_PASSWORD";
    /// Shared HTTP client request timeout
    pub const HTTP_CLIENT_TIMEOUT_SECS: &str = "HTTP_CLIENT_TIMEOUT_SECS";
    /// Shared HTTP client connect timeout
    pub const HTTP_CLIENT_CONNECT_TIMEOUT_SECS: &str = "HTTP_CLIENT_CONNECT_TIMEOUT_SECS";
}

/// Service names for structured logging
pub mod service_names {
    /// Main server service name
    pub const CADECALC_SERVER: &str = "cadecalc";
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 5000;
}

/// HTTP routes
pub mod routes {
    /// Subscription validation and event delivery
    pub const SUBSCRIBE: &str = "/subscribe";
    /// OAuth redirect target
    pub const AUTH: &str = "/auth";
    /// Health check
    pub const HEALTH: &str = "/health";
}
