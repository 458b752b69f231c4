// ABOUTME: Environment configuration for the cadecalc server process
// ABOUTME: Parses ports, Strava app credentials, polling, geometry, and deletion settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! Environment-based configuration
//!
//! Everything is read once by [`ServerConfig::from_env`]. Lookups go through
//! a closure so tests can supply a map instead of mutating the process
//! environment.

use anyhow::{anyhow, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::cadence::CadenceParams;
use crate::constants::env_config;
use crate::constants::geometry::{DEFAULT_TIRE_WIDTH_MM, DEFAULT_WHEEL_DIAMETER_MM};
use crate::constants::polling::{
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS,
};
use crate::constants::ports::DEFAULT_HTTP_PORT;
use crate::constants::routes;
use crate::constants::strava::{API_BASE_URL, AUTH_URL, TOKEN_URL};
use crate::providers::strava::StravaConfig;
use crate::providers::AccountCredential;
use crate::upload::{PollConfig, STATUS_QUERY_TIMEOUT};

/// Default shared HTTP client request timeout
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default shared HTTP client connect timeout
const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default deletion helper timeout
const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 120;

/// Strava application registration
#[derive(Clone)]
pub struct StravaAppConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Token Strava echoes during subscription validation
    pub verify_token: String,
    /// REST base URL
    pub api_base_url: String,
    /// OAuth token endpoint
    pub token_url: String,
}

impl fmt::Debug for StravaAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StravaAppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("verify_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// External deletion helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionConfig {
    /// Command line; `None` disables deletion
    pub command: Option<String>,
    /// Time allowed per deletion
    pub timeout: Duration,
}

/// Account login seeded into the credential store at startup
#[derive(Debug, Clone)]
pub struct SeedAccount {
    /// Strava athlete id the login belongs to
    pub athlete_id: u64,
    /// Web login used by the deletion helper
    pub account: AccountCredential,
}

/// Shared HTTP client timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Public origin, e.g. `https://cadecalc.example.com`
    pub server_domain: String,
    /// Strava application registration
    pub strava: StravaAppConfig,
    /// Upload polling schedule
    pub poll: PollConfig,
    /// Wheel geometry
    pub cadence: CadenceParams,
    /// Deletion helper
    pub deletion: DeletionConfig,
    /// Optional account login to seed
    pub seed_account: Option<SeedAccount>,
    /// Shared HTTP client timeouts
    pub http_client: HttpClientConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse or validate
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!(
            http_port = config.http_port,
            server_domain = %config.server_domain,
            deletion_enabled = config.deletion.command.is_some(),
            "configuration loaded successfully"
        );
        Ok(config)
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        let http_port = env.parse_or(env_config::HTTP_PORT, DEFAULT_HTTP_PORT)?;
        let server_domain = env
            .optional(env_config::SERVER_DOMAIN)
            .map_or_else(
                || format!("http://localhost:{http_port}"),
                |domain| domain.trim_end_matches('/').to_owned(),
            );

        let config = Self {
            http_port,
            server_domain,
            strava: StravaAppConfig {
                client_id: env.required(env_config::STRAVA_CLIENT_ID)?,
                client_secret: env.required(env_config::STRAVA_CLIENT_SECRET)?,
                verify_token: env.required(env_config::STRAVA_VERIFY_TOKEN)?,
                api_base_url: env
                    .optional(env_config::STRAVA_API_BASE_URL)
                    .unwrap_or_else(|| API_BASE_URL.to_owned()),
                token_url: env
                    .optional(env_config::STRAVA_TOKEN_URL)
                    .unwrap_or_else(|| TOKEN_URL.to_owned()),
            },
            poll: PollConfig {
                initial_delay: Duration::from_millis(
                    env.parse_or(env_config::POLL_INITIAL_DELAY_MS, DEFAULT_INITIAL_DELAY_MS)?,
                ),
                interval: Duration::from_millis(
                    env.parse_or(env_config::POLL_INTERVAL_MS, DEFAULT_INTERVAL_MS)?,
                ),
                max_attempts: env.parse_or(env_config::POLL_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?,
                query_timeout: STATUS_QUERY_TIMEOUT,
            },
            cadence: CadenceParams {
                wheel_diameter_mm: env
                    .parse_or(env_config::WHEEL_DIAMETER_MM, DEFAULT_WHEEL_DIAMETER_MM)?,
                tire_width_mm: env.parse_or(env_config::TIRE_WIDTH_MM, DEFAULT_TIRE_WIDTH_MM)?,
            },
            deletion: DeletionConfig {
                command: env.optional(env_config::DELETE_COMMAND),
                timeout: Duration::from_secs(
                    env.parse_or(env_config::DELETE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS)?,
                ),
            },
            seed_account: seed_account(&env)?,
            http_client: HttpClientConfig {
                timeout_secs: env
                    .parse_or(env_config::HTTP_CLIENT_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS)?,
                connect_timeout_secs: env.parse_or(
                    env_config::HTTP_CLIENT_CONNECT_TIMEOUT_SECS,
                    DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if wheel geometry is not positive or the polling
    /// schedule makes no status queries
    pub fn validate(&self) -> Result<()> {
        let CadenceParams {
            wheel_diameter_mm,
            tire_width_mm,
        } = self.cadence;
        if !(wheel_diameter_mm.is_finite() && wheel_diameter_mm > 0.0) {
            return Err(anyhow!(
                "{} must be a positive number, got {wheel_diameter_mm}",
                env_config::WHEEL_DIAMETER_MM
            ));
        }
        if !(tire_width_mm.is_finite() && tire_width_mm >= 0.0) {
            return Err(anyhow!(
                "{} must be a non-negative number, got {tire_width_mm}",
                env_config::TIRE_WIDTH_MM
            ));
        }
        if self.poll.max_attempts == 0 {
            return Err(anyhow!("{} must be at least 1", env_config::POLL_MAX_ATTEMPTS));
        }
        if self.deletion.command.is_none() {
            warn!(
                "{} is not set; every replacement will stop before deleting the original",
                env_config::DELETE_COMMAND
            );
        }
        Ok(())
    }

    /// Webhook callback registered with Strava
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.server_domain, routes::SUBSCRIBE)
    }

    /// OAuth redirect target
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.server_domain, routes::AUTH)
    }

    /// Provider client configuration
    #[must_use]
    pub fn strava_config(&self) -> StravaConfig {
        StravaConfig {
            client_id: self.strava.client_id.clone(),
            client_secret: self.strava.client_secret.clone(),
            api_base_url: self.strava.api_base_url.clone(),
            auth_url: AUTH_URL.to_owned(),
            token_url: self.strava.token_url.clone(),
        }
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Value of `key`, treating blank as unset
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| anyhow!("required environment variable {key} is not set"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .parse()
                .map_err(|e| anyhow!("Invalid {key} value {value:?}: {e}"))
        })
    }
}

fn seed_account<F>(env: &Lookup<F>) -> Result<Option<SeedAccount>>
where
    F: Fn(&str) -> Option<String>,
{
    let athlete_id = env.optional(env_config::ATHLETE_ID);
    let email = env.optional(env_config::ATHLETE_EMAIL);
    let password = env.optional(env_config::ATHLETE_PASSWORD);

    match (athlete_id, email, password) {
        (None, None, None) => Ok(None),
        (Some(athlete_id), Some(email), Some(password)) => {
            let athlete_id = athlete_id.parse().map_err(|e| {
                anyhow!("Invalid {} value {athlete_id:?}: {e}", env_config::ATHLETE_ID)
            })?;
            Ok(Some(SeedAccount {
                athlete_id,
                account: AccountCredential::new(email, password),
            }))
        }
        _ => Err(anyhow!(
            "{}, {} and {} must be set together",
            env_config::ATHLETE_ID,
            env_config::ATHLETE_EMAIL,
            env_config::ATHLETE_PASSWORD
        )),
    }
}
