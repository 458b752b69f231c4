// ABOUTME: Structured error types for remote fitness platform operations
// ABOUTME: Distinguishes auth, not-found, rate limit, API, network, and decode failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use thiserror::Error;

/// Errors returned by provider clients
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials were rejected by the provider
    #[error("{provider} authentication failed: {reason}")]
    AuthenticationFailed {
        /// Provider name
        provider: String,
        /// Reason reported by the provider or client
        reason: String,
    },

    /// Requested resource does not exist
    #[error("{provider} {resource_type} {resource_id} not found")]
    NotFound {
        /// Provider name
        provider: String,
        /// Kind of resource (activity, upload, subscription)
        resource_type: String,
        /// Resource identifier
        resource_id: String,
    },

    /// Provider rate limit hit
    #[error("{provider} rate limit exceeded")]
    RateLimited {
        /// Provider name
        provider: String,
        /// Seconds until the limit resets, when reported
        retry_after_secs: Option<u64>,
    },

    /// Non-success status not covered by the other variants
    #[error("{provider} API error ({status_code}): {message}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status code
        status_code: u16,
        /// Response body or summary
        message: String,
    },

    /// Transport-level failure
    #[error("{provider} network error: {message}")]
    Network {
        /// Provider name
        provider: String,
        /// Underlying error message
        message: String,
    },

    /// Response body could not be decoded
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        /// Provider name
        provider: String,
        /// Decode error message
        message: String,
    },
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching variant
    #[must_use]
    pub fn from_status(
        provider: &str,
        status_code: u16,
        resource_type: &str,
        resource_id: &str,
        body: String,
    ) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationFailed {
                provider: provider.to_owned(),
                reason: body,
            },
            404 => Self::NotFound {
                provider: provider.to_owned(),
                resource_type: resource_type.to_owned(),
                resource_id: resource_id.to_owned(),
            },
            429 => Self::RateLimited {
                provider: provider.to_owned(),
                retry_after_secs: None,
            },
            _ => Self::Api {
                provider: provider.to_owned(),
                status_code,
                message: body,
            },
        }
    }

    /// Whether a retry of the same idempotent read could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network { .. } => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed { .. }
            | Self::NotFound { .. }
            | Self::InvalidResponse { .. } => false,
        }
    }
}

#[cfg(feature = "provider-errors")]
impl ProviderError {
    /// Wrap a reqwest transport or decode error
    #[must_use]
    pub fn from_reqwest(provider: &str, error: &reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse {
                provider: provider.to_owned(),
                message: error.to_string(),
            }
        } else {
            Self::Network {
                provider: provider.to_owned(),
                message: error.to_string(),
            }
        }
    }
}

/// Result alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
