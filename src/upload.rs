// ABOUTME: Upload submission and bounded completion polling for replacement activities
// ABOUTME: Waits an initial delay, then polls at a fixed interval until ready, failed, or exhausted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::constants::polling::{
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS,
};
use crate::constants::strava::PROVIDER_NAME;
use crate::errors::{FailureReason, ProviderError, ProviderResult};
use crate::providers::{AccessCredential, ActivityUploader, UploadMetadata, UploadStatus};

/// Default bound on a single status query
pub const STATUS_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Polling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first status query
    pub initial_delay: Duration,
    /// Wait between status queries
    pub interval: Duration,
    /// Status queries before giving up; at least one is always made
    pub max_attempts: u32,
    /// Longest a single status query may take before it counts as a failed attempt
    pub query_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            query_timeout: STATUS_QUERY_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Upper bound on time spent sleeping between queries
    ///
    /// Each status query adds at most `query_timeout`.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.initial_delay
            .saturating_add(self.interval.saturating_mul(self.max_attempts))
    }

    const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }
}

/// Why an upload did not produce an activity
#[derive(Debug, Error)]
pub enum PollError {
    /// Submission was rejected or never reached the platform
    #[error("upload submission failed: {0}")]
    Submit(#[source] ProviderError),

    /// Processing finished with an error
    #[error("upload {upload_id} was rejected: {message}")]
    Rejected {
        /// Upload session id
        upload_id: u64,
        /// Platform error text
        message: String,
    },

    /// A status query failed in a way retrying cannot fix
    #[error("status query for upload {upload_id} failed: {source}")]
    Status {
        /// Upload session id
        upload_id: u64,
        /// Underlying provider error
        #[source]
        source: ProviderError,
    },

    /// Attempts exhausted while still pending
    #[error("upload {upload_id} still processing after {attempts} status queries")]
    TimedOut {
        /// Upload session id
        upload_id: u64,
        /// Status queries made
        attempts: u32,
    },

    /// Shutdown requested while the file was being submitted
    ///
    /// Whether the platform received the file is unknown.
    #[error("upload submission interrupted: cancelled")]
    SubmitCancelled,

    /// Shutdown requested while waiting
    #[error("stopped waiting for upload {upload_id}: cancelled")]
    Cancelled {
        /// Upload session id
        upload_id: u64,
    },
}

impl PollError {
    /// Outcome reason for this error
    #[must_use]
    pub const fn failure_reason(&self) -> FailureReason {
        match self {
            Self::Submit(_) | Self::Rejected { .. } | Self::Status { .. } => {
                FailureReason::UploadFailed
            }
            Self::TimedOut { .. } | Self::Cancelled { .. } | Self::SubmitCancelled => {
                FailureReason::UploadTimedOut
            }
        }
    }

    /// Upload session id, once one exists
    #[must_use]
    pub const fn upload_id(&self) -> Option<u64> {
        match self {
            Self::Submit(_) | Self::SubmitCancelled => None,
            Self::Rejected { upload_id, .. }
            | Self::Status { upload_id, .. }
            | Self::TimedOut { upload_id, .. }
            | Self::Cancelled { upload_id } => Some(*upload_id),
        }
    }
}

/// Submits a file once and polls it to completion
#[derive(Clone)]
pub struct UploadPoller {
    uploader: Arc<dyn ActivityUploader>,
    config: PollConfig,
}

/// Sleep unless cancelled first; `false` means cancelled
async fn wait(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = sleep(duration) => true,
    }
}

impl UploadPoller {
    /// Poller over `uploader` with `config`
    #[must_use]
    pub fn new(uploader: Arc<dyn ActivityUploader>, config: PollConfig) -> Self {
        Self { uploader, config }
    }

    /// Polling schedule
    #[must_use]
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Submit `file` and wait for the resulting activity id
    ///
    /// Submission happens exactly once. Status queries are idempotent reads:
    /// a transient failure (network, rate limit, 5xx) uses up an attempt and
    /// polling continues.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError`] if submission fails, processing reports an
    /// error, a status query fails permanently, attempts run out, or `cancel`
    /// fires before an activity appears
    #[instrument(skip_all, fields(upload.external_id = %metadata.external_id))]
    pub async fn submit_and_wait(
        &self,
        credential: &AccessCredential,
        file: Vec<u8>,
        metadata: &UploadMetadata,
        cancel: &CancellationToken,
    ) -> Result<u64, PollError> {
        let submitted = tokio::select! {
            () = cancel.cancelled() => return Err(PollError::SubmitCancelled),
            result = self.uploader.submit(credential, file, metadata) => result,
        };
        let upload_id = submitted.map_err(PollError::Submit)?;
        info!(upload.id = upload_id, "upload submitted");

        if !wait(self.config.initial_delay, cancel).await {
            return Err(PollError::Cancelled { upload_id });
        }

        let attempts = self.config.attempts();
        for attempt in 1..=attempts {
            match self.query_status(credential, upload_id, cancel).await? {
                Ok(UploadStatus::Ready(activity_id)) => {
                    info!(upload.id = upload_id, activity.id = activity_id, attempt, "upload ready");
                    return Ok(activity_id);
                }
                Ok(UploadStatus::Error(message)) => {
                    return Err(PollError::Rejected { upload_id, message });
                }
                Ok(UploadStatus::Pending) => {
                    debug!(upload.id = upload_id, attempt, "upload still processing");
                }
                Err(error) if error.is_transient() => {
                    warn!(upload.id = upload_id, attempt, error = %error, "upload status query failed");
                }
                Err(source) => return Err(PollError::Status { upload_id, source }),
            }

            if attempt < attempts && !wait(self.config.interval, cancel).await {
                return Err(PollError::Cancelled { upload_id });
            }
        }

        Err(PollError::TimedOut {
            upload_id,
            attempts,
        })
    }

    /// One status query, bounded by `query_timeout` and `cancel`
    async fn query_status(
        &self,
        credential: &AccessCredential,
        upload_id: u64,
        cancel: &CancellationToken,
    ) -> Result<ProviderResult<UploadStatus>, PollError> {
        let limit = self.config.query_timeout;
        let query = timeout(
            limit,
            self.uploader.poll_status(credential, upload_id),
        );
        tokio::select! {
            () = cancel.cancelled() => Err(PollError::Cancelled { upload_id }),
            result = query => Ok(result.unwrap_or_else(|_| {
                Err(ProviderError::Network {
                    provider: PROVIDER_NAME.to_owned(),
                    message: format!("status query exceeded {}ms", limit.as_millis()),
                })
            })),
        }
    }
}
