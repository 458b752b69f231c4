// ABOUTME: Terminal failure taxonomy for a single webhook delivery
// ABOUTME: Each reason maps to one failing pipeline stage and records data-loss risk
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CadenceError, EncodeError};

/// Why a delivery ended in `Failed`
///
/// None of these are retried inside the pipeline. `UploadFailed` and
/// `UploadTimedOut` can only happen after the original activity was deleted,
/// so they are the data-loss cases operators must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Webhook payload could not be parsed
    MalformedEvent,
    /// Owner has no grant, lacks a scope, or has no usable credential
    ScopeOrCredentialUnavailable,
    /// Activity metadata or streams could not be fetched
    RemoteFetchFailed,
    /// Gear ratio could not drive the cadence engine
    InvalidGearRatio,
    /// A channel required for synthesis or encoding is absent
    MissingRequiredChannel,
    /// Stream data was inconsistent with its declared size or format
    EncodingFailed,
    /// Deletion was not confirmed; original presumed intact
    DeletionFailed,
    /// Upload was rejected or processing reported an error
    UploadFailed,
    /// Processing did not complete within the polling budget
    UploadTimedOut,
}

impl FailureReason {
    /// Stable identifier used in logs and JSON
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedEvent => "MalformedEvent",
            Self::ScopeOrCredentialUnavailable => "ScopeOrCredentialUnavailable",
            Self::RemoteFetchFailed => "RemoteFetchFailed",
            Self::InvalidGearRatio => "InvalidGearRatio",
            Self::MissingRequiredChannel => "MissingRequiredChannel",
            Self::EncodingFailed => "EncodingFailed",
            Self::DeletionFailed => "DeletionFailed",
            Self::UploadFailed => "UploadFailed",
            Self::UploadTimedOut => "UploadTimedOut",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&CadenceError> for FailureReason {
    fn from(error: &CadenceError) -> Self {
        match error {
            CadenceError::InvalidGearRatio { .. } => Self::InvalidGearRatio,
        }
    }
}

impl From<&EncodeError> for FailureReason {
    fn from(error: &EncodeError) -> Self {
        match error {
            EncodeError::MissingRequiredChannel { .. } => Self::MissingRequiredChannel,
            EncodeError::ChannelIndexOutOfRange { .. }
            | EncodeError::UnexpectedSampleShape { .. }
            | EncodeError::InvalidTimestamp { .. } => Self::EncodingFailed,
        }
    }
}
