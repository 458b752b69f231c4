// ABOUTME: Error types for the pure pipeline stages (cadence derivation, track encoding)
// ABOUTME: These stages never touch the network, so their errors carry only data context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use thiserror::Error;

/// Cadence derivation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CadenceError {
    /// Chainring or cog is zero
    #[error("invalid gear ratio {chainring}x{cog}")]
    InvalidGearRatio {
        /// Chainring tooth count
        chainring: u32,
        /// Cog tooth count
        cog: u32,
    },
}

/// Track encoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A channel the encoder cannot work without is absent
    #[error("stream is missing required channel '{channel}'")]
    MissingRequiredChannel {
        /// Channel name
        channel: String,
    },

    /// A channel holds fewer samples than `original_size` promises
    #[error("channel '{channel}' has no sample at index {index} (len {len})")]
    ChannelIndexOutOfRange {
        /// Channel name
        channel: String,
        /// Index that was requested
        index: usize,
        /// Number of samples actually present
        len: usize,
    },

    /// A channel holds the wrong sample shape (scalar vs coordinate)
    #[error("channel '{channel}' does not hold {expected} samples")]
    UnexpectedSampleShape {
        /// Channel name
        channel: String,
        /// Expected shape
        expected: &'static str,
    },

    /// Start timestamp is not RFC3339
    #[error("start timestamp '{value}' is not RFC3339")]
    InvalidTimestamp {
        /// Offending value
        value: String,
    },
}
