// ABOUTME: Sample stream model keyed by channel name, matching the Strava streams API shape
// ABOUTME: Channels hold scalar, integer, or coordinate samples plus size and resolution metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::channels;

/// Samples of one channel
///
/// Deserialization tries coordinates first, then scalars; integer channels
/// are only produced locally (synthesized cadence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamData {
    /// `[lat, lng]` pairs
    Coordinates(Vec<[f64; 2]>),
    /// Numeric samples
    Scalars(Vec<f64>),
    /// Integer samples
    Integers(Vec<i32>),
}

impl StreamData {
    /// Number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Coordinates(v) => v.len(),
            Self::Scalars(v) => v.len(),
            Self::Integers(v) => v.len(),
        }
    }

    /// Whether the channel has no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar samples, if this is a scalar channel
    #[must_use]
    pub fn as_scalars(&self) -> Option<&[f64]> {
        match self {
            Self::Scalars(v) => Some(v),
            Self::Coordinates(v) if v.is_empty() => Some(&[]),
            Self::Coordinates(_) | Self::Integers(_) => None,
        }
    }

    /// Coordinate samples, if this is a coordinate channel
    #[must_use]
    pub fn as_coordinates(&self) -> Option<&[[f64; 2]]> {
        match self {
            Self::Coordinates(v) => Some(v),
            Self::Scalars(v) if v.is_empty() => Some(&[]),
            Self::Scalars(_) | Self::Integers(_) => None,
        }
    }
}

/// One named channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChannel {
    /// Samples
    pub data: StreamData,
    /// What the samples are indexed by (`time` or `distance`)
    pub series_type: String,
    /// Sample count on the platform side
    pub original_size: usize,
    /// Sampling resolution (`low`, `medium`, `high`)
    pub resolution: String,
}

/// All channels fetched for one activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleStream {
    channels: BTreeMap<String, StreamChannel>,
}

impl SampleStream {
    /// Empty stream
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a channel
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StreamChannel> {
        self.channels.get(name)
    }

    /// Whether a channel is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Insert or replace a channel
    pub fn insert(&mut self, name: impl Into<String>, channel: StreamChannel) {
        self.channels.insert(name.into(), channel);
    }

    /// Channel names in sorted order
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Whether an existing, non-empty cadence channel was recorded
    #[must_use]
    pub fn has_recorded_cadence(&self) -> bool {
        self.get(channels::CADENCE)
            .is_some_and(|channel| !channel.data.is_empty())
    }

    /// Replace the cadence channel with synthesized samples
    ///
    /// The channel copies `original_size` and `resolution` from `distance`.
    /// Returns `None` when there is no distance channel to align with.
    #[must_use]
    pub fn with_synthesized_cadence(mut self, cadence: Vec<i32>) -> Option<Self> {
        let distance = self.get(channels::DISTANCE)?;
        let channel = StreamChannel {
            data: StreamData::Integers(cadence),
            series_type: channels::SERIES_TYPE_TIME.to_owned(),
            original_size: distance.original_size,
            resolution: distance.resolution.clone(),
        };
        self.insert(channels::CADENCE, channel);
        Some(self)
    }
}
