// ABOUTME: Read-only activity snapshot and drivetrain gear ratio parsed from its description
// ABOUTME: The ratio is optional; an unparseable description means the activity is left alone
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::strava::CYCLING_ACTIVITY_TYPES;

/// Chainring/cog tooth counts; both are always > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GearRatio {
    /// Chainring tooth count
    pub chainring: u32,
    /// Cog tooth count
    pub cog: u32,
}

impl GearRatio {
    /// Build a ratio, rejecting zero tooth counts
    #[must_use]
    pub const fn new(chainring: u32, cog: u32) -> Option<Self> {
        if chainring == 0 || cog == 0 {
            None
        } else {
            Some(Self { chainring, cog })
        }
    }

    /// Find the first `<chainring>x<cog>` pair in a free-text description
    ///
    /// Lines are split on `\r\n` (a bare `\n` works too), each line is split
    /// on `x`, and the first pair of adjacent numeric tokens wins.
    #[must_use]
    pub fn parse(description: &str) -> Option<Self> {
        description.lines().find_map(|line| {
            let tokens: Vec<&str> = line.split('x').map(str::trim).collect();
            tokens.windows(2).find_map(|pair| {
                let chainring = pair[0].parse::<u32>().ok()?;
                let cog = pair[1].parse::<u32>().ok()?;
                Self::new(chainring, cog)
            })
        })
    }

    /// Gear reduction (chainring / cog)
    #[must_use]
    pub fn reduction(self) -> f64 {
        f64::from(self.chainring) / f64::from(self.cog)
    }
}

impl fmt::Display for GearRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.chainring, self.cog)
    }
}

/// Snapshot of a remote activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Platform activity id
    pub id: u64,
    /// Owning athlete id
    pub owner_id: u64,
    /// Platform type tag (`Ride`, `Run`, ...)
    pub activity_type: String,
    /// Title
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Indoor trainer flag
    pub trainer: bool,
    /// Commute flag
    pub commute: bool,
    /// Start time, RFC3339 UTC
    pub start_date: String,
    /// Present when the platform already has cadence for this activity
    pub average_cadence: Option<f64>,
    /// Ratio parsed from `description`
    pub gear_ratio: Option<GearRatio>,
}

impl Activity {
    /// Whether the type tag is one cadence synthesis supports
    #[must_use]
    pub fn is_cycling(&self) -> bool {
        CYCLING_ACTIVITY_TYPES.contains(&self.activity_type.as_str())
    }

    /// Whether the platform already reports cadence for this activity
    #[must_use]
    pub const fn has_cadence(&self) -> bool {
        self.average_cadence.is_some()
    }

    /// Populate `gear_ratio` from the description
    #[must_use]
    pub fn with_parsed_gear_ratio(mut self) -> Self {
        self.gear_ratio = self.description.as_deref().and_then(GearRatio::parse);
        self
    }
}
