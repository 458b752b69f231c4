// ABOUTME: Cadence derivation from cumulative distance samples and drivetrain gearing
// ABOUTME: Pure per-sample computation with no smoothing; output length matches input length
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! # Cadence derivation
//!
//! For a fixed-gear or single-speed drivetrain, crank revolutions follow
//! directly from distance travelled:
//!
//! ```text
//! rpm = increment * 60 / (PI * (wheel + 2 * tire) / 1000 * (chainring / cog))
//! ```
//!
//! where `increment` is the distance covered since the previous sample (the
//! first sample is measured from zero). Each sample is truncated toward zero.
//! Decreasing distance produces negative values; they are passed through.

use std::f64::consts::PI;

use crate::constants::geometry::{
    DEFAULT_TIRE_WIDTH_MM, DEFAULT_WHEEL_DIAMETER_MM, MM_PER_METER, SECONDS_PER_MINUTE,
};
use crate::errors::CadenceError;
use crate::models::GearRatio;

/// Wheel geometry used to turn distance into wheel revolutions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceParams {
    /// Rim bead seat diameter in millimetres (622 for 700c)
    pub wheel_diameter_mm: f64,
    /// Tire width in millimetres
    pub tire_width_mm: f64,
}

impl Default for CadenceParams {
    fn default() -> Self {
        Self {
            wheel_diameter_mm: DEFAULT_WHEEL_DIAMETER_MM,
            tire_width_mm: DEFAULT_TIRE_WIDTH_MM,
        }
    }
}

impl CadenceParams {
    /// Rolling circumference in metres
    #[must_use]
    pub fn circumference_m(&self) -> f64 {
        PI * 2.0f64.mul_add(self.tire_width_mm, self.wheel_diameter_mm) / MM_PER_METER
    }
}

/// Derive one cadence sample per distance sample
///
/// # Errors
///
/// Returns [`CadenceError::InvalidGearRatio`] if either tooth count is zero
pub fn derive_cadence(
    distances: &[f64],
    chainring: u32,
    cog: u32,
    params: &CadenceParams,
) -> Result<Vec<i32>, CadenceError> {
    let ratio =
        GearRatio::new(chainring, cog).ok_or(CadenceError::InvalidGearRatio { chainring, cog })?;
    Ok(derive_for_ratio(distances, ratio, params))
}

/// Derive cadence for an already-validated ratio
#[must_use]
pub fn derive_for_ratio(distances: &[f64], ratio: GearRatio, params: &CadenceParams) -> Vec<i32> {
    let metres_per_crank_rev = params.circumference_m() * ratio.reduction();

    let mut last = 0.0;
    distances
        .iter()
        .map(|&distance| {
            let increment = distance - last;
            last = distance;
            (increment * SECONDS_PER_MINUTE / metres_per_crank_rev) as i32
        })
        .collect()
}
