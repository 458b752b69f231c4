// ABOUTME: Integration tests for cadence derivation from distance samples
// ABOUTME: Checks known gearing values, length preservation, and ratio validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use cadecalc::cadence::{derive_cadence, derive_for_ratio, CadenceParams};
use cadecalc::errors::CadenceError;
use cadecalc::models::GearRatio;

#[test]
fn test_hundred_metres_on_48x16() {
    let cadence = derive_cadence(&[100.0], 48, 16, &CadenceParams::default()).unwrap();
    assert_eq!(cadence, vec![947]);
}

#[test]
fn test_output_length_matches_input() {
    let distances: Vec<f64> = (1..=600).map(|i| f64::from(i) * 4.2).collect();
    let cadence = derive_cadence(&distances, 42, 17, &CadenceParams::default()).unwrap();
    assert_eq!(cadence.len(), distances.len());
}

#[test]
fn test_empty_input_yields_empty_output() {
    let cadence = derive_cadence(&[], 48, 16, &CadenceParams::default()).unwrap();
    assert!(cadence.is_empty());
}

#[test]
fn test_constant_speed_gives_constant_cadence() {
    let distances = [5.0, 10.0, 15.0, 20.0];
    let cadence = derive_cadence(&distances, 48, 16, &CadenceParams::default()).unwrap();
    assert_eq!(cadence, vec![47, 47, 47, 47]);
}

#[test]
fn test_stationary_samples_are_zero() {
    let cadence = derive_cadence(&[0.0, 0.0, 3.0, 3.0], 48, 16, &CadenceParams::default()).unwrap();
    assert_eq!(cadence[0], 0);
    assert_eq!(cadence[1], 0);
    assert_eq!(cadence[3], 0);
}

#[test]
fn test_decreasing_distance_truncates_toward_zero() {
    let cadence = derive_cadence(&[10.0, 5.0], 48, 16, &CadenceParams::default()).unwrap();
    assert_eq!(cadence, vec![94, -47]);
}

#[test]
fn test_zero_cog_is_rejected() {
    let err = derive_cadence(&[100.0], 48, 0, &CadenceParams::default()).unwrap_err();
    assert_eq!(
        err,
        CadenceError::InvalidGearRatio {
            chainring: 48,
            cog: 0
        }
    );
}

#[test]
fn test_zero_chainring_is_rejected() {
    assert!(derive_cadence(&[100.0], 0, 16, &CadenceParams::default()).is_err());
}

#[test]
fn test_wheel_geometry_is_configurable() {
    let params = CadenceParams {
        wheel_diameter_mm: 584.0,
        tire_width_mm: 0.0,
    };
    let ratio = GearRatio::new(16, 16).unwrap();
    assert_eq!(derive_for_ratio(&[100.0], ratio, &params), vec![3270]);
}

#[test]
fn test_smaller_cog_lowers_cadence() {
    let params = CadenceParams::default();
    let easy = derive_cadence(&[100.0], 48, 18, &params).unwrap();
    let hard = derive_cadence(&[100.0], 48, 14, &params).unwrap();
    assert!(hard[0] < easy[0]);
}
