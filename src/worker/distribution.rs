// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Spreading of worker pool scaling bounds over zones.
//!
//! A pool with `n` zones gets one machine deployment per zone. Each bound of the
//! pool (minimum, maximum, surge, unavailability) is split so that the shares of
//! all zones add up to the pool-wide value and earlier zones absorb the remainder.
//!
//! # Example
//!
//! ```rust
//! use kubevirt_worker::worker::distribution::distribute_over_zones;
//!
//! let shares: Vec<i32> = (0..3).map(|zone| distribute_over_zones(zone, 7, 3)).collect();
//! assert_eq!(shares, vec![3, 2, 2]);
//! ```

use crate::errors::{Error, Result};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Returns the share of `total` assigned to the zone at `zone_index`.
///
/// Computed as `total / zone_count`, plus one for the first `total % zone_count`
/// zones. Negative totals and non-positive zone counts yield 0.
#[must_use]
pub fn distribute_over_zones(zone_index: i32, total: i32, zone_count: i32) -> i32 {
    if zone_count <= 0 || total <= 0 {
        return 0;
    }
    let base = total / zone_count;
    if zone_index < total % zone_count {
        base + 1
    } else {
        base
    }
}

/// Returns the share of an absolute or percentage bound assigned to a zone.
///
/// A percentage is first resolved against `reference` (rounded down) and the
/// resulting integer is then spread like [`distribute_over_zones`].
///
/// # Errors
///
/// Returns [`Error::Distribution`] if a string value is not a percentage such as `"25%"`.
pub fn distribute_positive_int_or_percent(
    zone_index: i32,
    value: &IntOrString,
    zone_count: i32,
    reference: i32,
) -> Result<i32> {
    let total = match value {
        IntOrString::Int(total) => *total,
        IntOrString::String(percent) => resolve_percentage(percent, reference)?,
    };
    Ok(distribute_over_zones(zone_index, total, zone_count))
}

/// Resolves `"p%"` against `reference` as `floor(reference * p / 100)`.
fn resolve_percentage(value: &str, reference: i32) -> Result<i32> {
    let invalid = |reason: &str| Error::Distribution {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let digits = value
        .trim()
        .strip_suffix('%')
        .ok_or_else(|| invalid("expected an integer or a percentage"))?;
    let percent: i64 = digits
        .parse()
        .map_err(|_| invalid("percentage is not an integer"))?;

    let resolved = i64::from(reference)
        .checked_mul(percent)
        .ok_or_else(|| invalid("resolved value overflows"))?
        .div_euclid(100);
    i32::try_from(resolved).map_err(|_| invalid("resolved value overflows"))
}

#[cfg(test)]
#[path = "distribution_tests.rs"]
mod distribution_tests;
