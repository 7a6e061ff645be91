// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Duration parsing for Go-style duration strings.
//!
//! CRD fields that carry a duration (`ensurePolicy.minPeriod`, the per-hook
//! webhook `timeout`) use the Go `metav1.Duration` string form, e.g. `"30s"`,
//! `"5m"`, `"1h"`. This module parses that form into a Rust
//! `std::time::Duration`.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;

/// Parse a Go-style duration string into a Rust `Duration`.
///
/// Supported units:
/// - `s` (seconds): "30s"
/// - `m` (minutes): "5m"
/// - `h` (hours): "1h"
///
/// # Examples
///
/// ```
/// use lobby::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
///
/// // Invalid formats return errors
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("10").is_err());  // Missing unit
/// assert!(parse_duration("10d").is_err()); // Unsupported unit
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, the value is not a non-negative
/// integer, or the unit is missing or unsupported.
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    if duration_str.is_empty() {
        bail!("duration string cannot be empty");
    }

    // Find where digits end and the unit begins
    let split_pos = duration_str
        .chars()
        .position(|c| !c.is_ascii_digit())
        .context("duration must end with a unit (s, m, or h)")?;

    let (value_str, unit) = duration_str.split_at(split_pos);
    let value: u64 = value_str
        .parse()
        .with_context(|| format!("invalid duration value in {duration_str:?}"))?;

    let seconds = match unit {
        "s" => value,
        "m" => value * SECONDS_PER_MINUTE,
        "h" => value * SECONDS_PER_HOUR,
        _ => bail!("unsupported duration unit {unit:?} in {duration_str:?} (expected s, m, or h)"),
    };

    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod duration_tests;
