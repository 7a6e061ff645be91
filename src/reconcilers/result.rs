// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation verdicts and retry-interval computation.
//!
//! Every reconcile tick produces exactly one [`SyncResult`], which the
//! controller loop translates into a work-queue decision: drop the key,
//! requeue with backoff, or requeue after a driver-suggested delay.

use std::time::Duration;

use crate::constants::{DEFAULT_ENSURE_PERIOD_SECS, RETRY_INTERVAL_FLOOR_SECS};
use crate::crd::EnsurePolicy;
use crate::duration::parse_duration;

/// Outcome of one reconcile tick.
#[derive(Debug)]
pub enum SyncResult {
    /// The record converged; no requeue.
    Success,

    /// Something unexpected failed; requeue with rate-limited exponential
    /// backoff and log the error.
    Error(anyhow::Error),

    /// The driver reported failure and suggested when to retry; requeue
    /// after at least the delay, with no further backoff multiplier.
    Fail(Duration),

    /// The operation is still in progress remotely; requeue after at
    /// least the delay.
    Async(Duration),

    /// Steady-state re-ensure: schedule the next reconcile this far from now.
    Periodic(Duration),
}

/// Compute the requeue delay from a driver-supplied retry hint.
///
/// The hint may be absent, zero, or negative; the result is never shorter
/// than the built-in floor.
#[must_use]
pub fn calculate_retry_interval(min_retry_delay_seconds: Option<i32>) -> Duration {
    let requested = u64::try_from(min_retry_delay_seconds.unwrap_or(0)).unwrap_or(0);
    Duration::from_secs(requested.max(RETRY_INTERVAL_FLOOR_SECS))
}

/// Compute the steady-state re-ensure cadence from a record's policy.
///
/// `minPeriod` can only lengthen the cadence; absent, unparsable, or short
/// values yield the default period.
#[must_use]
pub fn ensure_period(policy: Option<&EnsurePolicy>) -> Duration {
    let requested = policy
        .and_then(|policy| policy.min_period.as_deref())
        .and_then(|period| parse_duration(period).ok())
        .unwrap_or(Duration::ZERO);
    requested.max(Duration::from_secs(DEFAULT_ENSURE_PERIOD_SECS))
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod result_tests;
