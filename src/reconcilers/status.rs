// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `BackendRecord`.
//!
//! Conditions follow the standard Kubernetes format: `type`, `status`
//! ("True"/"False"/"Unknown"), a CamelCase `reason`, a human `message`, and
//! an RFC3339 `lastTransitionTime` that only moves when the status value
//! actually changes.

use chrono::Utc;

use crate::crd::{BackendRecordStatus, Condition};

/// Create a new condition with the current timestamp.
#[must_use]
pub fn new_condition(
    condition_type: &str,
    status: &str,
    reason: Option<&str>,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: reason.map(ToString::to_string),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Insert or replace a condition by type.
///
/// When a condition of the same type already exists with the same status
/// value, its `lastTransitionTime` is preserved; every other field is
/// replaced.
pub fn upsert_condition(status: &mut BackendRecordStatus, mut condition: Condition) {
    if let Some(existing) = status
        .conditions
        .iter_mut()
        .find(|existing| existing.r#type == condition.r#type)
    {
        if existing.status == condition.status {
            condition.last_transition_time = existing.last_transition_time.clone();
        }
        *existing = condition;
    } else {
        status.conditions.push(condition);
    }
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions
        .iter()
        .find(|condition| condition.r#type == condition_type)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
