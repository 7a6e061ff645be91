// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer list helpers for the deregistration discipline.
//!
//! The parent controller adds the deregister finalizer when it creates a
//! `BackendRecord`; this reconciler only ever checks for it and strips it.
//! These helpers are pure so the surrounding update logic stays testable.

/// Whether `finalizer` is present in the list.
#[must_use]
pub fn has_finalizer(finalizers: &[String], finalizer: &str) -> bool {
    finalizers.iter().any(|present| present == finalizer)
}

/// A copy of the list with every occurrence of `finalizer` removed.
#[must_use]
pub fn remove_finalizer(finalizers: &[String], finalizer: &str) -> Vec<String> {
    finalizers
        .iter()
        .filter(|present| *present != finalizer)
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
