// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process-wide registry of backends whose deregistration is in flight.
//!
//! Two different records can describe the same `(lbInfo, backendAddr)`
//! registration, typically when a record is deleted and recreated. The
//! driver must never observe the new record's `ensureBackend` before the
//! old record's `deregBackend` finished, so the deregister path registers
//! its address here before calling the driver and the ensure path checks
//! the registry before calling the driver.
//!
//! The registry is process-local and best-effort: it starts empty after a
//! restart, and the first reconcile of any deleting record re-inserts its
//! entry before calling the driver.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use kube::ResourceExt;

use crate::crd::BackendRecord;

/// Concurrency-safe map `"lbInfo|backendAddr" -> record name`.
///
/// Cloning shares the underlying map; all operations are O(1) and atomic.
/// No compound transactions are needed since every reader tolerates racy
/// absence (it simply proceeds to call the driver).
#[derive(Clone, Default)]
pub struct DeletingBackends {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl DeletingBackends {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `backend`'s address is mid-deregistration.
    pub fn put(&self, backend: &BackendRecord) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(registry_key(backend), backend.name_any());
    }

    /// Drop the entry for `backend`'s address.
    pub fn remove(&self, backend: &BackendRecord) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(&registry_key(backend));
    }

    /// Name of the record currently deregistering `backend`'s address,
    /// if any.
    #[must_use]
    pub fn lookup(&self, backend: &BackendRecord) -> Option<String> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&registry_key(backend)).cloned()
    }
}

/// Registry key for a record: its load-balancer identity joined with its
/// backend address. `lbInfo` is a sorted map, so the rendering is
/// deterministic across records that carry the same identity.
fn registry_key(backend: &BackendRecord) -> String {
    let lb_info = backend
        .spec
        .lb_info
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{lb_info}|{}", backend.backend_addr())
}

#[cfg(test)]
#[path = "deleting_tests.rs"]
mod deleting_tests;
