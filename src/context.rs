// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the backend controller with reflector stores.
//!
//! The reconciler receives an `Arc<Context>` that contains:
//! - Kubernetes client for status writes, finalizer updates and events
//! - Reflector stores for every resource the reconciler reads
//! - The driver webhook invoker
//! - The process-wide in-flight-delete registry
//!
//! The stores enable O(1) in-memory lookups, so a reconcile tick never
//! lists against the API server.

use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::runtime::reflector::Store;
use kube::{Client, ResourceExt};
use std::sync::Arc;

use crate::crd::{BackendRecord, LoadBalancerDriver};
use crate::reconcilers::deleting::DeletingBackends;
use crate::webhooks::WebhookInvoker;

/// Shared context passed to the backend controller.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Reflector stores for all resource types the reconciler reads
    pub stores: Stores,

    /// Driver webhook invoker (HTTP in production, fake in tests)
    pub invoker: Arc<dyn WebhookInvoker>,

    /// Process-wide registry of backends whose deregistration is in flight
    pub deleting: DeletingBackends,
}

/// Collection of all reflector stores consumed by the reconciler.
///
/// Each store is populated by a dedicated reflector task and provides
/// in-memory access to resources without API calls.
#[derive(Clone)]
pub struct Stores {
    pub backend_records: Store<BackendRecord>,
    pub drivers: Store<LoadBalancerDriver>,
    pub pods: Store<Pod>,
    pub services: Store<Service>,
    pub nodes: Store<Node>,
}

impl Stores {
    /// Get a `BackendRecord` by name and namespace from the store.
    #[must_use]
    pub fn get_backend_record(&self, name: &str, namespace: &str) -> Option<Arc<BackendRecord>> {
        self.backend_records
            .state()
            .iter()
            .find(|record| {
                record.name_any() == name && record.namespace().as_deref() == Some(namespace)
            })
            .cloned()
    }

    /// Get a `LoadBalancerDriver` by name and namespace from the store.
    #[must_use]
    pub fn get_driver(&self, name: &str, namespace: &str) -> Option<Arc<LoadBalancerDriver>> {
        self.drivers
            .state()
            .iter()
            .find(|driver| {
                driver.name_any() == name && driver.namespace().as_deref() == Some(namespace)
            })
            .cloned()
    }

    /// Get a `Pod` by name and namespace from the store.
    #[must_use]
    pub fn get_pod(&self, name: &str, namespace: &str) -> Option<Arc<Pod>> {
        self.pods
            .state()
            .iter()
            .find(|pod| {
                pod.metadata.name.as_deref() == Some(name)
                    && pod.metadata.namespace.as_deref() == Some(namespace)
            })
            .cloned()
    }

    /// Get a `Service` by name and namespace from the store.
    #[must_use]
    pub fn get_service(&self, name: &str, namespace: &str) -> Option<Arc<Service>> {
        self.services
            .state()
            .iter()
            .find(|service| {
                service.metadata.name.as_deref() == Some(name)
                    && service.metadata.namespace.as_deref() == Some(namespace)
            })
            .cloned()
    }

    /// Get a `Node` by name from the store. Nodes are cluster-scoped.
    #[must_use]
    pub fn get_node(&self, name: &str) -> Option<Arc<Node>> {
        self.nodes
            .state()
            .iter()
            .find(|node| node.metadata.name.as_deref() == Some(name))
            .cloned()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
