// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for load-balancer backend management.
//!
//! This module defines the Kubernetes Custom Resource Definitions used by Lobby
//! to register backends into pluggable load balancers declaratively.
//!
//! # Resource Types
//!
//! - [`BackendRecord`] - One backend endpoint to be registered into one load balancer
//! - [`LoadBalancerDriver`] - An external webhook service that talks to a real load balancer
//!
//! A `BackendRecord` names its driver and carries exactly one backend source:
//! a pod, a service reachable through a node, or a literal static address.
//! The reconciler materialises the source into a backend address through the
//! driver's `generateBackendAddr` hook, keeps the backend registered through
//! `ensureBackend`, and deregisters it through `deregBackend` before the
//! record is allowed to leave the cluster.
//!
//! # Example: Registering a static address
//!
//! ```rust,no_run
//! use lobby::crd::BackendRecordSpec;
//! use std::collections::BTreeMap;
//!
//! let mut lb_info = BTreeMap::new();
//! lb_info.insert("lbID".to_string(), "lb-12345678".to_string());
//!
//! let spec = BackendRecordSpec {
//!     lb_driver: "lobby-clb-driver".to_string(),
//!     lb_info,
//!     static_addr: Some("10.0.0.1:80".to_string()),
//!     ..Default::default()
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::constants::DEFAULT_WEBHOOK_TIMEOUT_SECS;
use crate::duration::parse_duration;

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// The aspect of the resource being reported (e.g., "BackendRegistered")
    pub r#type: String,

    /// The status: "True", "False", or "Unknown"
    pub status: String,

    /// A programmatic identifier in CamelCase (e.g., "OperationFailed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// A human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC3339 timestamp of the last status transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Pod-backed backend source: the driver derives the address from a pod.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodBackendInfo {
    /// Name of the pod, looked up in the record's namespace
    pub name: String,

    /// Container port the backend serves on
    pub port: i32,
}

/// Service-backed backend source: the driver derives the address from a
/// service exposed through a specific node.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBackendInfo {
    /// Name of the service, looked up in the record's namespace
    pub name: String,

    /// Service port the backend serves on
    pub port: i32,

    /// Name of the node whose addresses the driver should use
    pub node_name: String,
}

/// How often a registered backend is re-ensured against its driver.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum EnsurePolicyType {
    /// Re-ensure only while the backend is not yet registered (default behavior)
    IfNotReady,

    /// Re-ensure on a fixed cadence even after successful registration
    Always,
}

/// Re-ensure policy for a registered backend.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnsurePolicy {
    /// When to re-ensure the backend
    pub policy: EnsurePolicyType,

    /// Minimum period between re-ensure calls, as a Go-style duration
    /// string (e.g. "30s", "5m"). The effective cadence never drops below
    /// the built-in default period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_period: Option<String>,
}

/// Specification of a [`BackendRecord`].
///
/// Exactly one of `pod_backend_info`, `service_backend_info`, `static_addr`
/// must be set; admission owns that validation, the reconciler only rejects
/// records where none is set.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "lobby.firestoned.io",
    version = "v1beta1",
    kind = "BackendRecord",
    namespaced,
    status = "BackendRecordStatus",
    shortname = "br"
)]
#[serde(rename_all = "camelCase")]
pub struct BackendRecordSpec {
    /// Name of the [`LoadBalancerDriver`] that owns this backend.
    ///
    /// Names starting with the system prefix resolve in the system
    /// namespace, all others in the record's own namespace.
    pub lb_driver: String,

    /// Opaque driver-scoped identity of the target load balancer, passed
    /// verbatim to the driver. Together with the backend address it
    /// uniquely identifies a registration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lb_info: BTreeMap<String, String>,

    /// Opaque load-balancer attributes forwarded to `generateBackendAddr`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lb_attributes: BTreeMap<String, String>,

    /// Opaque parameters forwarded to `ensureBackend` and `deregBackend`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,

    /// Pod backend source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_backend_info: Option<PodBackendInfo>,

    /// Service backend source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_backend_info: Option<ServiceBackendInfo>,

    /// Static backend source: the literal backend address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_addr: Option<String>,

    /// Optional re-ensure policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ensure_policy: Option<EnsurePolicy>,
}

/// Status of a [`BackendRecord`].
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendRecordStatus {
    /// Backend address generated by the driver. Empty until generation
    /// succeeds, then stable for the lifetime of the record.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backend_addr: String,

    /// Opaque blob the driver returned on `ensureBackend`, echoed back on
    /// every subsequent ensure/deregister call (e.g. a listener handle).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub injected_info: BTreeMap<String, String>,

    /// Status conditions; the reconciler maintains `BackendRegistered`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl BackendRecord {
    /// The generated backend address, or `""` while generation is pending.
    #[must_use]
    pub fn backend_addr(&self) -> &str {
        self.status
            .as_ref()
            .map_or("", |status| status.backend_addr.as_str())
    }
}

/// Per-hook configuration of a driver webhook.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverWebhook {
    /// Hook name (e.g. "generateBackendAddr")
    pub name: String,

    /// Call timeout as a Go-style duration string (e.g. "10s"). Falls back
    /// to the built-in default when absent or unparsable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Specification of a [`LoadBalancerDriver`].
///
/// A driver is an external HTTP service implementing the webhook protocol;
/// it is the only component that talks to a real load balancer. The
/// reconciler treats everything beyond `url` and `webhooks` as opaque.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "lobby.firestoned.io",
    version = "v1beta1",
    kind = "LoadBalancerDriver",
    namespaced,
    shortname = "lbdriver"
)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerDriverSpec {
    /// Driver type, opaque pass-through (the webhook protocol is the only
    /// supported transport today)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub driver_type: String,

    /// HTTPS base URL of the driver; hook names are appended as path suffixes
    pub url: String,

    /// Per-hook configuration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhooks: Vec<DriverWebhook>,
}

impl LoadBalancerDriver {
    /// Timeout to apply when calling the named hook on this driver.
    ///
    /// Uses the per-hook `timeout` from the driver spec when present and
    /// parsable, otherwise the built-in default.
    #[must_use]
    pub fn webhook_timeout(&self, hook_name: &str) -> Duration {
        self.spec
            .webhooks
            .iter()
            .find(|hook| hook.name == hook_name)
            .and_then(|hook| hook.timeout.as_deref())
            .and_then(|timeout| parse_duration(timeout).ok())
            .unwrap_or(Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS))
    }
}
