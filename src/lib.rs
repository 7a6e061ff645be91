// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Lobby - Load Balancer Control Framework for Kubernetes
//!
//! Lobby is a Kubernetes controller written in Rust that registers backend
//! endpoints into external load balancers through pluggable webhook drivers.
//!
//! ## Overview
//!
//! A driver is an HTTP service implementing a small webhook protocol; it is
//! the only component that talks to a real load balancer. Lobby reconciles
//! declarative `BackendRecord` objects against that protocol:
//!
//! 1. **Generate** - materialise a backend address from the record's source
//!    (a pod, a service reachable through a node, or a static literal).
//! 2. **Ensure** - register the address with the load balancer and keep it
//!    registered, optionally on a fixed cadence.
//! 3. **Deregister** - on deletion, drive the driver until it confirms
//!    removal, then release the record's finalizer.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`webhooks`] - Driver webhook protocol and invocation
//! - [`reconcilers`] - The `BackendRecord` reconciliation state machine
//! - [`context`] - Shared controller context with reflector stores
//!
//! ## Example
//!
//! ```rust,no_run
//! use lobby::crd::{BackendRecordSpec, PodBackendInfo};
//! use std::collections::BTreeMap;
//!
//! let mut lb_info = BTreeMap::new();
//! lb_info.insert("lbID".to_string(), "lb-12345678".to_string());
//!
//! let spec = BackendRecordSpec {
//!     lb_driver: "lobby-clb-driver".to_string(),
//!     lb_info,
//!     pod_backend_info: Some(PodBackendInfo {
//!         name: "web-0".to_string(),
//!         port: 8080,
//!     }),
//!     ..Default::default()
//! };
//! ```

pub mod constants;
pub mod context;
pub mod crd;
pub mod duration;
pub mod event_reasons;
pub mod reconcilers;
pub mod webhooks;

#[cfg(test)]
mod crd_tests;
