// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Lobby operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all Lobby CRDs
pub const API_GROUP: &str = "lobby.firestoned.io";

/// API version for all Lobby CRDs
pub const API_VERSION: &str = "v1beta1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "lobby.firestoned.io/v1beta1";

/// Kind name for `BackendRecord` resource
pub const KIND_BACKEND_RECORD: &str = "BackendRecord";

/// Kind name for `LoadBalancerDriver` resource
pub const KIND_LOAD_BALANCER_DRIVER: &str = "LoadBalancerDriver";

// ============================================================================
// Finalizer Constants
// ============================================================================

/// Finalizer kept on a `BackendRecord` while deregistration is owed.
///
/// The parent controller adds this finalizer when it creates a record; the
/// backend reconciler removes it exactly once, after the driver confirmed
/// deregistration (or when the record never obtained an address).
pub const FINALIZER_DEREGISTER_BACKEND: &str = "lobby.firestoned.io/deregister-backend";

// ============================================================================
// Driver Resolution Constants
// ============================================================================

/// Name prefix marking a driver as system-provided.
///
/// Drivers whose name starts with this prefix are looked up in
/// [`SYSTEM_DRIVER_NAMESPACE`] instead of the record's own namespace.
pub const SYSTEM_DRIVER_PREFIX: &str = "lobby-";

/// Namespace holding system-provided drivers
pub const SYSTEM_DRIVER_NAMESPACE: &str = "kube-system";

// ============================================================================
// Webhook Protocol Constants
// ============================================================================

/// Hook name for backend address generation
pub const WEBHOOK_GENERATE_BACKEND_ADDR: &str = "generateBackendAddr";

/// Hook name for backend registration
pub const WEBHOOK_ENSURE_BACKEND: &str = "ensureBackend";

/// Hook name for backend deregistration
pub const WEBHOOK_DEREG_BACKEND: &str = "deregBackend";

/// Timeout applied to a webhook call when the driver spec declares none (10 seconds)
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Length of the random `retryID` attached to every webhook attempt
pub const RETRY_ID_LEN: usize = 16;

// ============================================================================
// Reconciliation Timing Constants
// ============================================================================

/// Lower bound for driver-suggested retry delays (10 seconds).
///
/// A driver may answer `Fail`/`Running` with `minRetryDelayInSeconds`; the
/// effective requeue delay is never shorter than this floor.
pub const RETRY_INTERVAL_FLOOR_SECS: u64 = 10;

/// Default period between steady-state re-ensure calls (1 minute).
///
/// Used when `ensurePolicy.policy` is `Always`; `ensurePolicy.minPeriod`
/// can only lengthen the cadence, never shorten it below this default.
pub const DEFAULT_ENSURE_PERIOD_SECS: u64 = 60;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Status Condition Constants
// ============================================================================

/// Condition type tracking whether the backend is registered with its load balancer
pub const CONDITION_BACKEND_REGISTERED: &str = "BackendRegistered";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;
