// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Event and condition reason strings emitted during backend reconciliation.
//!
//! Reasons are programmatic identifiers in CamelCase. Every driver-facing
//! operation has four outcomes (success, failure, still running, invalid
//! driver reply) and each outcome maps to exactly one reason tag so that
//! `kubectl get events` output stays greppable.

// ============================================================================
// generateBackendAddr
// ============================================================================

/// Address generation succeeded; the record now has its permanent address.
pub const REASON_SUCC_GENERATE_ADDR: &str = "SuccGenerateAddr";

/// The driver answered `Fail` to `generateBackendAddr`, or the status
/// write-back for a generated address failed.
pub const REASON_FAILED_GENERATE_ADDR: &str = "FailedGenerateAddr";

/// The driver is still generating the address asynchronously.
pub const REASON_RUNNING_GENERATE_ADDR: &str = "RunningGenerateAddr";

/// The driver reply to `generateBackendAddr` violated the webhook protocol.
pub const REASON_INVALID_GENERATE_ADDR: &str = "InvalidGenerateAddr";

// ============================================================================
// ensureBackend
// ============================================================================

/// The backend is registered with its load balancer.
pub const REASON_SUCC_ENSURE_BACKEND: &str = "SuccEnsureBackend";

/// The driver answered `Fail` to `ensureBackend`, or the status write-back
/// after an ensure call failed.
pub const REASON_FAILED_ENSURE_BACKEND: &str = "FailedEnsureBackend";

/// The driver is still registering the backend asynchronously.
pub const REASON_RUNNING_ENSURE_BACKEND: &str = "RunningEnsureBackend";

/// The driver reply to `ensureBackend` violated the webhook protocol.
pub const REASON_INVALID_ENSURE_BACKEND: &str = "InvalidEnsureBackend";

/// Registration is postponed because another record with the same
/// load-balancer identity and address is mid-deregistration.
pub const REASON_DELAYED_ENSURE_BACKEND: &str = "DelayedEnsureBackend";

// ============================================================================
// deregBackend
// ============================================================================

/// The driver answered `Fail` to `deregBackend`.
pub const REASON_FAILED_DEREGISTER: &str = "FailedDeregister";

/// The driver is still deregistering the backend asynchronously.
pub const REASON_RUNNING_DEREGISTER: &str = "RunningDeregister";

/// The driver reply to `deregBackend` violated the webhook protocol.
pub const REASON_INVALID_DEREGISTER: &str = "InvalidDeregister";

// ============================================================================
// Condition Reasons
// ============================================================================

/// Condition reason set on `BackendRegistered=False` when the driver
/// reported an operation failure.
pub const REASON_OPERATION_FAILED: &str = "OperationFailed";
