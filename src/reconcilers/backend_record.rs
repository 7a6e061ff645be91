// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `BackendRecord` reconciliation state machine.
//!
//! One reconcile tick maps a record's desired state plus observed status
//! plus the driver's replies to a status mutation, an emitted event, and a
//! [`SyncResult`] verdict:
//!
//! ```text
//! Load record by key.
//!     not found                  -> Success      (tombstone; queue drops)
//!     deletion timestamp set:
//!         finalizer absent       -> Success
//!         finalizer present      -> deregister path
//!     deletion timestamp unset:
//!         status.backendAddr ""  -> generate path
//!         otherwise              -> ensure path
//! ```
//!
//! The generate path dispatches on the record's backend source (pod,
//! service+node, static literal), the ensure path keeps the backend
//! registered and re-registers on a cadence when the record asks for it,
//! and the deregister path drives the driver until it confirms removal,
//! then strips the finalizer. A process-wide registry orders deregister
//! before ensure for records sharing one `(lbInfo, backendAddr)`.

use anyhow::{anyhow, Context as _, Result};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::{
    CONDITION_BACKEND_REGISTERED, FINALIZER_DEREGISTER_BACKEND, SYSTEM_DRIVER_NAMESPACE,
    SYSTEM_DRIVER_PREFIX,
};
use crate::context::Context;
use crate::crd::{
    BackendRecord, EnsurePolicyType, LoadBalancerDriver, PodBackendInfo, ServiceBackendInfo,
};
use crate::event_reasons::{
    REASON_DELAYED_ENSURE_BACKEND, REASON_FAILED_DEREGISTER, REASON_FAILED_ENSURE_BACKEND,
    REASON_FAILED_GENERATE_ADDR, REASON_INVALID_DEREGISTER, REASON_INVALID_ENSURE_BACKEND,
    REASON_INVALID_GENERATE_ADDR, REASON_OPERATION_FAILED, REASON_RUNNING_DEREGISTER,
    REASON_RUNNING_ENSURE_BACKEND, REASON_RUNNING_GENERATE_ADDR, REASON_SUCC_ENSURE_BACKEND,
    REASON_SUCC_GENERATE_ADDR,
};
use crate::webhooks::{
    new_retry_id, BackendOperationRequest, GenerateBackendAddrRequest, GenerateBackendAddrResponse,
    PodBackendInGenerateAddrRequest, ServiceBackendInGenerateAddrRequest, STATUS_FAIL, STATUS_RUNNING,
    STATUS_SUCC,
};

use super::events::create_event;
use super::finalizers::{has_finalizer, remove_finalizer};
use super::result::{calculate_retry_interval, ensure_period, SyncResult};
use super::status::{new_condition, upsert_condition};

/// Reconcile one `BackendRecord` identified by namespace and name.
///
/// Loads the record from the reflector store and runs the state machine.
/// A record that no longer exists yields `Success` so the queue drops the
/// key.
pub async fn sync_backend_record(ctx: &Context, namespace: &str, name: &str) -> SyncResult {
    let Some(backend) = ctx.stores.get_backend_record(name, namespace) else {
        debug!("BackendRecord {}/{} is gone, nothing to do", namespace, name);
        return SyncResult::Success;
    };
    let backend = &*backend;

    info!("Reconciling BackendRecord: {}/{}", namespace, name);

    if backend.metadata.deletion_timestamp.is_some() {
        if !has_finalizer(backend.finalizers(), FINALIZER_DEREGISTER_BACKEND) {
            return SyncResult::Success;
        }
        return deregister_backend(ctx, backend).await;
    }

    if backend.backend_addr().is_empty() {
        generate_backend_addr(ctx, backend).await
    } else {
        ensure_backend(ctx, backend).await
    }
}

/// Generate path: materialise the backend address through the driver and
/// persist it. The address is written exactly once; later ticks take the
/// ensure path.
async fn generate_backend_addr(ctx: &Context, backend: &BackendRecord) -> SyncResult {
    let driver = match resolve_driver(ctx, backend) {
        Ok(driver) => driver,
        Err(err) => return SyncResult::Error(err),
    };

    let rsp = if let Some(info) = &backend.spec.pod_backend_info {
        match generate_pod_addr(ctx, backend, &driver, info).await {
            Ok(rsp) => rsp,
            Err(err) => return SyncResult::Error(err),
        }
    } else if let Some(info) = &backend.spec.service_backend_info {
        match generate_service_addr(ctx, backend, &driver, info).await {
            Ok(rsp) => rsp,
            Err(err) => return SyncResult::Error(err),
        }
    } else if let Some(addr) = &backend.spec.static_addr {
        generate_static_addr(addr)
    } else {
        return SyncResult::Error(anyhow!(
            "BackendRecord {}/{} sets none of podBackendInfo, serviceBackendInfo, staticAddr",
            backend.namespace().unwrap_or_default(),
            backend.name_any()
        ));
    };

    match rsp.status.as_str() {
        STATUS_SUCC => {
            if rsp.backend_addr.is_empty() {
                let message = "generateBackendAddr returned Succ with an empty backendAddr";
                create_event(&ctx.client, backend, "Warning", REASON_INVALID_GENERATE_ADDR, message)
                    .await;
                return SyncResult::Error(anyhow!(
                    "driver {} answered Succ to generateBackendAddr with an empty backendAddr",
                    driver.name_any()
                ));
            }

            let mut cpy = backend.clone();
            cpy.status.get_or_insert_with(Default::default).backend_addr = rsp.backend_addr.clone();
            if let Err(err) = update_status(&ctx.client, &cpy).await {
                create_event(
                    &ctx.client,
                    backend,
                    "Warning",
                    REASON_FAILED_GENERATE_ADDR,
                    &format!("update status failed: {err}"),
                )
                .await;
                return SyncResult::Error(err);
            }
            create_event(
                &ctx.client,
                backend,
                "Normal",
                REASON_SUCC_GENERATE_ADDR,
                &format!("addr: {}", rsp.backend_addr),
            )
            .await;
            SyncResult::Success
        }
        STATUS_FAIL => {
            create_event(
                &ctx.client,
                backend,
                "Warning",
                REASON_FAILED_GENERATE_ADDR,
                &format!("msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Fail(calculate_retry_interval(rsp.min_retry_delay_in_seconds))
        }
        STATUS_RUNNING => {
            create_event(
                &ctx.client,
                backend,
                "Normal",
                REASON_RUNNING_GENERATE_ADDR,
                &format!("msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Async(calculate_retry_interval(rsp.min_retry_delay_in_seconds))
        }
        unknown => {
            create_event(
                &ctx.client,
                backend,
                "Warning",
                REASON_INVALID_GENERATE_ADDR,
                &format!("unsupported status: {unknown}, msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Error(anyhow!("unknown webhook status {unknown:?}"))
        }
    }
}

/// Ensure path: keep a generated backend registered with its driver.
#[allow(clippy::too_many_lines)]
async fn ensure_backend(ctx: &Context, backend: &BackendRecord) -> SyncResult {
    // Same-address ordering guard: never ensure an address another record
    // is still deregistering.
    if let Some(holder) = ctx.deleting.lookup(backend) {
        create_event(
            &ctx.client,
            backend,
            "Normal",
            REASON_DELAYED_ENSURE_BACKEND,
            &format!("ensureBackend will start once {holder} is finished"),
        )
        .await;
        return SyncResult::Async(calculate_retry_interval(None));
    }

    let driver = match resolve_driver(ctx, backend) {
        Ok(driver) => driver,
        Err(err) => return SyncResult::Error(err),
    };

    let req = backend_operation_request(backend, "ensureBackend");
    let rsp = match ctx.invoker.call_ensure_backend(&driver, &req).await {
        Ok(rsp) => rsp,
        Err(err) => return SyncResult::Error(err),
    };

    match rsp.status.as_str() {
        STATUS_SUCC => {
            let mut cpy = backend.clone();
            let status = cpy.status.get_or_insert_with(Default::default);
            if !rsp.injected_info.is_empty() {
                status.injected_info = rsp.injected_info.clone();
            }
            upsert_condition(
                status,
                new_condition(CONDITION_BACKEND_REGISTERED, "True", None, &rsp.msg),
            );
            if let Err(err) = update_status(&ctx.client, &cpy).await {
                create_event(
                    &ctx.client,
                    backend,
                    "Warning",
                    REASON_FAILED_ENSURE_BACKEND,
                    &format!("update status failed: {err}"),
                )
                .await;
                return SyncResult::Error(err);
            }
            create_event(
                &ctx.client,
                backend,
                "Normal",
                REASON_SUCC_ENSURE_BACKEND,
                "Successfully ensured backend",
            )
            .await;

            let always = backend
                .spec
                .ensure_policy
                .as_ref()
                .is_some_and(|policy| policy.policy == EnsurePolicyType::Always);
            if always {
                return SyncResult::Periodic(ensure_period(backend.spec.ensure_policy.as_ref()));
            }
            SyncResult::Success
        }
        STATUS_FAIL => {
            let mut cpy = backend.clone();
            upsert_condition(
                cpy.status.get_or_insert_with(Default::default),
                new_condition(
                    CONDITION_BACKEND_REGISTERED,
                    "False",
                    Some(REASON_OPERATION_FAILED),
                    &rsp.msg,
                ),
            );
            if let Err(err) = update_status(&ctx.client, &cpy).await {
                create_event(
                    &ctx.client,
                    backend,
                    "Warning",
                    REASON_FAILED_ENSURE_BACKEND,
                    &format!("update status failed: {err}"),
                )
                .await;
                return SyncResult::Error(err);
            }
            create_event(
                &ctx.client,
                backend,
                "Warning",
                REASON_FAILED_ENSURE_BACKEND,
                &format!("msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Fail(calculate_retry_interval(rsp.min_retry_delay_in_seconds))
        }
        STATUS_RUNNING => {
            create_event(
                &ctx.client,
                backend,
                "Normal",
                REASON_RUNNING_ENSURE_BACKEND,
                &format!("msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Async(calculate_retry_interval(rsp.min_retry_delay_in_seconds))
        }
        unknown => {
            create_event(
                &ctx.client,
                backend,
                "Warning",
                REASON_INVALID_ENSURE_BACKEND,
                &format!("unsupported status: {unknown}, msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Error(anyhow!("unknown webhook status {unknown:?}"))
        }
    }
}

/// Deregister path: drive `deregBackend` until the driver confirms, then
/// strip the finalizer. The in-flight registry entry is inserted before any
/// further work so concurrent same-address ensures observe the guard.
async fn deregister_backend(ctx: &Context, backend: &BackendRecord) -> SyncResult {
    ctx.deleting.put(backend);

    // A record that never obtained an address was never registered; skip
    // the driver and release it immediately.
    if backend.backend_addr().is_empty() {
        return remove_deregister_finalizer(ctx, backend).await;
    }

    let driver = match resolve_driver(ctx, backend) {
        Ok(driver) => driver,
        Err(err) => return SyncResult::Error(err),
    };

    let req = backend_operation_request(backend, "deregisterBackend");
    let rsp = match ctx.invoker.call_deregister_backend(&driver, &req).await {
        Ok(rsp) => rsp,
        Err(err) => return SyncResult::Error(err),
    };

    match rsp.status.as_str() {
        STATUS_SUCC => remove_deregister_finalizer(ctx, backend).await,
        STATUS_FAIL => {
            create_event(
                &ctx.client,
                backend,
                "Warning",
                REASON_FAILED_DEREGISTER,
                &format!("msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Fail(calculate_retry_interval(rsp.min_retry_delay_in_seconds))
        }
        STATUS_RUNNING => {
            create_event(
                &ctx.client,
                backend,
                "Normal",
                REASON_RUNNING_DEREGISTER,
                &format!("msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Async(calculate_retry_interval(rsp.min_retry_delay_in_seconds))
        }
        unknown => {
            create_event(
                &ctx.client,
                backend,
                "Warning",
                REASON_INVALID_DEREGISTER,
                &format!("unsupported status: {unknown}, msg: {}", rsp.msg),
            )
            .await;
            SyncResult::Error(anyhow!("unknown webhook status {unknown:?}"))
        }
    }
}

/// Strip the deregister finalizer with a full update, releasing the record
/// for physical deletion. The registry entry is cleared first; if the
/// update fails, the next reconcile re-inserts it before retrying.
async fn remove_deregister_finalizer(ctx: &Context, backend: &BackendRecord) -> SyncResult {
    ctx.deleting.remove(backend);

    let namespace = backend.namespace().unwrap_or_default();
    let name = backend.name_any();

    let mut cpy = backend.clone();
    cpy.metadata.finalizers = Some(remove_finalizer(
        backend.finalizers(),
        FINALIZER_DEREGISTER_BACKEND,
    ));

    let api: Api<BackendRecord> = Api::namespaced(ctx.client.clone(), &namespace);
    match api
        .replace(&name, &PostParams::default(), &cpy)
        .await
        .with_context(|| format!("removing finalizer from BackendRecord {namespace}/{name}"))
    {
        Ok(_) => {
            info!("Removed deregister finalizer from BackendRecord {}/{}", namespace, name);
            SyncResult::Success
        }
        Err(err) => SyncResult::Error(err),
    }
}

/// Namespace a driver is looked up in: system drivers live in the system
/// namespace, all others next to the record.
fn driver_namespace<'a>(lb_driver: &str, record_namespace: &'a str) -> &'a str {
    if lb_driver.starts_with(SYSTEM_DRIVER_PREFIX) {
        SYSTEM_DRIVER_NAMESPACE
    } else {
        record_namespace
    }
}

/// Resolve the record's driver from the reflector store.
fn resolve_driver(ctx: &Context, backend: &BackendRecord) -> Result<Arc<LoadBalancerDriver>> {
    let record_namespace = backend.namespace().unwrap_or_default();
    let namespace = driver_namespace(&backend.spec.lb_driver, &record_namespace);
    ctx.stores
        .get_driver(&backend.spec.lb_driver, namespace)
        .ok_or_else(|| {
            anyhow!(
                "retrieve driver {:?} for BackendRecord {} failed: not found in namespace {}",
                backend.spec.lb_driver,
                backend.name_any(),
                namespace
            )
        })
}

/// Build the shared `ensureBackend`/`deregBackend` request envelope.
fn backend_operation_request(backend: &BackendRecord, op: &str) -> BackendOperationRequest {
    BackendOperationRequest {
        record_id: format!("{op}({})", backend.uid().unwrap_or_default()),
        retry_id: new_retry_id(),
        lb_info: backend.spec.lb_info.clone(),
        backend_addr: backend.backend_addr().to_string(),
        parameters: backend.spec.parameters.clone(),
        injected_info: backend
            .status
            .as_ref()
            .map(|status| status.injected_info.clone())
            .unwrap_or_default(),
    }
}

/// Pod source: embed the observed pod and declared port into the request.
async fn generate_pod_addr(
    ctx: &Context,
    backend: &BackendRecord,
    driver: &LoadBalancerDriver,
    info: &PodBackendInfo,
) -> Result<GenerateBackendAddrResponse> {
    let namespace = backend.namespace().unwrap_or_default();
    let pod = ctx.stores.get_pod(&info.name, &namespace).ok_or_else(|| {
        anyhow!(
            "pod {}/{} referenced by BackendRecord {} not found",
            namespace,
            info.name,
            backend.name_any()
        )
    })?;

    let req = GenerateBackendAddrRequest {
        record_id: format!("generateBackendAddr({})", backend.uid().unwrap_or_default()),
        retry_id: new_retry_id(),
        lb_info: backend.spec.lb_info.clone(),
        lb_attributes: backend.spec.lb_attributes.clone(),
        pod_backend: Some(PodBackendInGenerateAddrRequest {
            pod: (*pod).clone(),
            port: info.port,
        }),
        service_backend: None,
    };
    ctx.invoker.call_generate_backend_addr(driver, &req).await
}

/// Service source: embed the observed service, declared port, and the
/// target node's status addresses into the request.
async fn generate_service_addr(
    ctx: &Context,
    backend: &BackendRecord,
    driver: &LoadBalancerDriver,
    info: &ServiceBackendInfo,
) -> Result<GenerateBackendAddrResponse> {
    let namespace = backend.namespace().unwrap_or_default();
    let node = ctx.stores.get_node(&info.node_name).ok_or_else(|| {
        anyhow!(
            "node {} referenced by BackendRecord {} not found",
            info.node_name,
            backend.name_any()
        )
    })?;
    let service = ctx.stores.get_service(&info.name, &namespace).ok_or_else(|| {
        anyhow!(
            "service {}/{} referenced by BackendRecord {} not found",
            namespace,
            info.name,
            backend.name_any()
        )
    })?;

    let node_addresses = node
        .status
        .as_ref()
        .and_then(|status| status.addresses.clone())
        .unwrap_or_default();

    let req = GenerateBackendAddrRequest {
        record_id: format!("generateBackendAddr({})", backend.uid().unwrap_or_default()),
        retry_id: new_retry_id(),
        lb_info: backend.spec.lb_info.clone(),
        lb_attributes: backend.spec.lb_attributes.clone(),
        pod_backend: None,
        service_backend: Some(ServiceBackendInGenerateAddrRequest {
            service: (*service).clone(),
            port: info.port,
            node_name: node.name_any(),
            node_addresses,
        }),
    };
    ctx.invoker.call_generate_backend_addr(driver, &req).await
}

/// Static source: synthesise a local success response, no webhook call.
fn generate_static_addr(addr: &str) -> GenerateBackendAddrResponse {
    GenerateBackendAddrResponse {
        status: STATUS_SUCC.to_string(),
        backend_addr: addr.to_string(),
        ..Default::default()
    }
}

/// Persist a record's status through the status subresource.
async fn update_status(client: &Client, backend: &BackendRecord) -> Result<()> {
    let namespace = backend.namespace().unwrap_or_default();
    let name = backend.name_any();
    let api: Api<BackendRecord> = Api::namespaced(client.clone(), &namespace);

    let patch = json!({ "status": backend.status });
    api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .with_context(|| format!("updating status of BackendRecord {namespace}/{name}"))?;
    Ok(())
}

#[cfg(test)]
#[path = "backend_record_tests.rs"]
mod backend_record_tests;
