// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Driver webhook protocol: request/response envelopes and invocation.
//!
//! Drivers are plain HTTP services. Every hook is a POST of a JSON body to
//! `<driver url>/<hook name>`, answered with a JSON envelope carrying a
//! three-valued status (`Succ`, `Fail`, `Running`), a human message, and
//! operation-specific payload fields.
//!
//! Every request carries two identifiers:
//! - `recordID` is deterministic per (record, operation), `"<op>(<uid>)"`;
//!   drivers may use it as an idempotency key.
//! - `retryID` is a fresh random identifier per attempt, distinguishing
//!   retries of the same operation.
//!
//! The [`WebhookInvoker`] trait is the single capability surface the
//! reconciler depends on; tests swap in an in-memory fake.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{NodeAddress, Pod, Service};
use kube::ResourceExt;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use crate::constants::{
    RETRY_ID_LEN, WEBHOOK_DEREG_BACKEND, WEBHOOK_ENSURE_BACKEND, WEBHOOK_GENERATE_BACKEND_ADDR,
};
use crate::crd::LoadBalancerDriver;

/// Driver answered: the operation completed successfully.
pub const STATUS_SUCC: &str = "Succ";

/// Driver answered: the operation failed; retry after the suggested delay.
pub const STATUS_FAIL: &str = "Fail";

/// Driver answered: the operation is still in progress remotely.
pub const STATUS_RUNNING: &str = "Running";

/// Generate a fresh random `retryID` for one webhook attempt.
#[must_use]
pub fn new_retry_id() -> String {
    let mut rng = rand::thread_rng();
    (0..RETRY_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Pod payload embedded in a `generateBackendAddr` request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodBackendInGenerateAddrRequest {
    /// Full pod object as observed by the controller
    pub pod: Pod,

    /// Declared container port
    pub port: i32,
}

/// Service payload embedded in a `generateBackendAddr` request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBackendInGenerateAddrRequest {
    /// Full service object as observed by the controller
    pub service: Service,

    /// Declared service port
    pub port: i32,

    /// Node the service is reached through
    pub node_name: String,

    /// Status addresses of that node
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node_addresses: Vec<NodeAddress>,
}

/// Request envelope for `generateBackendAddr`.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBackendAddrRequest {
    #[serde(rename = "recordID")]
    pub record_id: String,

    #[serde(rename = "retryID")]
    pub retry_id: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lb_info: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lb_attributes: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_backend: Option<PodBackendInGenerateAddrRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_backend: Option<ServiceBackendInGenerateAddrRequest>,
}

/// Response envelope for `generateBackendAddr`.
///
/// `status` is kept as a plain string so that values outside the three
/// enumerated ones reach the reconciler, which treats them as protocol
/// errors rather than failing decode.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateBackendAddrResponse {
    pub status: String,
    pub msg: String,
    pub backend_addr: String,
    pub min_retry_delay_in_seconds: Option<i32>,
}

/// Request envelope shared by `ensureBackend` and `deregBackend`.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendOperationRequest {
    #[serde(rename = "recordID")]
    pub record_id: String,

    #[serde(rename = "retryID")]
    pub retry_id: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub lb_info: BTreeMap<String, String>,

    pub backend_addr: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub injected_info: BTreeMap<String, String>,
}

/// Response envelope shared by `ensureBackend` and `deregBackend`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendOperationResponse {
    pub status: String,
    pub msg: String,
    pub injected_info: BTreeMap<String, String>,
    pub min_retry_delay_in_seconds: Option<i32>,
}

/// Capability surface over the driver webhook protocol.
///
/// The reconciler depends only on this trait; the production implementation
/// is [`HttpWebhookInvoker`], tests use an in-memory fake.
#[async_trait]
pub trait WebhookInvoker: Send + Sync {
    /// Call `generateBackendAddr` on the driver.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a body
    /// that does not decode as the response envelope.
    async fn call_generate_backend_addr(
        &self,
        driver: &LoadBalancerDriver,
        req: &GenerateBackendAddrRequest,
    ) -> Result<GenerateBackendAddrResponse>;

    /// Call `ensureBackend` on the driver.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`WebhookInvoker::call_generate_backend_addr`].
    async fn call_ensure_backend(
        &self,
        driver: &LoadBalancerDriver,
        req: &BackendOperationRequest,
    ) -> Result<BackendOperationResponse>;

    /// Call `deregBackend` on the driver.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`WebhookInvoker::call_generate_backend_addr`].
    async fn call_deregister_backend(
        &self,
        driver: &LoadBalancerDriver,
        req: &BackendOperationRequest,
    ) -> Result<BackendOperationResponse>;
}

/// HTTP implementation of [`WebhookInvoker`]. Stateless apart from the
/// shared connection pool.
#[derive(Clone, Default)]
pub struct HttpWebhookInvoker {
    http: reqwest::Client,
}

impl HttpWebhookInvoker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn call_webhook<Req, Rsp>(
        &self,
        driver: &LoadBalancerDriver,
        hook_name: &str,
        req: &Req,
    ) -> Result<Rsp>
    where
        Req: Serialize + Sync,
        Rsp: DeserializeOwned,
    {
        let url = hook_url(driver, hook_name)?;
        let timeout = driver.webhook_timeout(hook_name);

        debug!(
            driver = %driver.name_any(),
            hook = hook_name,
            url = %url,
            timeout_secs = timeout.as_secs(),
            "Calling driver webhook"
        );

        let response = self
            .http
            .post(url.clone())
            .timeout(timeout)
            .json(req)
            .send()
            .await
            .with_context(|| {
                format!(
                    "webhook {hook_name} on driver {} failed ({url})",
                    driver.name_any()
                )
            })?;

        let status = response.status();
        let body = response.bytes().await.with_context(|| {
            format!(
                "reading {hook_name} response from driver {}",
                driver.name_any()
            )
        })?;

        if !status.is_success() {
            bail!(
                "webhook {hook_name} on driver {} returned HTTP {}: {}",
                driver.name_any(),
                status.as_u16(),
                String::from_utf8_lossy(&body)
            );
        }

        serde_json::from_slice(&body).with_context(|| {
            format!(
                "decoding {hook_name} response from driver {}, raw: {}",
                driver.name_any(),
                String::from_utf8_lossy(&body)
            )
        })
    }
}

#[async_trait]
impl WebhookInvoker for HttpWebhookInvoker {
    async fn call_generate_backend_addr(
        &self,
        driver: &LoadBalancerDriver,
        req: &GenerateBackendAddrRequest,
    ) -> Result<GenerateBackendAddrResponse> {
        self.call_webhook(driver, WEBHOOK_GENERATE_BACKEND_ADDR, req)
            .await
    }

    async fn call_ensure_backend(
        &self,
        driver: &LoadBalancerDriver,
        req: &BackendOperationRequest,
    ) -> Result<BackendOperationResponse> {
        self.call_webhook(driver, WEBHOOK_ENSURE_BACKEND, req).await
    }

    async fn call_deregister_backend(
        &self,
        driver: &LoadBalancerDriver,
        req: &BackendOperationRequest,
    ) -> Result<BackendOperationResponse> {
        self.call_webhook(driver, WEBHOOK_DEREG_BACKEND, req).await
    }
}

/// Resolve the endpoint of a hook: the driver base URL with its path set
/// to exactly the hook name. Any path already present on the driver URL is
/// discarded.
fn hook_url(driver: &LoadBalancerDriver, hook_name: &str) -> Result<Url> {
    let mut url = Url::parse(&driver.spec.url).with_context(|| {
        format!(
            "invalid url {:?} on driver {}",
            driver.spec.url,
            driver.name_any()
        )
    })?;

    url.set_path(hook_name);

    Ok(url)
}

#[cfg(test)]
#[path = "webhooks_tests.rs"]
mod webhooks_tests;
