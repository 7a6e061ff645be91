// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::runtime::controller::Action;
use kube::runtime::reflector::Store;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::{reflector, watcher, Controller, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use lobby::constants::{ERROR_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS};
use lobby::context::{Context, Stores};
use lobby::crd::{BackendRecord, LoadBalancerDriver};
use lobby::reconcilers::deleting::DeletingBackends;
use lobby::reconcilers::{sync_backend_record, SyncResult};
use lobby::webhooks::HttpWebhookInvoker;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("lobby-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting Lobby load-balancer backend controller");
}

/// Spawn a reflector task watching all objects of one resource type and
/// return the read handle of its store.
fn spawn_reflector<K>(api: Api<K>, config: WatcherConfig) -> Store<K>
where
    K: kube::Resource<DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    let (reader, writer) = reflector::store();
    let stream = reflector(writer, watcher(api, config));
    tokio::spawn(async move {
        stream
            .applied_objects()
            .for_each(|object| {
                if let Err(err) = object {
                    warn!("Reflector watch error: {err}");
                }
                futures::future::ready(())
            })
            .await;
    });
    reader
}

/// Map a reconcile verdict onto the work queue.
///
/// `Success` parks the key until the next watch event; `Fail`, `Async` and
/// `Periodic` requeue after their delay; `Error` propagates so the queue
/// applies its rate-limited backoff.
async fn reconcile_backend_record(
    backend: Arc<BackendRecord>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let namespace = backend.namespace().unwrap_or_default();
    let name = backend.name_any();

    match sync_backend_record(&ctx, &namespace, &name).await {
        SyncResult::Success => Ok(Action::await_change()),
        SyncResult::Fail(delay) | SyncResult::Async(delay) | SyncResult::Periodic(delay) => {
            Ok(Action::requeue(delay))
        }
        SyncResult::Error(err) => Err(ReconcileError(err)),
    }
}

/// Error policy for the backend controller.
///
/// Returns an action to requeue the record after a delay when reconciliation fails.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy(backend: Arc<BackendRecord>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    error!(
        error = %err,
        record = %backend.name_any(),
        "Reconciliation error - will retry in {}s",
        ERROR_REQUEUE_DURATION_SECS
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

async fn async_main() -> Result<()> {
    initialize_logging();

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    let watcher_config = WatcherConfig::default();

    // Reflector stores for every resource the reconciler reads. Drivers,
    // pods, services and nodes are read-only lookups; the backend record
    // store is shared with the controller's own watch below.
    let drivers = spawn_reflector(
        Api::<LoadBalancerDriver>::all(client.clone()),
        watcher_config.clone(),
    );
    let pods = spawn_reflector(Api::<Pod>::all(client.clone()), watcher_config.clone());
    let services = spawn_reflector(Api::<Service>::all(client.clone()), watcher_config.clone());
    let nodes = spawn_reflector(Api::<Node>::all(client.clone()), watcher_config.clone());

    let api = Api::<BackendRecord>::all(client.clone());
    let controller = Controller::new(api, watcher_config);
    let backend_records = controller.store();

    drivers
        .wait_until_ready()
        .await
        .context("driver store never became ready")?;
    pods.wait_until_ready()
        .await
        .context("pod store never became ready")?;
    services
        .wait_until_ready()
        .await
        .context("service store never became ready")?;
    nodes
        .wait_until_ready()
        .await
        .context("node store never became ready")?;

    let ctx = Arc::new(Context {
        client,
        stores: Stores {
            backend_records,
            drivers,
            pods,
            services,
            nodes,
        },
        invoker: Arc::new(HttpWebhookInvoker::new()),
        deleting: DeletingBackends::new(),
    });

    info!("Starting BackendRecord controller");

    let shutdown_result: Result<()> = tokio::select! {
        // Monitor for SIGINT (Ctrl+C)
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }

        // Monitor for SIGTERM (Kubernetes sends this when deleting pods)
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                // On non-Unix platforms, just wait forever
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            result
        }

        // Run the controller - it should never exit on its own
        () = controller
            .run(reconcile_backend_record, error_policy, ctx)
            .for_each(|_| futures::future::ready(())) => {
            error!("CRITICAL: BackendRecord controller exited unexpectedly");
            anyhow::bail!("BackendRecord controller exited unexpectedly")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully");

    Ok(())
}
