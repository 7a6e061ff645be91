// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes Event emission for backend reconciliation.
//!
//! Events are fire-and-forget: a failed create is logged and swallowed so
//! that observability problems never fail a reconcile.

use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::chrono::Utc;
use kube::api::PostParams;
use kube::{Api, Client, Resource, ResourceExt};
use tracing::warn;

/// Component name stamped into the event source.
const EVENT_SOURCE_COMPONENT: &str = "lobby-backend-controller";

/// Emit an event against `resource`. `event_type` is "Normal" or "Warning".
pub(crate) async fn create_event<T>(
    client: &Client,
    resource: &T,
    event_type: &str,
    reason: &str,
    message: &str,
) where
    T: Resource<DynamicType = ()> + ResourceExt,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    let event_api: Api<Event> = Api::namespaced(client.clone(), &namespace);

    let now = Time(Utc::now());
    let event = Event {
        metadata: ObjectMeta {
            generate_name: Some(format!("{name}-")),
            namespace: Some(namespace.clone()),
            ..Default::default()
        },
        involved_object: ObjectReference {
            api_version: Some(T::api_version(&()).to_string()),
            kind: Some(T::kind(&()).to_string()),
            name: Some(name.clone()),
            namespace: Some(namespace),
            uid: resource.meta().uid.clone(),
            ..Default::default()
        },
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        type_: Some(event_type.to_string()),
        source: Some(EventSource {
            component: Some(EVENT_SOURCE_COMPONENT.to_string()),
            ..Default::default()
        }),
        first_timestamp: Some(now.clone()),
        last_timestamp: Some(now),
        count: Some(1),
        ..Default::default()
    };

    if let Err(err) = event_api.create(&PostParams::default(), &event).await {
        warn!("Failed to create event for {}: {}", name, err);
    }
}
