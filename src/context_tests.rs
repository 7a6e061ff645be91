// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `context.rs`

#[cfg(test)]
mod tests {
    use super::super::Stores;
    use crate::crd::{
        BackendRecord, BackendRecordSpec, LoadBalancerDriver, LoadBalancerDriverSpec,
    };
    use k8s_openapi::api::core::v1::{Node, Pod, Service};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::runtime::reflector;
    use kube::runtime::watcher::Event;

    struct StoreWriters {
        records: reflector::store::Writer<BackendRecord>,
        drivers: reflector::store::Writer<LoadBalancerDriver>,
        pods: reflector::store::Writer<Pod>,
        services: reflector::store::Writer<Service>,
        nodes: reflector::store::Writer<Node>,
    }

    fn test_stores() -> (Stores, StoreWriters) {
        let (backend_records, records) = reflector::store::<BackendRecord>();
        let (drivers, drivers_writer) = reflector::store::<LoadBalancerDriver>();
        let (pods, pods_writer) = reflector::store::<Pod>();
        let (services, services_writer) = reflector::store::<Service>();
        let (nodes, nodes_writer) = reflector::store::<Node>();

        let stores = Stores {
            backend_records,
            drivers,
            pods,
            services,
            nodes,
        };
        let writers = StoreWriters {
            records,
            drivers: drivers_writer,
            pods: pods_writer,
            services: services_writer,
            nodes: nodes_writer,
        };
        (stores, writers)
    }

    fn namespaced_meta(name: &str, namespace: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_backend_record_by_namespace_and_name() {
        let (stores, mut writers) = test_stores();

        let mut record = BackendRecord::new("web-backend", BackendRecordSpec::default());
        record.metadata.namespace = Some("prod".to_string());
        writers.records.apply_watcher_event(&Event::Apply(record));

        assert!(stores.get_backend_record("web-backend", "prod").is_some());
        assert!(stores.get_backend_record("web-backend", "staging").is_none());
        assert!(stores.get_backend_record("other", "prod").is_none());
    }

    #[test]
    fn test_get_driver() {
        let (stores, mut writers) = test_stores();

        let mut driver = LoadBalancerDriver::new(
            "lobby-clb",
            LoadBalancerDriverSpec {
                url: "https://driver.kube-system.svc".to_string(),
                ..Default::default()
            },
        );
        driver.metadata.namespace = Some("kube-system".to_string());
        writers.drivers.apply_watcher_event(&Event::Apply(driver));

        let found = stores.get_driver("lobby-clb", "kube-system").unwrap();
        assert_eq!(found.spec.url, "https://driver.kube-system.svc");
        assert!(stores.get_driver("lobby-clb", "default").is_none());
    }

    #[test]
    fn test_get_pod_and_service_are_namespace_isolated() {
        let (stores, mut writers) = test_stores();

        writers.pods.apply_watcher_event(&Event::Apply(Pod {
            metadata: namespaced_meta("web-0", "prod"),
            ..Default::default()
        }));
        writers.services.apply_watcher_event(&Event::Apply(Service {
            metadata: namespaced_meta("web", "prod"),
            ..Default::default()
        }));

        assert!(stores.get_pod("web-0", "prod").is_some());
        assert!(stores.get_pod("web-0", "staging").is_none());
        assert!(stores.get_service("web", "prod").is_some());
        assert!(stores.get_service("web", "staging").is_none());
    }

    #[test]
    fn test_get_node_is_cluster_scoped() {
        let (stores, mut writers) = test_stores();

        writers.nodes.apply_watcher_event(&Event::Apply(Node {
            metadata: ObjectMeta {
                name: Some("node-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }));

        assert!(stores.get_node("node-1").is_some());
        assert!(stores.get_node("node-2").is_none());
    }
}
