// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        BackendRecord, BackendRecordSpec, BackendRecordStatus, Condition, DriverWebhook,
        EnsurePolicy, EnsurePolicyType, LoadBalancerDriver, LoadBalancerDriverSpec, PodBackendInfo,
    };
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn driver_with_webhooks(webhooks: Vec<DriverWebhook>) -> LoadBalancerDriver {
        LoadBalancerDriver::new(
            "test-driver",
            LoadBalancerDriverSpec {
                driver_type: "Webhook".to_string(),
                url: "https://driver.example.com".to_string(),
                webhooks,
            },
        )
    }

    #[test]
    fn test_spec_serializes_camel_case() {
        let mut lb_info = BTreeMap::new();
        lb_info.insert("lbID".to_string(), "lb-1".to_string());

        let spec = BackendRecordSpec {
            lb_driver: "lobby-clb".to_string(),
            lb_info,
            pod_backend_info: Some(PodBackendInfo {
                name: "web-0".to_string(),
                port: 8080,
            }),
            ..Default::default()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["lbDriver"], "lobby-clb");
        assert_eq!(json["lbInfo"]["lbID"], "lb-1");
        assert_eq!(json["podBackendInfo"]["name"], "web-0");
        assert_eq!(json["podBackendInfo"]["port"], 8080);

        // Unset sources and empty maps are omitted entirely
        assert!(json.get("serviceBackendInfo").is_none());
        assert!(json.get("staticAddr").is_none());
        assert!(json.get("parameters").is_none());
    }

    #[test]
    fn test_ensure_policy_round_trip() {
        let policy = EnsurePolicy {
            policy: EnsurePolicyType::Always,
            min_period: Some("30s".to_string()),
        };

        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["policy"], "Always");
        assert_eq!(json["minPeriod"], "30s");

        let parsed: EnsurePolicy = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.policy, EnsurePolicyType::Always);

        let if_not_ready: EnsurePolicy =
            serde_json::from_str(r#"{"policy": "IfNotReady"}"#).unwrap();
        assert_eq!(if_not_ready.policy, EnsurePolicyType::IfNotReady);
        assert!(if_not_ready.min_period.is_none());
    }

    #[test]
    fn test_status_defaults() {
        let status: BackendRecordStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status.backend_addr, "");
        assert!(status.injected_info.is_empty());
        assert!(status.conditions.is_empty());
    }

    #[test]
    fn test_backend_addr_accessor() {
        let mut record = BackendRecord::new("r1", BackendRecordSpec::default());
        assert_eq!(record.backend_addr(), "");

        record.status = Some(BackendRecordStatus {
            backend_addr: "10.0.0.1:80".to_string(),
            ..Default::default()
        });
        assert_eq!(record.backend_addr(), "10.0.0.1:80");
    }

    #[test]
    fn test_condition_round_trip() {
        let condition = Condition {
            r#type: "BackendRegistered".to_string(),
            status: "True".to_string(),
            reason: None,
            message: Some("registered".to_string()),
            last_transition_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        };

        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["type"], "BackendRegistered");
        assert_eq!(json["lastTransitionTime"], "2025-01-01T00:00:00+00:00");
        assert!(json.get("reason").is_none());

        let parsed: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, condition);
    }

    #[test]
    fn test_webhook_timeout_from_spec() {
        let driver = driver_with_webhooks(vec![
            DriverWebhook {
                name: "ensureBackend".to_string(),
                timeout: Some("25s".to_string()),
            },
            DriverWebhook {
                name: "deregBackend".to_string(),
                timeout: None,
            },
        ]);

        assert_eq!(
            driver.webhook_timeout("ensureBackend"),
            Duration::from_secs(25)
        );
        // Declared hook without a timeout falls back to the default
        assert_eq!(
            driver.webhook_timeout("deregBackend"),
            Duration::from_secs(10)
        );
        // Undeclared hook falls back to the default
        assert_eq!(
            driver.webhook_timeout("generateBackendAddr"),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_webhook_timeout_unparsable_falls_back() {
        let driver = driver_with_webhooks(vec![DriverWebhook {
            name: "ensureBackend".to_string(),
            timeout: Some("soon".to_string()),
        }]);

        assert_eq!(
            driver.webhook_timeout("ensureBackend"),
            Duration::from_secs(10)
        );
    }
}
