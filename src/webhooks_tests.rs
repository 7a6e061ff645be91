// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `webhooks.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        hook_url, new_retry_id, BackendOperationRequest, BackendOperationResponse,
        GenerateBackendAddrRequest, GenerateBackendAddrResponse, STATUS_SUCC,
    };
    use crate::crd::{LoadBalancerDriver, LoadBalancerDriverSpec};
    use std::collections::BTreeMap;

    fn driver_with_url(url: &str) -> LoadBalancerDriver {
        LoadBalancerDriver::new(
            "clb",
            LoadBalancerDriverSpec {
                driver_type: "Webhook".to_string(),
                url: url.to_string(),
                webhooks: Vec::new(),
            },
        )
    }

    #[test]
    fn test_retry_id_shape() {
        let retry_id = new_retry_id();
        assert_eq!(retry_id.len(), 16);
        assert!(retry_id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_retry_ids_differ_between_attempts() {
        assert_ne!(new_retry_id(), new_retry_id());
    }

    #[test]
    fn test_generate_request_wire_names() {
        let mut lb_info = BTreeMap::new();
        lb_info.insert("lbID".to_string(), "lb-1".to_string());

        let req = GenerateBackendAddrRequest {
            record_id: "generateBackendAddr(uid-1)".to_string(),
            retry_id: "abcd1234abcd1234".to_string(),
            lb_info,
            ..Default::default()
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["recordID"], "generateBackendAddr(uid-1)");
        assert_eq!(json["retryID"], "abcd1234abcd1234");
        assert_eq!(json["lbInfo"]["lbID"], "lb-1");

        // Unset payloads are omitted from the wire
        assert!(json.get("podBackend").is_none());
        assert!(json.get("serviceBackend").is_none());
        assert!(json.get("lbAttributes").is_none());
    }

    #[test]
    fn test_operation_request_wire_names() {
        let mut injected_info = BTreeMap::new();
        injected_info.insert("listener".to_string(), "abc".to_string());

        let req = BackendOperationRequest {
            record_id: "ensureBackend(uid-1)".to_string(),
            retry_id: "abcd1234abcd1234".to_string(),
            backend_addr: "1.2.3.4:8080".to_string(),
            injected_info,
            ..Default::default()
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["recordID"], "ensureBackend(uid-1)");
        assert_eq!(json["backendAddr"], "1.2.3.4:8080");
        assert_eq!(json["injectedInfo"]["listener"], "abc");
        assert!(json.get("parameters").is_none());
    }

    #[test]
    fn test_generate_response_decode() {
        let rsp: GenerateBackendAddrResponse = serde_json::from_str(
            r#"{"status": "Succ", "msg": "ok", "backendAddr": "10.0.0.1:80"}"#,
        )
        .unwrap();
        assert_eq!(rsp.status, STATUS_SUCC);
        assert_eq!(rsp.backend_addr, "10.0.0.1:80");
        assert!(rsp.min_retry_delay_in_seconds.is_none());
    }

    #[test]
    fn test_operation_response_decode_with_retry_hint() {
        let rsp: BackendOperationResponse = serde_json::from_str(
            r#"{"status": "Running", "msg": "creating", "minRetryDelayInSeconds": 15}"#,
        )
        .unwrap();
        assert_eq!(rsp.status, "Running");
        assert_eq!(rsp.min_retry_delay_in_seconds, Some(15));
        assert!(rsp.injected_info.is_empty());
    }

    #[test]
    fn test_unknown_status_survives_decode() {
        // Out-of-protocol statuses reach the reconciler instead of failing decode.
        let rsp: BackendOperationResponse =
            serde_json::from_str(r#"{"status": "Maybe", "msg": "?"}"#).unwrap();
        assert_eq!(rsp.status, "Maybe");
    }

    #[test]
    fn test_empty_response_decodes_to_defaults() {
        let rsp: GenerateBackendAddrResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(rsp.status, "");
        assert_eq!(rsp.backend_addr, "");
    }

    #[test]
    fn test_hook_url_sets_hook_name_as_path() {
        let driver = driver_with_url("https://driver.example.com");
        let url = hook_url(&driver, "ensureBackend").unwrap();
        assert_eq!(url.as_str(), "https://driver.example.com/ensureBackend");
    }

    #[test]
    fn test_hook_url_replaces_existing_path() {
        // The hook name becomes the whole path; any path on the driver URL
        // is discarded.
        let driver = driver_with_url("https://driver.example.com/hooks/");
        let url = hook_url(&driver, "deregBackend").unwrap();
        assert_eq!(url.as_str(), "https://driver.example.com/deregBackend");
    }

    #[test]
    fn test_hook_url_rejects_invalid_base() {
        let driver = driver_with_url("not a url");
        assert!(hook_url(&driver, "ensureBackend").is_err());
    }
}
