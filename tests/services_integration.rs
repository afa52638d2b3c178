// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the inventory and deployment-management clients
//! against mocked HTTP services.

use nephio_adapter::crd::NetworkFunctionType;
use nephio_adapter::deployment::{observe, DeploymentService, HttpDeploymentClient};
use nephio_adapter::inventory::{HttpInventoryClient, InventoryService};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Inventory Client
// ============================================================================

#[tokio::test]
async fn test_inventory_lists_sites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sites": [
                {
                    "id": "site-tokyo-01",
                    "name": "Tokyo Edge 01",
                    "cloudType": "edge",
                    "coordinates": {"latitude": 35.68, "longitude": 139.77},
                    "capacity": {"cpuCores": 64, "memoryGb": 256, "storageGb": 2000, "bandwidthMbps": 10000},
                    "latencyClassMs": 1.0,
                    "labels": {"mano.oran.io/cluster": "edge01-tokyo"}
                },
                {
                    "id": "site-osaka-01",
                    "name": "Osaka Regional 01",
                    "cloudType": "regional",
                    "coordinates": {"latitude": 34.69, "longitude": 135.50},
                    "capacity": {"cpuCores": 128, "memoryGb": 512, "storageGb": 8000, "bandwidthMbps": 40000},
                    "latencyClassMs": 5.0,
                    "labels": {"mano.oran.io/cluster": "regional01-osaka"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = HttpInventoryClient::new(reqwest::Client::new(), &server.uri());
    let sites = client.list_available_sites().await.unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].id, "site-tokyo-01");
    assert_eq!(sites[0].cluster(), Some("edge01-tokyo"));
    assert!((sites[1].latency_class_ms - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_inventory_server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpInventoryClient::new(reqwest::Client::new(), &server.uri());
    let err = client.list_available_sites().await.unwrap_err();

    assert_eq!(err.reason(), "InventoryUnavailable");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_inventory_unreachable_is_transient() {
    // Nothing listens here.
    let client = HttpInventoryClient::new(reqwest::Client::new(), "http://127.0.0.1:9");
    let err = client.list_available_sites().await.unwrap_err();
    assert_eq!(err.reason(), "InventoryUnavailable");
    assert!(err.is_transient());
}

// ============================================================================
// Deployment-Management Client
// ============================================================================

#[tokio::test]
async fn test_deployment_status_aggregates_to_all_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/deployments/slice-embb-001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "functions": [
                {"name": "slice-embb-001-gnb", "type": "gNB", "cluster": "edge01-tokyo",
                 "namespace": "slice-embb-001-gnb", "status": "Ready"},
                {"name": "slice-embb-001-amf", "type": "AMF", "cluster": "edge01-tokyo",
                 "namespace": "slice-embb-001-amf", "status": "Ready"},
                {"name": "slice-embb-001-upf", "type": "UPF", "cluster": "edge01-tokyo",
                 "namespace": "slice-embb-001-upf", "status": "Ready"}
            ]
        })))
        .mount(&server)
        .await;

    let client = HttpDeploymentClient::new(reqwest::Client::new(), &server.uri());
    let reported = client.get_status("slice-embb-001").await.unwrap();

    let expected = vec![
        NetworkFunctionType::Gnb,
        NetworkFunctionType::Amf,
        NetworkFunctionType::Upf,
    ];
    let observation = observe(&expected, reported);
    assert!(observation.all_ready);
    assert!(!observation.any_failed);
    assert_eq!(observation.functions.len(), 3);
}

#[tokio::test]
async fn test_deployment_status_absent_intent_reports_nothing() {
    let server = MockServer::start().await;
    // No mock mounted: the server answers 404.

    let client = HttpDeploymentClient::new(reqwest::Client::new(), &server.uri());
    let reported = client.get_status("slice-unknown").await.unwrap();
    assert!(reported.is_empty());
}

#[tokio::test]
async fn test_deployment_status_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/deployments/slice-embb-001"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpDeploymentClient::new(reqwest::Client::new(), &server.uri());
    let err = client.get_status("slice-embb-001").await.unwrap_err();
    assert_eq!(err.reason(), "DeploymentStatusError");
    assert!(err.is_transient());
}

/// S4 (teardown half): one delete call per intent; deleting an intent the
/// service no longer knows is a success.
#[tokio::test]
async fn test_delete_deployment_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/deployments/slice-embb-001"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/deployments/slice-gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpDeploymentClient::new(reqwest::Client::new(), &server.uri());
    client.delete_deployment("slice-embb-001").await.unwrap();
    client.delete_deployment("slice-gone").await.unwrap();
}
