// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the package publisher against a mocked
//! package-revision service.

use nephio_adapter::crd::{
    CloudType, NetworkFunctionSpec, NetworkFunctionType, NetworkSliceIntent,
    NetworkSliceIntentSpec, PlacementDecision, PlacementHints, QosProfile, ResourceRequirements,
    SliceType,
};
use nephio_adapter::package::{materialize, Package};
use nephio_adapter::porch::{
    HttpPorchClient, PackagePublisher, PackageRevisionService, LIFECYCLE_PUBLISHED,
};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATED_AT: &str = "2025-06-01T00:00:00Z";

fn embb_intent() -> NetworkSliceIntent {
    NetworkSliceIntent::new(
        "slice-embb-001",
        NetworkSliceIntentSpec {
            intent: "video slice".to_string(),
            qos_profile: QosProfile {
                bandwidth: "4.5Mbps".to_string(),
                latency: "10ms".to_string(),
                reliability: None,
                slice_type: Some(SliceType::Embb),
            },
            network_functions: vec![NetworkFunctionSpec {
                r#type: NetworkFunctionType::Gnb,
                placement: PlacementHints {
                    cloud_type: Some(CloudType::Edge),
                    ..Default::default()
                },
                resources: ResourceRequirements {
                    cpu_cores: 2.0,
                    memory_gb: 4.0,
                    storage_gb: 10.0,
                },
                config: None,
            }],
            deployment_strategy: None,
            target_clusters: Some(vec!["edge01-tokyo".to_string()]),
        },
    )
}

fn rendered_packages() -> Vec<Package> {
    let decisions = vec![PlacementDecision {
        function: NetworkFunctionType::Gnb,
        site: "site-tokyo-01".to_string(),
        cluster: "edge01-tokyo".to_string(),
        score: 90.0,
        constraints_met: true,
        justification: vec![],
    }];
    materialize(&embb_intent(), &decisions, GENERATED_AT).unwrap()
}

fn porch_client(server: &MockServer) -> HttpPorchClient {
    HttpPorchClient::new(reqwest::Client::new(), &server.uri())
}

/// Mount the happy-path lifecycle mocks for every revision: create succeeds,
/// uploads succeed, propose/approve succeed, and status polls walk
/// Draft → Proposed → Published.
async fn mount_happy_lifecycle(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/repositories/[^/]+/packagerevisions$"))
        .respond_with(|req: &wiremock::Request| {
            let body: serde_json::Value = req.body_json().unwrap();
            ResponseTemplate::new(201).set_body_json(body)
        })
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/v1/packagerevisions/[^/]+/resources$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/packagerevisions/[^/]+/(propose|approve)$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    // Status polls walk each revision Proposed → Published: the first poll
    // per name answers the propose wait, later polls answer the approve wait.
    let poll_counts: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, u32>>> =
        std::sync::Arc::default();
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/packagerevisions/[^/]+$"))
        .respond_with(move |req: &wiremock::Request| {
            let name = req
                .url
                .path()
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            let mut counts = poll_counts.lock().unwrap();
            let count = counts.entry(name.clone()).and_modify(|c| *c += 1).or_insert(1);
            let lifecycle = if *count == 1 { "Proposed" } else { "Published" };
            ResponseTemplate::new(200).set_body_json(json!({
                "name": name,
                "repository": name.split('.').next().unwrap_or_default(),
                "packageName": name.split('.').nth(1).unwrap_or_default(),
                "revision": "v1",
                "workspaceName": "main",
                "lifecycle": lifecycle,
                "ready": true
            }))
        })
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_publish_all_creates_one_revision_per_package() {
    let server = MockServer::start().await;
    mount_happy_lifecycle(&server).await;

    let packages = rendered_packages();
    // 1 function + 1 orchestration + 1 sync-wiring
    assert_eq!(packages.len(), 3);

    let client = porch_client(&server);
    let publisher = PackagePublisher::new(&client, "mano-management");
    let outcome = publisher.publish_all(&packages).await.unwrap();

    assert_eq!(outcome.revisions.len(), 3);
    let repos: Vec<&str> = outcome
        .revisions
        .iter()
        .map(|r| r.repository.as_str())
        .collect();
    assert!(repos.contains(&"edge01-tokyo"));
    assert!(repos.contains(&"mano-management"));
}

/// S5: revision create fails transiently twice, then succeeds. The phase
/// outcome is success, the backoff is observable in elapsed time (2 s + 4 s
/// schedule, ±20% jitter), and the revision lands in the outcome.
#[tokio::test]
async fn test_create_retries_transient_errors_with_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/repositories/edge01-tokyo/packagerevisions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    mount_happy_lifecycle(&server).await;

    let packages: Vec<Package> = rendered_packages()
        .into_iter()
        .filter(|p| p.metadata.name == "slice-embb-001-gnb")
        .collect();

    let client = porch_client(&server);
    let publisher = PackagePublisher::new(&client, "mano-management");

    let started = std::time::Instant::now();
    let outcome = publisher.publish_all(&packages).await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed >= std::time::Duration::from_secs(4),
        "backoff must be observable, got {elapsed:?}"
    );
    assert!(outcome.failure.is_none());
    assert_eq!(outcome.revisions.len(), 1);
    assert_eq!(outcome.revisions[0].package_name, "slice-embb-001-gnb");
}

/// A revision stuck after propose is a warning, not a failure: the outcome
/// still carries the revision, in Draft.
#[tokio::test]
async fn test_propose_failure_is_a_warning_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/repositories/[^/]+/packagerevisions$"))
        .respond_with(|req: &wiremock::Request| {
            let body: serde_json::Value = req.body_json().unwrap();
            ResponseTemplate::new(201).set_body_json(body)
        })
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/v1/packagerevisions/[^/]+/resources$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/packagerevisions/[^/]+/propose$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let packages: Vec<Package> = rendered_packages()
        .into_iter()
        .filter(|p| p.metadata.name == "slice-embb-001-gnb")
        .collect();

    let client = porch_client(&server);
    let publisher = PackagePublisher::new(&client, "mano-management");
    let outcome = publisher.publish_all(&packages).await.unwrap();

    assert_eq!(outcome.revisions.len(), 1);
    assert_eq!(outcome.revisions[0].lifecycle, "Draft");
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("stuck in Draft"));
}

/// A missing repository fails cleanly: the publisher does not create
/// repositories.
#[tokio::test]
async fn test_missing_repository_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/repositories/[^/]+/packagerevisions$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let packages: Vec<Package> = rendered_packages()
        .into_iter()
        .filter(|p| p.metadata.name == "slice-embb-001-gnb")
        .collect();

    let client = porch_client(&server);
    let publisher = PackagePublisher::new(&client, "mano-management");
    let outcome = publisher.publish_all(&packages).await.unwrap();

    let err = outcome.failure.expect("create against a missing repository must fail");
    assert_eq!(err.reason(), "RevisionCreateError");
    assert!(err.to_string().contains("edge01-tokyo"));
    assert!(outcome.revisions.is_empty(), "nothing landed, nothing recorded");
}

/// S4 (revision half): deletion moves each revision to DeletionStart and
/// removes it; an already-absent revision counts as deleted.
#[tokio::test]
async fn test_delete_revisions_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/packagerevisions/edge01-tokyo.slice-embb-001-gnb.main"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/packagerevisions/edge01-tokyo.slice-embb-001-gnb.main"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = porch_client(&server);
    let publisher = PackagePublisher::new(&client, "mano-management");
    let refs = vec![nephio_adapter::crd::PackageRevisionRef {
        repository: "edge01-tokyo".to_string(),
        package_name: "slice-embb-001-gnb".to_string(),
        revision: "v1".to_string(),
        workspace: "main".to_string(),
        lifecycle: LIFECYCLE_PUBLISHED.to_string(),
    }];

    publisher.delete_revisions(&refs).await.unwrap();
}

/// The create call uploads the full revision record the publisher derived.
#[tokio::test]
async fn test_create_carries_deterministic_revision_name() {
    let server = MockServer::start().await;
    mount_happy_lifecycle(&server).await;

    let packages: Vec<Package> = rendered_packages()
        .into_iter()
        .filter(|p| p.metadata.name == "slice-embb-001-gnb")
        .collect();

    let client = porch_client(&server);
    let publisher = PackagePublisher::new(&client, "mano-management");
    publisher.publish_all(&packages).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path().ends_with("/packagerevisions"))
        .expect("create request");
    let body: serde_json::Value = create.body_json().unwrap();
    assert_eq!(body["name"], "edge01-tokyo.slice-embb-001-gnb.main");
    assert_eq!(body["lifecycle"], "Draft");
    assert_eq!(body["workspaceName"], "main");
}

/// Direct service-level check: propose and approve hit the lifecycle verbs.
#[tokio::test]
async fn test_client_lifecycle_verbs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/packagerevisions/r1/propose"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/packagerevisions/r1/approve"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = porch_client(&server);
    client.propose("r1").await.unwrap();
    client.publish("r1").await.unwrap();
}
