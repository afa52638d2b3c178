// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Renders the per-cluster sync-wiring package.
//!
//! Each target cluster gets the declarative RootSync/RepoSync objects that
//! point its sync agent at the Git directory where the slice's packages land,
//! plus a cluster-specific node-selector override patch.
//!
//! Repository directory layout, per cluster:
//!
//! - `clusters/<cluster>/slices/<intent>/` holds the published function packages
//! - `namespaces/slice-<intent>/` holds the namespace-scoped RepoSync targets

use crate::constants::{DEP_ORAN_COMMON, PACKAGE_VERSION};
use crate::errors::IntentError;
use crate::labels::{
    COMPONENT_SYNC_WIRING, GENERATED_AT_ANNOTATION, K8S_COMPONENT, K8S_MANAGED_BY, K8S_NAME,
    K8S_PART_OF, MANAGED_BY_NEPHIO_ADAPTER, NEPHIO_COMPONENT_LABEL, ORAN_CLOUD_TYPE_LABEL,
    ORAN_QOS_CLASS_ANNOTATION, ORAN_SLICE_LABEL, PART_OF_SLICE, SITE_CLUSTER_LABEL,
};
use crate::package::{
    kptfile, slice_namespace, sync_package_name, validation::ValidationRule, KrmResource, Package,
    PackageCategory, PackageMetadata, QosContext, RenderStatus,
};
use serde_json::json;
use std::collections::BTreeMap;

/// Git repository URL a cluster's sync agent pulls from, derived
/// deterministically from the cluster name.
#[must_use]
pub fn cluster_repository_url(cluster: &str) -> String {
    format!("https://git.oran.io/deployments/{cluster}.git")
}

/// Directory within the cluster repository holding this slice's packages.
#[must_use]
pub fn slice_directory(cluster: &str, intent_name: &str) -> String {
    format!("clusters/{cluster}/slices/{intent_name}")
}

/// Directory holding the namespace-scoped RepoSync targets.
#[must_use]
pub fn namespace_directory(intent_name: &str) -> String {
    format!("namespaces/{}", slice_namespace(intent_name))
}

fn base_labels(
    intent_name: &str,
    package_name: &str,
    cluster: &str,
    cloud_type: &str,
) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".into(), package_name.into());
    labels.insert(K8S_NAME.into(), "sync-wiring".into());
    labels.insert(K8S_COMPONENT.into(), COMPONENT_SYNC_WIRING.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_NEPHIO_ADAPTER.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_SLICE.into());
    labels.insert(ORAN_SLICE_LABEL.into(), intent_name.into());
    labels.insert(SITE_CLUSTER_LABEL.into(), cluster.into());
    labels.insert(ORAN_CLOUD_TYPE_LABEL.into(), cloud_type.into());
    labels.insert(NEPHIO_COMPONENT_LABEL.into(), "network-slice".into());
    labels
}

/// Render the sync-wiring package for one target cluster. `cloud_type` is
/// the tier of the functions placed on that cluster.
///
/// # Errors
///
/// Returns [`IntentError::Render`] when a manifest fails to serialize; the
/// manifests here are built from literals, so this indicates a programming
/// error rather than bad input.
pub fn render_sync_package(
    intent_name: &str,
    cluster: &str,
    cloud_type: &str,
    qos: &QosContext,
    generated_at: &str,
) -> Result<Package, IntentError> {
    let package_name = sync_package_name(intent_name, cluster);
    let slice_ns = slice_namespace(intent_name);

    let labels = base_labels(intent_name, &package_name, cluster, cloud_type);
    let mut annotations = BTreeMap::new();
    annotations.insert(
        ORAN_QOS_CLASS_ANNOTATION.to_string(),
        qos.qos_class.as_str().to_string(),
    );
    annotations.insert(GENERATED_AT_ANNOTATION.to_string(), generated_at.to_string());

    let repo_url = cluster_repository_url(cluster);

    // Cluster-wide RootSync pulling the slice directory.
    let root_sync = json!({
        "apiVersion": "configsync.gke.io/v1beta1",
        "kind": "RootSync",
        "metadata": {
            "name": package_name,
            "namespace": "config-management-system",
            "labels": labels,
            "annotations": annotations,
        },
        "spec": {
            "sourceFormat": "unstructured",
            "git": {
                "repo": repo_url,
                "branch": "main",
                "dir": slice_directory(cluster, intent_name),
                "auth": "none"
            }
        }
    });

    // Namespace-scoped RepoSync for the slice namespace.
    let repo_sync = json!({
        "apiVersion": "configsync.gke.io/v1beta1",
        "kind": "RepoSync",
        "metadata": {
            "name": package_name,
            "namespace": slice_ns,
            "labels": labels,
            "annotations": annotations,
        },
        "spec": {
            "sourceFormat": "unstructured",
            "git": {
                "repo": repo_url,
                "branch": "main",
                "dir": namespace_directory(intent_name),
                "auth": "none"
            }
        }
    });

    // Cluster-specific override: pin slice workloads to this cluster's
    // node pool through a node-selector patch.
    let override_patch = json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": format!("{package_name}-overrides"),
            "namespace": slice_ns,
            "labels": labels,
            "annotations": annotations,
        },
        "data": {
            "node-selector-patch.yaml": format!(
                "spec:\n  template:\n    spec:\n      nodeSelector:\n        {SITE_CLUSTER_LABEL}: {cluster}\n"
            )
        }
    });

    let resources = vec![
        KrmResource {
            filename: "rootsync.yaml".to_string(),
            manifest: root_sync,
        },
        KrmResource {
            filename: "reposync.yaml".to_string(),
            manifest: repo_sync,
        },
        KrmResource {
            filename: "overrides.yaml".to_string(),
            manifest: override_patch,
        },
    ];

    let kptfile = kptfile::build_kptfile(
        &package_name,
        &format!("sync wiring for {intent_name} on {cluster}"),
        &kptfile::SetterContext {
            intent_name,
            function: None,
            site: "",
            cluster,
            cloud_type,
            namespace: &slice_ns,
            bandwidth: &qos.bandwidth_raw,
            latency: &qos.latency_raw,
            qos_class: qos.qos_class.as_str(),
        },
    );

    Ok(Package {
        metadata: PackageMetadata {
            name: package_name,
            version: PACKAGE_VERSION.to_string(),
            labels,
            annotations,
            category: PackageCategory::SyncWiring,
        },
        resources,
        kptfile,
        validation_rules: vec![ValidationRule::RequiredLabels],
        dependencies: vec![DEP_ORAN_COMMON.to_string()],
        targets: vec![crate::package::DeploymentTarget {
            cluster: cluster.to_string(),
            namespace: slice_ns,
            cloud_type: cloud_type.to_string(),
        }],
        render_status: RenderStatus {
            rendered: true,
            timestamp: generated_at.to_string(),
            errors: Vec::new(),
            warnings: Vec::new(),
        },
    })
}

#[cfg(test)]
#[path = "syncwiring_tests.rs"]
mod syncwiring_tests;
