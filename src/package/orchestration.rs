// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Renders the per-intent slice-orchestration package.
//!
//! The orchestration package carries a copy of the intent record scoped to
//! the management namespace (so downstream controllers can read the intent
//! from the sync store), a ServiceMonitor for slice-wide metrics, and a
//! NetworkPolicy for the slice namespace.

use crate::constants::{DEP_ORAN_COMMON, MANAGEMENT_NAMESPACE, PACKAGE_VERSION};
use crate::crd::NetworkSliceIntent;
use crate::errors::IntentError;
use crate::labels::{
    COMPONENT_SLICE_ORCHESTRATION, GENERATED_AT_ANNOTATION, K8S_COMPONENT, K8S_MANAGED_BY,
    K8S_NAME, K8S_PART_OF, MANAGED_BY_NEPHIO_ADAPTER, NEPHIO_COMPONENT_LABEL,
    ORAN_QOS_BANDWIDTH_ANNOTATION, ORAN_QOS_CLASS_ANNOTATION, ORAN_QOS_LATENCY_ANNOTATION,
    ORAN_SLICE_LABEL, PART_OF_SLICE,
};
use crate::package::{
    kptfile, orchestration_package_name, slice_namespace, validation::ValidationRule, KrmResource,
    Package, PackageCategory, PackageMetadata, QosContext, RenderStatus,
};
use kube::ResourceExt;
use serde_json::json;
use std::collections::BTreeMap;

fn base_labels(intent_name: &str, package_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".into(), package_name.into());
    labels.insert(K8S_NAME.into(), "slice-orchestration".into());
    labels.insert(K8S_COMPONENT.into(), COMPONENT_SLICE_ORCHESTRATION.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_NEPHIO_ADAPTER.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_SLICE.into());
    labels.insert(ORAN_SLICE_LABEL.into(), intent_name.into());
    labels.insert(NEPHIO_COMPONENT_LABEL.into(), "network-slice".into());
    labels
}

fn base_annotations(qos: &QosContext, generated_at: &str) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    annotations.insert(ORAN_QOS_BANDWIDTH_ANNOTATION.into(), qos.bandwidth_raw.clone());
    annotations.insert(ORAN_QOS_LATENCY_ANNOTATION.into(), qos.latency_raw.clone());
    annotations.insert(
        ORAN_QOS_CLASS_ANNOTATION.into(),
        qos.qos_class.as_str().into(),
    );
    annotations.insert(GENERATED_AT_ANNOTATION.into(), generated_at.into());
    annotations
}

/// Render the slice-orchestration package for an intent.
///
/// # Errors
///
/// Returns [`IntentError::Render`] when the intent copy fails to serialize.
pub fn render_orchestration_package(
    intent: &NetworkSliceIntent,
    qos: &QosContext,
    generated_at: &str,
) -> Result<Package, IntentError> {
    let intent_name = intent.name_any();
    let package_name = orchestration_package_name(&intent_name);
    let slice_ns = slice_namespace(&intent_name);

    let labels = base_labels(&intent_name, &package_name);
    let annotations = base_annotations(qos, generated_at);

    // A copy of the intent record, re-scoped to the management namespace.
    // Only the spec travels; status stays with the source of truth.
    let spec_value = serde_json::to_value(&intent.spec).map_err(|e| IntentError::Render {
        package: package_name.clone(),
        reason: format!("failed to serialize intent copy: {e}"),
        transient: false,
    })?;
    let intent_copy = json!({
        "apiVersion": crate::constants::API_GROUP_VERSION,
        "kind": crate::constants::KIND_NETWORK_SLICE_INTENT,
        "metadata": {
            "name": intent_name,
            "namespace": MANAGEMENT_NAMESPACE,
            "labels": labels,
            "annotations": annotations,
        },
        "spec": spec_value,
    });

    // Slice-wide metrics scrape target.
    let service_monitor = json!({
        "apiVersion": "monitoring.coreos.com/v1",
        "kind": "ServiceMonitor",
        "metadata": {
            "name": package_name,
            "namespace": slice_ns,
            "labels": labels,
            "annotations": annotations,
        },
        "spec": {
            "selector": {
                "matchLabels": { ORAN_SLICE_LABEL: intent_name }
            },
            "namespaceSelector": {
                "matchLabels": { ORAN_SLICE_LABEL: intent_name }
            },
            "endpoints": [
                { "port": "metrics", "interval": "30s" }
            ]
        }
    });

    // Slice-namespace NetworkPolicy: only slice members talk to each other.
    let network_policy = json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "NetworkPolicy",
        "metadata": {
            "name": package_name,
            "namespace": slice_ns,
            "labels": labels,
            "annotations": annotations,
        },
        "spec": {
            "podSelector": {},
            "policyTypes": ["Ingress", "Egress"],
            "ingress": [
                { "from": [ { "namespaceSelector": { "matchLabels": { ORAN_SLICE_LABEL: intent_name } } } ] }
            ],
            "egress": [
                { "to": [ { "namespaceSelector": { "matchLabels": { ORAN_SLICE_LABEL: intent_name } } } ] }
            ]
        }
    });

    let resources = vec![
        KrmResource {
            filename: "intent.yaml".to_string(),
            manifest: intent_copy,
        },
        KrmResource {
            filename: "servicemonitor.yaml".to_string(),
            manifest: service_monitor,
        },
        KrmResource {
            filename: "networkpolicy.yaml".to_string(),
            manifest: network_policy,
        },
    ];

    let kptfile = kptfile::build_kptfile(
        &package_name,
        &format!("slice orchestration for {intent_name}"),
        &kptfile::SetterContext {
            intent_name: &intent_name,
            function: None,
            site: "",
            cluster: "",
            cloud_type: "",
            namespace: MANAGEMENT_NAMESPACE,
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
            category: PackageCategory::SliceOrchestration,
        },
        resources,
        kptfile,
        validation_rules: vec![ValidationRule::RequiredLabels, ValidationRule::QosAnnotations],
        dependencies: vec![DEP_ORAN_COMMON.to_string()],
        targets: vec![crate::package::DeploymentTarget {
            cluster: String::new(),
            namespace: MANAGEMENT_NAMESPACE.to_string(),
            cloud_type: String::new(),
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
#[path = "orchestration_tests.rs"]
mod orchestration_tests;
