// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kptfile pipeline manifests embedded in every package.
//!
//! Each package carries a `Kptfile`-shaped manifest naming the mutator and
//! validator functions its renderer pipeline runs: apply-setters with the
//! variable bundle, set-namespace, set-labels, set-annotations, a per-type
//! apply-replacements, then a strict schema validator, a domain validator and
//! a required-labels policy check.

use crate::crd::NetworkFunctionType;
use crate::labels::{
    K8S_NAME, NEPHIO_COMPONENT_LABEL, ORAN_CLOUD_TYPE_LABEL, ORAN_QOS_BANDWIDTH_ANNOTATION,
    ORAN_QOS_CLASS_ANNOTATION, ORAN_QOS_LATENCY_ANNOTATION, ORAN_VNF_TYPE_LABEL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upstream kpt function images.
const FN_APPLY_SETTERS: &str = "gcr.io/kpt-fn/apply-setters:v0.2.0";
const FN_SET_NAMESPACE: &str = "gcr.io/kpt-fn/set-namespace:v0.4.1";
const FN_SET_LABELS: &str = "gcr.io/kpt-fn/set-labels:v0.2.0";
const FN_SET_ANNOTATIONS: &str = "gcr.io/kpt-fn/set-annotations:v0.1.4";
const FN_APPLY_REPLACEMENTS: &str = "gcr.io/kpt-fn/apply-replacements:v0.1.1";
const FN_KUBEVAL: &str = "gcr.io/kpt-fn/kubeval:v0.3.0";

/// In-house validator images.
const FN_DOMAIN_VALIDATOR: &str = "registry.oran.io/fn/domain-validator:v1.0.0";
const FN_REQUIRED_LABELS: &str = "registry.oran.io/fn/required-labels:v1.0.0";

/// A single named function in the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KptFunction {
    /// Function image reference.
    pub image: String,

    /// Inline function configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_map: BTreeMap<String, String>,
}

impl KptFunction {
    fn new(image: &str, config: &[(&str, &str)]) -> Self {
        Self {
            image: image.to_string(),
            config_map: config
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

/// Ordered mutators and validators.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mutators: Vec<KptFunction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<KptFunction>,
}

/// Kptfile metadata block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KptfileMetadata {
    pub name: String,
}

/// Kptfile info block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KptfileInfo {
    pub description: String,
}

/// Inventory block identifying the package's applied-resource set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KptfileInventory {
    pub namespace: String,
    pub name: String,
    /// Stable identifier derived from the package name.
    pub inventory_id: String,
}

/// The `Kptfile`-shaped pipeline manifest embedded in every package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kptfile {
    pub api_version: String,
    pub kind: String,
    pub metadata: KptfileMetadata,
    pub info: KptfileInfo,
    pub pipeline: Pipeline,
    pub inventory: KptfileInventory,
}

/// Variable bundle injected through apply-setters.
pub struct SetterContext<'a> {
    pub intent_name: &'a str,
    pub function: Option<NetworkFunctionType>,
    pub site: &'a str,
    pub cluster: &'a str,
    pub cloud_type: &'a str,
    pub namespace: &'a str,
    pub bandwidth: &'a str,
    pub latency: &'a str,
    pub qos_class: &'a str,
}

/// Build the Kptfile for a package.
///
/// The mutator order is load-bearing: setters run before namespace, labels
/// and annotations so the injected values are what downstream mutators see.
#[must_use]
pub fn build_kptfile(package_name: &str, description: &str, ctx: &SetterContext<'_>) -> Kptfile {
    let vnf_type = ctx.function.map_or("none", |f| f.as_lowercase());

    let mut mutators = vec![
        KptFunction::new(
            FN_APPLY_SETTERS,
            &[
                ("intent", ctx.intent_name),
                ("site", ctx.site),
                ("cluster", ctx.cluster),
                ("cloud-type", ctx.cloud_type),
                ("vnf-type", vnf_type),
                ("qos-bandwidth", ctx.bandwidth),
                ("qos-latency", ctx.latency),
            ],
        ),
        KptFunction::new(FN_SET_NAMESPACE, &[("namespace", ctx.namespace)]),
        KptFunction::new(
            FN_SET_LABELS,
            &[
                ("app", package_name),
                (K8S_NAME, vnf_type),
                (ORAN_VNF_TYPE_LABEL, vnf_type),
                (ORAN_CLOUD_TYPE_LABEL, ctx.cloud_type),
                (NEPHIO_COMPONENT_LABEL, "network-slice"),
            ],
        ),
        KptFunction::new(
            FN_SET_ANNOTATIONS,
            &[
                (ORAN_QOS_BANDWIDTH_ANNOTATION, ctx.bandwidth),
                (ORAN_QOS_LATENCY_ANNOTATION, ctx.latency),
                (ORAN_QOS_CLASS_ANNOTATION, ctx.qos_class),
            ],
        ),
    ];

    if let Some(function) = ctx.function {
        mutators.push(KptFunction::new(
            FN_APPLY_REPLACEMENTS,
            &[(
                "config-path",
                &format!("{}-replacements.yaml", function.as_lowercase()),
            )],
        ));
    }

    let validators = vec![
        KptFunction::new(FN_KUBEVAL, &[("strict", "true")]),
        KptFunction::new(
            FN_DOMAIN_VALIDATOR,
            &[("vnf-type", vnf_type), ("qos-class", ctx.qos_class)],
        ),
        KptFunction::new(FN_REQUIRED_LABELS, &[]),
    ];

    Kptfile {
        api_version: "kpt.dev/v1".to_string(),
        kind: "Kptfile".to_string(),
        metadata: KptfileMetadata {
            name: package_name.to_string(),
        },
        info: KptfileInfo {
            description: description.to_string(),
        },
        pipeline: Pipeline {
            mutators,
            validators,
        },
        inventory: KptfileInventory {
            namespace: ctx.namespace.to_string(),
            name: package_name.to_string(),
            inventory_id: format!("{}-{}", ctx.intent_name, package_name),
        },
    }
}

#[cfg(test)]
#[path = "kptfile_tests.rs"]
mod kptfile_tests;
