// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Package materialization for network slice intents.
//!
//! The materializer turns an intent plus its placement decisions into three
//! classes of deployment packages:
//!
//! 1. **Function packages**, one per network function: Namespace, Deployment,
//!    Service, ConfigMap and NetworkPolicy, rendered from the function spec,
//!    its placement decision, the intent's QoS profile and cluster metadata.
//! 2. **A slice-orchestration package**, one per intent: a copy of the intent
//!    record scoped to the management namespace, a ServiceMonitor and a
//!    slice-wide NetworkPolicy.
//! 3. **Sync-wiring packages**, one per target cluster: the RootSync/RepoSync
//!    objects pointing the cluster's sync agent at the Git directory where the
//!    packages land.
//!
//! Rendering is deterministic: two invocations with the same intent and
//! decisions produce byte-identical resources except for the
//! `mano.oran.io/generated-at` annotation, whose value is injected by the
//! caller.

pub mod functions;
pub mod kptfile;
pub mod orchestration;
pub mod syncwiring;
pub mod validation;

use crate::constants::MAX_PACKAGE_NAME_LEN;
use crate::crd::{NetworkFunctionType, NetworkSliceIntent, PlacementDecision};
use crate::errors::IntentError;
use crate::qos;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub use kptfile::{Kptfile, KptFunction};
pub use validation::ValidationRule;

/// Which of the three package classes a package belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PackageCategory {
    /// One network-function workload.
    Function,
    /// Slice-wide orchestration resources.
    SliceOrchestration,
    /// RootSync/RepoSync wiring for one target cluster.
    SyncWiring,
}

impl PackageCategory {
    /// Label value used in metrics and package metadata.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageCategory::Function => "function",
            PackageCategory::SliceOrchestration => "slice-orchestration",
            PackageCategory::SyncWiring => "sync-wiring",
        }
    }
}

/// Package metadata block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    /// Deterministic DNS-label package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Labels stamped on the package.
    pub labels: BTreeMap<String, String>,
    /// Annotations stamped on the package (includes the render timestamp).
    pub annotations: BTreeMap<String, String>,
    /// Package class.
    pub category: PackageCategory,
}

/// A single rendered KRM document plus the filename it lands under in the
/// package directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KrmResource {
    /// Filename within the package, e.g. `deployment.yaml`.
    pub filename: String,
    /// The full manifest. Keys serialize in sorted order, which is what makes
    /// re-rendering byte-identical.
    pub manifest: Value,
}

impl KrmResource {
    /// The manifest's `kind`, empty when absent.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.manifest["kind"].as_str().unwrap_or_default()
    }
}

/// Where a package is delivered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTarget {
    /// Target workload cluster.
    pub cluster: String,
    /// Namespace the package's resources land in.
    pub namespace: String,
    /// Cloud tier of the target.
    pub cloud_type: String,
}

/// Outcome of rendering and in-process validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatus {
    /// Whether rendering completed.
    pub rendered: bool,
    /// Render timestamp (RFC3339), as injected by the caller.
    pub timestamp: String,
    /// Validation-rule failures.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Non-fatal findings.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// A rendered deployment package: resources plus its pipeline manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub metadata: PackageMetadata,
    /// Rendered KRM documents, in a stable order.
    pub resources: Vec<KrmResource>,
    /// The Kptfile-shaped pipeline manifest embedded in the package.
    pub kptfile: Kptfile,
    /// Declarative rules checked in-process after rendering.
    pub validation_rules: Vec<ValidationRule>,
    /// Name-based package dependencies; never inlined.
    pub dependencies: Vec<String>,
    /// Delivery targets.
    pub targets: Vec<DeploymentTarget>,
    pub render_status: RenderStatus,
}

impl Package {
    /// Find the first rendered resource of the given kind.
    #[must_use]
    pub fn resource_of_kind(&self, kind: &str) -> Option<&KrmResource> {
        self.resources.iter().find(|r| r.kind() == kind)
    }
}

/// Project a string into a DNS-label-legal form: lowercase, dashes for
/// anything illegal, truncated to `max_len`, no leading/trailing dashes.
#[must_use]
pub fn dns_label(raw: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.truncate(max_len);
    out.trim_matches('-').to_string()
}

/// Deterministic function-package name: `<intent>-<type-lowercase>`,
/// DNS-label-legal and at most fifty characters.
#[must_use]
pub fn function_package_name(intent_name: &str, function: NetworkFunctionType) -> String {
    dns_label(
        &format!("{intent_name}-{}", function.as_lowercase()),
        MAX_PACKAGE_NAME_LEN,
    )
}

/// Deterministic slice-orchestration package name.
#[must_use]
pub fn orchestration_package_name(intent_name: &str) -> String {
    dns_label(&format!("{intent_name}-slice"), MAX_PACKAGE_NAME_LEN)
}

/// Deterministic sync-wiring package name for one target cluster.
#[must_use]
pub fn sync_package_name(intent_name: &str, cluster: &str) -> String {
    dns_label(&format!("{intent_name}-sync-{cluster}"), MAX_PACKAGE_NAME_LEN)
}

/// Namespace a function's workload runs in: `<intent>-<type-lowercase>`.
#[must_use]
pub fn function_namespace(intent_name: &str, function: NetworkFunctionType) -> String {
    dns_label(
        &format!("{intent_name}-{}", function.as_lowercase()),
        MAX_PACKAGE_NAME_LEN,
    )
}

/// The slice-wide namespace: `slice-<intent>`.
#[must_use]
pub fn slice_namespace(intent_name: &str) -> String {
    dns_label(&format!("slice-{intent_name}"), MAX_PACKAGE_NAME_LEN)
}

/// Parsed QoS values threaded through every renderer.
#[derive(Clone, Debug)]
pub struct QosContext {
    pub bandwidth_mbps: f64,
    pub latency_ms: f64,
    pub qos_class: qos::QosClass,
    pub slice_type: crate::crd::SliceType,
    /// Raw annotation values, kept verbatim from the spec.
    pub bandwidth_raw: String,
    pub latency_raw: String,
}

impl QosContext {
    /// Parse the intent's QoS profile into a render context.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::Validation`] when the profile is malformed.
    pub fn from_profile(profile: &crate::crd::QosProfile) -> Result<Self, IntentError> {
        let bandwidth_mbps = qos::parse_bandwidth_mbps(&profile.bandwidth)?;
        let latency_ms = qos::parse_latency_ms(&profile.latency)?;
        Ok(Self {
            bandwidth_mbps,
            latency_ms,
            qos_class: qos::QosClass::from_latency_ms(latency_ms),
            slice_type: profile.slice_type.unwrap_or(crate::crd::SliceType::Balanced),
            bandwidth_raw: profile.bandwidth.clone(),
            latency_raw: profile.latency.clone(),
        })
    }
}

/// Cloud tier of a target cluster: the hint of the first function placed on
/// it, falling back to edge like the function renderer does.
fn cluster_cloud_type(
    intent: &NetworkSliceIntent,
    decisions: &[PlacementDecision],
    cluster: &str,
) -> String {
    decisions
        .iter()
        .filter(|d| d.cluster == cluster)
        .find_map(|d| {
            intent
                .spec
                .network_functions
                .iter()
                .find(|f| f.r#type == d.function)
                .and_then(|f| f.placement.cloud_type)
        })
        .map_or_else(|| "edge".to_string(), |ct| ct.to_string())
}

/// Materialize every package for an intent.
///
/// Produces one function package per network function, one
/// slice-orchestration package, and one sync-wiring package per distinct
/// target cluster, then runs each package's declarative validation rules
/// in-process. `generated_at` is the RFC3339 render timestamp; it is the only
/// input that may vary between otherwise-identical invocations.
///
/// # Errors
///
/// Returns [`IntentError::Validation`] for a malformed QoS profile,
/// [`IntentError::Render`] when a function has no matching decision, and
/// [`IntentError::ValidationRule`] when a rendered package violates one of
/// its rules.
pub fn materialize(
    intent: &NetworkSliceIntent,
    decisions: &[PlacementDecision],
    generated_at: &str,
) -> Result<Vec<Package>, IntentError> {
    let intent_name = intent.name_any();
    let qos_ctx = QosContext::from_profile(&intent.spec.qos_profile)?;

    let mut packages = Vec::with_capacity(intent.spec.network_functions.len() + 2);

    for function in &intent.spec.network_functions {
        let decision = decisions
            .iter()
            .find(|d| d.function == function.r#type)
            .ok_or_else(|| IntentError::Render {
                package: function_package_name(&intent_name, function.r#type),
                reason: format!("no placement decision for function {}", function.r#type),
                transient: false,
            })?;

        packages.push(functions::render_function_package(
            &intent_name,
            function,
            decision,
            &qos_ctx,
            generated_at,
        )?);
    }

    packages.push(orchestration::render_orchestration_package(
        intent,
        &qos_ctx,
        generated_at,
    )?);

    // One sync-wiring package per distinct target cluster, in sorted order
    // so the package vector is deterministic. A cluster's cloud tier is the
    // tier of the functions placed on it.
    let mut clusters: Vec<&str> = decisions.iter().map(|d| d.cluster.as_str()).collect();
    clusters.sort_unstable();
    clusters.dedup();
    for cluster in clusters {
        let cloud_type = cluster_cloud_type(intent, decisions, cluster);
        packages.push(syncwiring::render_sync_package(
            &intent_name,
            cluster,
            &cloud_type,
            &qos_ctx,
            generated_at,
        )?);
    }

    for package in &mut packages {
        validation::run_rules(package)?;
    }

    debug!(
        intent = %intent_name,
        packages = packages.len(),
        "Materialized packages"
    );
    Ok(packages)
}
