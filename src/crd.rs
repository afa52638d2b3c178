// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for network slice management.
//!
//! This module defines the `NetworkSliceIntent` custom resource: a declarative
//! record of a desired 5G network slice, carrying QoS targets and a list of
//! network functions. The reconciliation engine drives each intent from
//! *Pending* through *Planning*, *Packaging* and *Deploying* to *Ready*,
//! publishing a deployment package per function to per-cluster repositories
//! along the way.
//!
//! # Example: An eMBB Slice
//!
//! ```yaml
//! apiVersion: mano.oran.io/v1alpha1
//! kind: NetworkSliceIntent
//! metadata:
//!   name: slice-embb-001
//!   namespace: default
//! spec:
//!   intent: "Deploy a 4.5 Mbps video slice in Tokyo"
//!   qosProfile:
//!     bandwidth: 4.5Mbps
//!     latency: 10ms
//!     sliceType: eMBB
//!   networkFunctions:
//!     - type: gNB
//!       placement:
//!         cloudType: edge
//!       resources:
//!         cpuCores: 4
//!         memoryGb: 8
//!         storageGb: 20
//!     - type: AMF
//!       placement:
//!         cloudType: edge
//!       resources:
//!         cpuCores: 2
//!         memoryGb: 4
//!         storageGb: 10
//!   targetClusters:
//!     - edge01-tokyo
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Slice service category, per 3GPP SST conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SliceType {
    /// Enhanced mobile broadband: bandwidth-heavy.
    #[serde(rename = "eMBB")]
    Embb,
    /// Ultra-reliable low-latency communication: latency-critical.
    #[serde(rename = "uRLLC")]
    Urllc,
    /// Massive IoT: high device density, relaxed latency.
    #[serde(rename = "mIoT")]
    Miot,
    /// No dominant axis; mid-range defaults.
    #[serde(rename = "balanced")]
    Balanced,
}

impl fmt::Display for SliceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SliceType::Embb => "eMBB",
            SliceType::Urllc => "uRLLC",
            SliceType::Miot => "mIoT",
            SliceType::Balanced => "balanced",
        };
        f.write_str(s)
    }
}

/// QoS targets attached to an intent.
///
/// Bandwidth and latency are unit-suffixed strings (`"4.5Mbps"`, `"10ms"`)
/// parsed strictly during validation; malformed values fail the intent before
/// any planning happens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QosProfile {
    /// Bandwidth target with unit suffix, e.g. `"4.5Mbps"` or `"2Gbps"`.
    pub bandwidth: String,

    /// Latency target with unit suffix, e.g. `"10ms"` or `"1ms"`.
    pub latency: String,

    /// Reliability target as a fraction, e.g. `"0.9999"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<String>,

    /// Slice service category. Defaults to balanced when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_type: Option<SliceType>,
}

/// The kind of 5G workload a `NetworkFunctionSpec` asks for.
///
/// The function type is the dispatch tag selecting the package template, the
/// conventional port set, the security-context exception and the
/// function-specific validation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum NetworkFunctionType {
    /// Next-generation NodeB (radio access).
    #[serde(rename = "gNB")]
    Gnb,
    /// Access and mobility management function.
    #[serde(rename = "AMF")]
    Amf,
    /// Session management function.
    #[serde(rename = "SMF")]
    Smf,
    /// User plane function.
    #[serde(rename = "UPF")]
    Upf,
    /// Centralized unit (disaggregated RAN).
    #[serde(rename = "CU")]
    Cu,
    /// Distributed unit (disaggregated RAN).
    #[serde(rename = "DU")]
    Du,
    /// Transport network function; needs privileged network access.
    #[serde(rename = "TN")]
    Tn,
}

impl NetworkFunctionType {
    /// Lowercase form used in resource names, labels and namespaces.
    #[must_use]
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            NetworkFunctionType::Gnb => "gnb",
            NetworkFunctionType::Amf => "amf",
            NetworkFunctionType::Smf => "smf",
            NetworkFunctionType::Upf => "upf",
            NetworkFunctionType::Cu => "cu",
            NetworkFunctionType::Du => "du",
            NetworkFunctionType::Tn => "tn",
        }
    }

    /// Whether this function belongs to the RAN domain (gNB/CU/DU).
    #[must_use]
    pub fn is_ran(&self) -> bool {
        matches!(
            self,
            NetworkFunctionType::Gnb | NetworkFunctionType::Cu | NetworkFunctionType::Du
        )
    }
}

impl fmt::Display for NetworkFunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkFunctionType::Gnb => "gNB",
            NetworkFunctionType::Amf => "AMF",
            NetworkFunctionType::Smf => "SMF",
            NetworkFunctionType::Upf => "UPF",
            NetworkFunctionType::Cu => "CU",
            NetworkFunctionType::Du => "DU",
            NetworkFunctionType::Tn => "TN",
        };
        f.write_str(s)
    }
}

/// Cloud tier a function wants to land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CloudType {
    /// Far-edge sites, lowest latency, smallest capacity.
    Edge,
    /// Regional aggregation sites.
    Regional,
    /// Central data centers.
    Central,
}

impl fmt::Display for CloudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloudType::Edge => "edge",
            CloudType::Regional => "regional",
            CloudType::Central => "central",
        };
        f.write_str(s)
    }
}

/// Whether an affinity rule attracts or repels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum AffinityMode {
    /// Prefer (or require) the same site as the target function.
    Affinity,
    /// Prefer (or require) a different site from the target function.
    AntiAffinity,
}

/// Placement relationship between two functions of the same intent.
///
/// Rules are evaluated against functions already placed earlier in the
/// intent's function list; `required` rules are hard constraints, preferred
/// rules feed the geographic-affinity score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AffinityRule {
    /// The function type this rule is evaluated against.
    pub target: NetworkFunctionType,

    /// Attract or repel.
    pub mode: AffinityMode,

    /// Hard constraint when true; scoring preference when false.
    #[serde(default)]
    pub required: bool,
}

/// Placement hints for a single network function.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementHints {
    /// Cloud tier the function must land on, when specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_type: Option<CloudType>,

    /// Pin to a specific region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Pin to a specific zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Pin to a specific inventory site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,

    /// Affinity/anti-affinity rules against other functions in this intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Vec<AffinityRule>>,
}

/// Resource floor for a network function.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// CPU cores.
    pub cpu_cores: f64,

    /// Memory in gigabytes.
    pub memory_gb: f64,

    /// Storage in gigabytes.
    pub storage_gb: f64,
}

/// A single desired 5G workload within a slice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFunctionSpec {
    /// Function type; selects template, ports and validation rules.
    pub r#type: NetworkFunctionType,

    /// Where the function wants to run.
    #[serde(default)]
    pub placement: PlacementHints,

    /// Minimum resources the chosen site must be able to supply.
    pub resources: ResourceRequirements,

    /// Free-form configuration rendered into the function's `function.conf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, String>>,
}

/// Rollout strategy for the slice's workloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RolloutStrategy {
    /// In-place rolling update.
    Rolling,
    /// Parallel stack, switch on readiness.
    BlueGreen,
    /// Gradual traffic shift.
    Canary,
}

/// Deployment-strategy block of an intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
    /// How workloads are rolled out.
    pub strategy: RolloutStrategy,

    /// End-to-end timeout override with unit suffix, e.g. `"600s"`.
    /// Defaults to the engine's ten-minute deadline when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. Common types include: Ready, Progressing.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Lifecycle phase of a `NetworkSliceIntent`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum IntentPhase {
    /// Observed but not yet validated.
    #[default]
    Pending,
    /// Querying inventory and computing placement decisions.
    Planning,
    /// Rendering packages and creating package revisions.
    Packaging,
    /// Waiting for every function to report ready.
    Deploying,
    /// All functions ready; periodic health polling.
    Ready,
    /// Terminal failure; re-enters Pending on a spec edit.
    Failed,
}

impl fmt::Display for IntentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentPhase::Pending => "Pending",
            IntentPhase::Planning => "Planning",
            IntentPhase::Packaging => "Packaging",
            IntentPhase::Deploying => "Deploying",
            IntentPhase::Ready => "Ready",
            IntentPhase::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// A chosen (site, cluster) for a single function, with score and reasons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDecision {
    /// The function this decision places.
    pub function: NetworkFunctionType,

    /// Chosen inventory site id.
    pub site: String,

    /// Workload cluster hosting the chosen site.
    pub cluster: String,

    /// Final score in [0, 100].
    pub score: f64,

    /// Whether every hard constraint was satisfied. Always true for
    /// decisions the planner emits; recorded for audit.
    pub constraints_met: bool,

    /// Free-form justification strings, e.g. "latency budget met".
    #[serde(default)]
    pub justification: Vec<String>,
}

/// Observed per-function deployment state, aggregated from the external
/// deployment-management service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployedFunction {
    /// Deployment name in the target cluster.
    pub name: String,

    /// Function type.
    pub r#type: NetworkFunctionType,

    /// Target cluster.
    pub cluster: String,

    /// Namespace the function runs in.
    pub namespace: String,

    /// Reported status: Ready, Progressing or Failed.
    pub status: String,
}

/// Reference to a package revision created in the external service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevisionRef {
    /// Repository the revision lives in.
    pub repository: String,

    /// Package name within the repository.
    pub package_name: String,

    /// Revision identifier.
    pub revision: String,

    /// Workspace the draft was created in.
    pub workspace: String,

    /// Last observed lifecycle: Draft, Proposed, Published or DeletionStart.
    pub lifecycle: String,
}

/// Per-intent timing and success metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SliceMetrics {
    /// Seconds spent in Planning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_duration_seconds: Option<f64>,

    /// Seconds spent in Packaging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging_duration_seconds: Option<f64>,

    /// Seconds spent in Deploying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_duration_seconds: Option<f64>,

    /// Seconds from Pending to Ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<f64>,

    /// Fraction of functions that reached Ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
}

/// `NetworkSliceIntent` status subresource.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSliceIntentStatus {
    /// Current lifecycle phase.
    #[serde(default)]
    pub phase: IntentPhase,

    /// Human-readable summary of the current state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Generation of the spec this status reflects. The engine only re-plans
    /// when `metadata.generation` advances past this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Placement decisions persisted when Planning completed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placement_decisions: Vec<PlacementDecision>,

    /// Per-function deployment state observed in Deploying/Ready.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployed_functions: Vec<DeployedFunction>,

    /// Package revisions created for this intent. Superset of revisions
    /// attributable to this intent in the external service.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_revisions: Vec<PackageRevisionRef>,

    /// Timing and success metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SliceMetrics>,

    /// When the intent entered its first Pending phase (RFC3339).
    /// The ten-minute end-to-end deadline counts from here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    /// When the current phase was entered (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_started_at: Option<String>,

    /// Transient failures accumulated in the current phase; reset on every
    /// transition. The intent fails once this exceeds the per-phase cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i32>,
}

/// `NetworkSliceIntent` declares a desired 5G network slice.
///
/// An intent names a slice type (eMBB, uRLLC, mIoT) together with QoS targets
/// and a list of network functions. The operator plans where each function
/// should run, materializes a deployment package per function, publishes the
/// packages to per-cluster repositories through the package-revision service,
/// and reports per-function readiness in the status subresource.
///
/// The original natural-language text is carried verbatim in `spec.intent`
/// and is opaque to the operator.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mano.oran.io",
    version = "v1alpha1",
    kind = "NetworkSliceIntent",
    namespaced,
    shortname = "nsi",
    shortname = "slice",
    doc = "NetworkSliceIntent declares a desired 5G network slice: QoS targets plus a list of network functions. The operator plans placement, renders deployment packages and drives the slice to Ready.",
    printcolumn = r#"{"name":"Slice Type","type":"string","jsonPath":".spec.qosProfile.sliceType"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Functions","type":"integer","jsonPath":".status.deployedFunctions.length"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#
)]
#[kube(status = "NetworkSliceIntentStatus")]
#[serde(rename_all = "camelCase")]
pub struct NetworkSliceIntentSpec {
    /// Original natural-language intent text; opaque to the operator.
    pub intent: String,

    /// QoS targets for the slice.
    pub qos_profile: QosProfile,

    /// Desired network functions, in placement order.
    pub network_functions: Vec<NetworkFunctionSpec>,

    /// Rollout strategy and timeout override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_strategy: Option<DeploymentStrategy>,

    /// Explicit allow-list of target clusters. When present, functions may
    /// only be placed on sites hosted by one of these clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_clusters: Option<Vec<String>>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
