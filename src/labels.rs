// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all rendered resources.
//!
//! This module defines standard Kubernetes labels plus the O-RAN / Nephio
//! labels and annotations the materializer stamps onto every package, to
//! ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture (e.g., "network-function")
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application (e.g., "gnb")
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Well-known label carrying the topology zone of a node
pub const K8S_ZONE: &str = "topology.kubernetes.io/zone";

/// Well-known label the API server stamps on every namespace with its own name
pub const K8S_NAMESPACE_NAME: &str = "kubernetes.io/metadata.name";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of` on every slice resource
pub const PART_OF_SLICE: &str = "network-slice";

/// Component value for rendered network-function workloads
pub const COMPONENT_NETWORK_FUNCTION: &str = "network-function";

/// Component value for the slice-orchestration package
pub const COMPONENT_SLICE_ORCHESTRATION: &str = "slice-orchestration";

/// Component value for the sync-wiring package
pub const COMPONENT_SYNC_WIRING: &str = "sync-wiring";

/// Value for `app.kubernetes.io/managed-by` on everything this operator renders
pub const MANAGED_BY_NEPHIO_ADAPTER: &str = "nephio-adapter";

// ============================================================================
// O-RAN Labels
// ============================================================================

/// Label carrying the network-function type (gnb, amf, smf, upf, cu, du, tn)
pub const ORAN_VNF_TYPE_LABEL: &str = "oran.io/vnf-type";

/// Label carrying the cloud type the workload was placed on (edge, regional, central)
pub const ORAN_CLOUD_TYPE_LABEL: &str = "oran.io/cloud-type";

/// Label carrying the inventory site the workload was placed on
pub const ORAN_SITE_LABEL: &str = "oran.io/site";

/// Label carrying the slice the workload belongs to
pub const ORAN_SLICE_LABEL: &str = "oran.io/slice";

/// Nephio component label stamped on every rendered resource
pub const NEPHIO_COMPONENT_LABEL: &str = "nephio.org/component";

// ============================================================================
// O-RAN Annotations
// ============================================================================

/// Annotation carrying the intent's bandwidth target
pub const ORAN_QOS_BANDWIDTH_ANNOTATION: &str = "oran.io/qos-bandwidth";

/// Annotation carrying the intent's latency target
pub const ORAN_QOS_LATENCY_ANNOTATION: &str = "oran.io/qos-latency";

/// Annotation carrying the QoS class derived from the latency target
pub const ORAN_QOS_CLASS_ANNOTATION: &str = "oran.io/qos-class";

/// Toleration key applied when the latency target is at or below one millisecond
pub const ORAN_ULTRA_LOW_LATENCY_KEY: &str = "oran.io/ultra-low-latency";

/// Annotation carrying the render timestamp (excluded from determinism checks)
pub const GENERATED_AT_ANNOTATION: &str = "mano.oran.io/generated-at";

// ============================================================================
// Inventory Labels
// ============================================================================

/// Site label naming the workload cluster that hosts the site
pub const SITE_CLUSTER_LABEL: &str = "mano.oran.io/cluster";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer for `NetworkSliceIntent` resources
pub const FINALIZER_NETWORK_SLICE_INTENT: &str = "nephio-adapter/finalizer";
