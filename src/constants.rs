// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the nephio-adapter operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// API Constants
// ============================================================================

/// API group for the network slice CRDs
pub const API_GROUP: &str = "mano.oran.io";

/// API version for the network slice CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "mano.oran.io/v1alpha1";

/// Kind name for the `NetworkSliceIntent` resource
pub const KIND_NETWORK_SLICE_INTENT: &str = "NetworkSliceIntent";

// ============================================================================
// Requeue Policy Constants
// ============================================================================

/// Requeue between internal state-machine steps (Pending, Planning)
pub const REQUEUE_INTERNAL_SECS: u64 = 2;

/// Requeue while the intent is in the Packaging phase
pub const REQUEUE_PACKAGING_SECS: u64 = 5;

/// Requeue while the intent is in the Deploying phase
pub const REQUEUE_DEPLOYING_SECS: u64 = 30;

/// Requeue (health poll) while the intent is Ready
pub const REQUEUE_READY_SECS: u64 = 300;

/// Requeue duration for controller errors
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Retry / Backoff Constants
// ============================================================================

/// Base interval for transient-error backoff (2 seconds)
pub const BACKOFF_BASE_SECS: u64 = 2;

/// Cap for transient-error backoff (60 seconds)
pub const BACKOFF_CAP_SECS: u64 = 60;

/// Jitter applied to each backoff interval (±20%)
pub const BACKOFF_JITTER_FACTOR: f64 = 0.2;

/// Transient failures tolerated per phase before the intent is declared Failed
pub const MAX_RETRIES_PER_PHASE: i32 = 5;

/// Optimistic-concurrency retries for status writes
pub const MAX_STATUS_WRITE_CONFLICTS: u32 = 3;

// ============================================================================
// Phase Timeout Constants
// ============================================================================

/// End-to-end deadline for an intent, Pending through Ready (10 minutes)
pub const INTENT_DEADLINE: Duration = Duration::from_secs(600);

/// Upper bound for a single Planning pass
pub const PLANNING_PHASE_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound for a single Packaging pass
pub const PACKAGING_PHASE_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// External Service Timeouts
// ============================================================================

/// Per-call timeout for inventory queries
pub const INVENTORY_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call timeout for package-revision operations
pub const REVISION_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-call timeout for deployment-status polls
pub const DEPLOYMENT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on polling for a single Draft→Proposed→Published lifecycle transition
pub const REVISION_LIFECYCLE_TRANSITION_CAP: Duration = Duration::from_secs(120);

/// Interval between lifecycle-readiness polls
pub const REVISION_LIFECYCLE_POLL_SECS: u64 = 5;

// ============================================================================
// Publishing Constants
// ============================================================================

/// Maximum package revisions created/advanced in parallel per intent
pub const PUBLISH_CONCURRENCY: usize = 4;

/// Version recorded for rendered packages
pub const PACKAGE_VERSION: &str = "v1";

/// Workspace name used for draft package revisions
pub const PACKAGE_WORKSPACE: &str = "main";

/// Default management repository for slice-orchestration packages
pub const DEFAULT_MANAGEMENT_REPOSITORY: &str = "mano-management";

/// Namespace the slice-orchestration package is scoped to
pub const MANAGEMENT_NAMESPACE: &str = "mano-system";

/// Maximum length of a derived package name (DNS label budget)
pub const MAX_PACKAGE_NAME_LEN: usize = 50;

// ============================================================================
// Network Function Port Constants
// ============================================================================

/// NGAP signalling port (SCTP) on the gNB
pub const PORT_NGAP: i32 = 38412;

/// GTP-U user-plane tunnel port (UDP)
pub const PORT_GTPU: i32 = 2152;

/// PFCP session-control port (UDP) on the UPF
pub const PORT_PFCP: i32 = 8805;

/// Service-based-interface (HTTP/2) port on control-plane functions
pub const PORT_SBI: i32 = 8080;

/// F1 control-plane port (SCTP) between CU and DU
pub const PORT_F1C: i32 = 38472;

// ============================================================================
// Workload Constants
// ============================================================================

/// Non-root UID network functions run as (TN excepted)
pub const NF_RUN_AS_UID: i64 = 1000;

/// Dependency every function package records
pub const DEP_ORAN_COMMON: &str = "oran-common@v1.0.0";

/// Per-domain common package for RAN functions (gNB/CU/DU)
pub const DEP_ORAN_RAN_COMMON: &str = "oran-ran-common@v1.0.0";

/// Per-domain common package for core-network functions (AMF/SMF/UPF)
pub const DEP_ORAN_CN_COMMON: &str = "oran-cn-common@v1.0.0";

/// Per-domain common package for transport functions (TN)
pub const DEP_ORAN_TN_COMMON: &str = "oran-tn-common@v1.0.0";

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election renew deadline (10 seconds)
pub const DEFAULT_LEASE_RENEW_DEADLINE_SECS: u64 = 10;

/// Default leader election retry period (2 seconds)
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 2;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Default number of reconciler workers (Tokio worker threads)
pub const DEFAULT_WORKER_THREADS: usize = 8;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for the Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for the Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for the metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
