// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the nephio-adapter operator.
//!
//! Two families live here: the contractual slice metrics
//! (`slice_deployment_time_seconds`, `vnf_placement_score`,
//! `package_distribution_success_rate`) whose names are part of the
//! operator's external contract, and operational reconciliation metrics
//! under the `nephio_adapter_` prefix.
//!
//! # Example
//!
//! ```rust,no_run
//! use nephio_adapter::metrics::{record_reconciliation_success, record_placement_score};
//!
//! record_reconciliation_success("NetworkSliceIntent", std::time::Duration::from_secs(1));
//! record_placement_score("upf", "site-tokyo-01", "default", 92.5);
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for operational metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "nephio_adapter";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Contractual Slice Metrics
// ============================================================================

/// End-to-end slice deployment time, Pending through Ready
///
/// Labels:
/// - `slice_type`: eMBB, uRLLC, mIoT or balanced
/// - `target_cluster`: the (first) cluster the slice landed on
/// - `qos_profile`: derived QoS class
pub static SLICE_DEPLOYMENT_TIME_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        "slice_deployment_time_seconds",
        "End-to-end network slice deployment time in seconds",
    )
    .buckets(vec![10.0, 30.0, 60.0, 120.0, 240.0, 360.0, 480.0, 600.0]);
    let histogram = HistogramVec::new(opts, &["slice_type", "target_cluster", "qos_profile"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Placement score chosen for each function
///
/// Labels:
/// - `vnf_type`: the function type placed
/// - `site_id`: chosen site
/// - `placement_policy`: scoring policy in effect
pub static VNF_PLACEMENT_SCORE: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "vnf_placement_score",
        "Placement score of the chosen site per network function",
    );
    let gauge = GaugeVec::new(opts, &["vnf_type", "site_id", "placement_policy"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Package distribution outcomes per repository and cluster
///
/// Labels:
/// - `source_repo`: repository the package was published to
/// - `target_cluster`: cluster the package targets
/// - `package_type`: function, slice-orchestration or sync-wiring
pub static PACKAGE_DISTRIBUTION_SUCCESS_RATE: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "package_distribution_success_rate",
        "Package distribution outcomes by repository, cluster and package type",
    );
    let counter = CounterVec::new(opts, &["source_repo", "target_cluster", "package_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `NetworkSliceIntent`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `resource_type`: Kind of resource
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of errors by resource type and error category
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `error_type`: Stable machine-readable reason (e.g., `InventoryUnavailable`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error category",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - Duration of the reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `duration` - Duration of the reconciliation before failure
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where the error occurred
/// * `error_type` - Stable machine-readable reason
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Record the end-to-end deployment time of a slice
pub fn record_slice_deployment_time(
    slice_type: &str,
    target_cluster: &str,
    qos_profile: &str,
    duration_secs: f64,
) {
    SLICE_DEPLOYMENT_TIME_SECONDS
        .with_label_values(&[slice_type, target_cluster, qos_profile])
        .observe(duration_secs);
}

/// Record the chosen placement score for a function
pub fn record_placement_score(vnf_type: &str, site_id: &str, policy: &str, score: f64) {
    VNF_PLACEMENT_SCORE
        .with_label_values(&[vnf_type, site_id, policy])
        .set(score);
}

/// Record a package distribution outcome
pub fn record_package_distribution(source_repo: &str, target_cluster: &str, package_type: &str) {
    PACKAGE_DISTRIBUTION_SUCCESS_RATE
        .with_label_values(&[source_repo, target_cluster, package_type])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        let resource_type = "TestResource";
        let duration = Duration::from_millis(500);

        record_reconciliation_success(resource_type, duration);

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&[resource_type]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_contractual_metric_names() {
        // These names are part of the external contract; a rename is a
        // breaking change for every dashboard scraping them.
        record_slice_deployment_time("eMBB", "edge01-tokyo", "low-latency", 123.0);
        record_placement_score("gnb", "site-tokyo-01", "default", 92.5);
        record_package_distribution("edge01-tokyo", "edge01-tokyo", "function");

        let metrics_text = gather_metrics().unwrap();
        assert!(metrics_text.contains("slice_deployment_time_seconds"));
        assert!(metrics_text.contains("vnf_placement_score"));
        assert!(metrics_text.contains("package_distribution_success_rate"));
    }

    #[test]
    fn test_gather_metrics() {
        record_reconciliation_success("GatherTest", Duration::from_millis(100));

        let result = gather_metrics();
        assert!(result.is_ok(), "Gathering metrics should succeed");

        let metrics_text = result.unwrap();
        assert!(
            metrics_text.contains("nephio_adapter"),
            "Metrics should contain namespace prefix"
        );
        assert!(
            metrics_text.contains("reconciliations_total"),
            "Metrics should contain reconciliation counter"
        );
    }
}
