// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the engine's pure helpers: validation, deadlines and
//! requeue cadence. The full phase flow is exercised end-to-end in the
//! wiremock-backed integration tests.

#[cfg(test)]
mod tests {
    use crate::reconcilers::intent::{intent_deadline, requeue_for, validate_intent};
    use crate::crd::{
        DeploymentStrategy, IntentPhase, NetworkFunctionSpec, NetworkFunctionType,
        NetworkSliceIntentSpec, PlacementHints, QosProfile, ResourceRequirements, RolloutStrategy,
        SliceType,
    };
    use kube::runtime::controller::Action;
    use std::time::Duration;

    fn valid_spec() -> NetworkSliceIntentSpec {
        NetworkSliceIntentSpec {
            intent: "Deploy an eMBB slice".to_string(),
            qos_profile: QosProfile {
                bandwidth: "4.5Mbps".to_string(),
                latency: "10ms".to_string(),
                reliability: Some("0.999".to_string()),
                slice_type: Some(SliceType::Embb),
            },
            network_functions: vec![NetworkFunctionSpec {
                r#type: NetworkFunctionType::Gnb,
                placement: PlacementHints::default(),
                resources: ResourceRequirements {
                    cpu_cores: 2.0,
                    memory_gb: 4.0,
                    storage_gb: 10.0,
                },
                config: None,
            }],
            deployment_strategy: None,
            target_clusters: None,
        }
    }

    #[test]
    fn test_valid_spec_passes() {
        assert!(validate_intent(&valid_spec()).is_ok());
    }

    #[test]
    fn test_empty_bandwidth_is_rejected() {
        let mut spec = valid_spec();
        spec.qos_profile.bandwidth = "  ".to_string();
        let err = validate_intent(&spec).unwrap_err();
        assert_eq!(err.reason(), "ValidationError");
        assert!(err.to_string().contains("bandwidth"));
    }

    #[test]
    fn test_malformed_latency_is_rejected() {
        let mut spec = valid_spec();
        spec.qos_profile.latency = "fast".to_string();
        assert!(validate_intent(&spec).is_err());
    }

    #[test]
    fn test_empty_function_list_is_rejected() {
        let mut spec = valid_spec();
        spec.network_functions.clear();
        let err = validate_intent(&spec).unwrap_err();
        assert!(err.to_string().contains("network function"));
    }

    #[test]
    fn test_bad_reliability_is_rejected() {
        let mut spec = valid_spec();
        spec.qos_profile.reliability = Some("2.0".to_string());
        assert!(validate_intent(&spec).is_err());
    }

    #[test]
    fn test_bad_strategy_timeout_is_rejected() {
        let mut spec = valid_spec();
        spec.deployment_strategy = Some(DeploymentStrategy {
            strategy: RolloutStrategy::Rolling,
            timeout: Some("soon".to_string()),
        });
        assert!(validate_intent(&spec).is_err());
    }

    #[test]
    fn test_default_deadline_is_ten_minutes() {
        assert_eq!(intent_deadline(&valid_spec()), Duration::from_secs(600));
    }

    #[test]
    fn test_strategy_timeout_overrides_deadline() {
        let mut spec = valid_spec();
        spec.deployment_strategy = Some(DeploymentStrategy {
            strategy: RolloutStrategy::Canary,
            timeout: Some("5m".to_string()),
        });
        assert_eq!(intent_deadline(&spec), Duration::from_secs(300));
    }

    #[test]
    fn test_requeue_policy_per_phase() {
        assert_eq!(
            requeue_for(IntentPhase::Pending),
            Action::requeue(Duration::from_secs(2))
        );
        assert_eq!(
            requeue_for(IntentPhase::Planning),
            Action::requeue(Duration::from_secs(2))
        );
        assert_eq!(
            requeue_for(IntentPhase::Packaging),
            Action::requeue(Duration::from_secs(5))
        );
        assert_eq!(
            requeue_for(IntentPhase::Deploying),
            Action::requeue(Duration::from_secs(30))
        );
        assert_eq!(
            requeue_for(IntentPhase::Ready),
            Action::requeue(Duration::from_secs(300))
        );
        assert_eq!(requeue_for(IntentPhase::Failed), Action::await_change());
    }
}
