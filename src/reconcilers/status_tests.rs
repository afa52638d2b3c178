// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for status condition helpers and the batched updater.

#[cfg(test)]
mod tests {
    use crate::reconcilers::status::{create_condition, find_condition, IntentStatusUpdater};
    use crate::crd::{
        IntentPhase, NetworkFunctionSpec, NetworkFunctionType, NetworkSliceIntent,
        NetworkSliceIntentSpec, PlacementHints, QosProfile, ResourceRequirements,
    };
    use crate::errors::IntentError;

    fn intent() -> NetworkSliceIntent {
        NetworkSliceIntent::new(
            "slice-embb-001",
            NetworkSliceIntentSpec {
                intent: "test".to_string(),
                qos_profile: QosProfile {
                    bandwidth: "4.5Mbps".to_string(),
                    latency: "10ms".to_string(),
                    reliability: None,
                    slice_type: None,
                },
                network_functions: vec![NetworkFunctionSpec {
                    r#type: NetworkFunctionType::Gnb,
                    placement: PlacementHints::default(),
                    resources: ResourceRequirements {
                        cpu_cores: 1.0,
                        memory_gb: 1.0,
                        storage_gb: 1.0,
                    },
                    config: None,
                }],
                deployment_strategy: None,
                target_clusters: None,
            },
        )
    }

    #[test]
    fn test_create_condition_shape() {
        let condition = create_condition("Ready", "True", "AllFunctionsReady", "3 of 3 ready");
        assert_eq!(condition.r#type, "Ready");
        assert_eq!(condition.status, "True");
        assert_eq!(condition.reason.as_deref(), Some("AllFunctionsReady"));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![
            create_condition("Ready", "False", "Progressing", "working"),
            create_condition("Progressing", "True", "Progressing", "working"),
        ];
        assert!(find_condition(&conditions, "Ready").is_some());
        assert!(find_condition(&conditions, "Degraded").is_none());
    }

    #[test]
    fn test_transition_stamps_phase_bookkeeping() {
        let mut updater = IntentStatusUpdater::new(&intent());
        updater.status_mut().retry_count = Some(3);

        updater.transition(IntentPhase::Planning, "requesting sites");

        assert_eq!(updater.status().phase, IntentPhase::Planning);
        assert_eq!(updater.status().message.as_deref(), Some("requesting sites"));
        assert!(updater.status().phase_started_at.is_some());
        assert!(updater.status().started_at.is_some());
        assert!(updater.status().retry_count.is_none(), "reset on transition");
    }

    #[test]
    fn test_set_condition_upserts_by_type() {
        let mut updater = IntentStatusUpdater::new(&intent());

        updater.set_condition(create_condition("Ready", "False", "Progressing", "a"));
        updater.set_condition(create_condition("Ready", "False", "Progressing", "b"));
        assert_eq!(updater.status().conditions.len(), 1);
        assert_eq!(
            updater.status().conditions[0].message.as_deref(),
            Some("b")
        );

        updater.set_condition(create_condition("Progressing", "True", "Progressing", "c"));
        assert_eq!(updater.status().conditions.len(), 2);
    }

    #[test]
    fn test_set_condition_preserves_transition_time_when_unchanged() {
        let mut updater = IntentStatusUpdater::new(&intent());

        let mut first = create_condition("Ready", "False", "Progressing", "a");
        first.last_transition_time = Some("2025-01-01T00:00:00Z".to_string());
        updater.set_condition(first);

        // Same status value: the original transition time survives.
        updater.set_condition(create_condition("Ready", "False", "Progressing", "b"));
        assert_eq!(
            updater.status().conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00Z")
        );

        // Flipped status value: the transition time moves.
        updater.set_condition(create_condition("Ready", "True", "AllFunctionsReady", "c"));
        assert_ne!(
            updater.status().conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00Z")
        );
    }

    /// Invariant 3: a Failed status always carries a condition whose reason
    /// comes from the enumerated error-kind set.
    #[test]
    fn test_failure_condition_uses_enumerated_reason() {
        let mut updater = IntentStatusUpdater::new(&intent());
        let err = IntentError::Unplaceable {
            function: "gNB".to_string(),
            reason: "no edge site".to_string(),
        };
        updater.set_failure_condition(&err);

        let ready = find_condition(&updater.status().conditions, "Ready").unwrap();
        assert_eq!(ready.status, "False");
        let reason = ready.reason.as_deref().unwrap();
        assert!(crate::status_reasons::is_error_kind_reason(reason));
        assert!(ready.message.as_deref().unwrap().contains("gNB"));
    }

    #[test]
    fn test_retry_counter_accumulates_until_transition() {
        let mut updater = IntentStatusUpdater::new(&intent());
        assert_eq!(updater.bump_retry_count(), 1);
        assert_eq!(updater.bump_retry_count(), 2);
        assert_eq!(updater.bump_retry_count(), 3);

        updater.transition(IntentPhase::Packaging, "rendering");
        assert_eq!(updater.bump_retry_count(), 1);
    }
}
