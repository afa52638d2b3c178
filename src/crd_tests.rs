// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        CloudType, IntentPhase, NetworkFunctionSpec, NetworkFunctionType, NetworkSliceIntentSpec,
        PlacementHints, QosProfile, ResourceRequirements, SliceType,
    };

    fn sample_spec() -> NetworkSliceIntentSpec {
        NetworkSliceIntentSpec {
            intent: "Deploy a 4.5 Mbps video slice in Tokyo".to_string(),
            qos_profile: QosProfile {
                bandwidth: "4.5Mbps".to_string(),
                latency: "10ms".to_string(),
                reliability: Some("0.999".to_string()),
                slice_type: Some(SliceType::Embb),
            },
            network_functions: vec![NetworkFunctionSpec {
                r#type: NetworkFunctionType::Gnb,
                placement: PlacementHints {
                    cloud_type: Some(CloudType::Edge),
                    ..Default::default()
                },
                resources: ResourceRequirements {
                    cpu_cores: 4.0,
                    memory_gb: 8.0,
                    storage_gb: 20.0,
                },
                config: None,
            }],
            deployment_strategy: None,
            target_clusters: Some(vec!["edge01-tokyo".to_string()]),
        }
    }

    #[test]
    fn test_spec_serializes_camel_case() {
        let spec = sample_spec();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["qosProfile"]["bandwidth"], "4.5Mbps");
        assert_eq!(json["qosProfile"]["sliceType"], "eMBB");
        assert_eq!(json["networkFunctions"][0]["type"], "gNB");
        assert_eq!(json["networkFunctions"][0]["placement"]["cloudType"], "edge");
        assert_eq!(json["networkFunctions"][0]["resources"]["cpuCores"], 4.0);
        assert_eq!(json["targetClusters"][0], "edge01-tokyo");
    }

    #[test]
    fn test_spec_round_trips() {
        let spec = sample_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: NetworkSliceIntentSpec = serde_json::from_str(&json).unwrap();

        assert_eq!(back.qos_profile, spec.qos_profile);
        assert_eq!(back.network_functions, spec.network_functions);
        assert_eq!(back.target_clusters, spec.target_clusters);
    }

    #[test]
    fn test_function_type_rename_variants() {
        for (ty, wire, lower) in [
            (NetworkFunctionType::Gnb, "\"gNB\"", "gnb"),
            (NetworkFunctionType::Amf, "\"AMF\"", "amf"),
            (NetworkFunctionType::Smf, "\"SMF\"", "smf"),
            (NetworkFunctionType::Upf, "\"UPF\"", "upf"),
            (NetworkFunctionType::Cu, "\"CU\"", "cu"),
            (NetworkFunctionType::Du, "\"DU\"", "du"),
            (NetworkFunctionType::Tn, "\"TN\"", "tn"),
        ] {
            assert_eq!(serde_json::to_string(&ty).unwrap(), wire);
            assert_eq!(ty.as_lowercase(), lower);
        }
    }

    #[test]
    fn test_unknown_slice_type_is_rejected() {
        let result: Result<SliceType, _> = serde_json::from_str("\"turbo\"");
        assert!(result.is_err(), "unknown slice type must not deserialize");
    }

    #[test]
    fn test_phase_defaults_to_pending() {
        assert_eq!(IntentPhase::default(), IntentPhase::Pending);
    }

    #[test]
    fn test_placement_hints_default_is_unconstrained() {
        let hints = PlacementHints::default();
        assert!(hints.cloud_type.is_none());
        assert!(hints.region.is_none());
        assert!(hints.zone.is_none());
        assert!(hints.site.is_none());
        assert!(hints.affinity.is_none());
    }

    #[test]
    fn test_ran_domain_classification() {
        assert!(NetworkFunctionType::Gnb.is_ran());
        assert!(NetworkFunctionType::Cu.is_ran());
        assert!(NetworkFunctionType::Du.is_ran());
        assert!(!NetworkFunctionType::Amf.is_ran());
        assert!(!NetworkFunctionType::Upf.is_ran());
        assert!(!NetworkFunctionType::Tn.is_ran());
    }
}
