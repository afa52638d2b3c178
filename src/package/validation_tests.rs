// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for in-process package validation rules.

#[cfg(test)]
mod tests {
    use crate::crd::{
        CloudType, NetworkFunctionSpec, NetworkFunctionType, PlacementDecision, PlacementHints,
        QosProfile, ResourceRequirements, SliceType,
    };
    use crate::errors::IntentError;
    use crate::package::functions::render_function_package;
    use crate::package::validation::run_rules;
    use crate::package::QosContext;

    const GENERATED_AT: &str = "2025-06-01T00:00:00Z";

    fn rendered_gnb() -> crate::package::Package {
        let spec = NetworkFunctionSpec {
            r#type: NetworkFunctionType::Gnb,
            placement: PlacementHints {
                cloud_type: Some(CloudType::Edge),
                ..Default::default()
            },
            resources: ResourceRequirements {
                cpu_cores: 2.0,
                memory_gb: 4.0,
                storage_gb: 10.0,
            },
            config: None,
        };
        let decision = PlacementDecision {
            function: NetworkFunctionType::Gnb,
            site: "site-a".to_string(),
            cluster: "edge01".to_string(),
            score: 80.0,
            constraints_met: true,
            justification: vec![],
        };
        let qos = QosContext::from_profile(&QosProfile {
            bandwidth: "10Mbps".to_string(),
            latency: "5ms".to_string(),
            reliability: None,
            slice_type: Some(SliceType::Embb),
        })
        .unwrap();

        render_function_package("slice-01", &spec, &decision, &qos, GENERATED_AT).unwrap()
    }

    #[test]
    fn test_well_formed_package_passes_all_rules() {
        let mut package = rendered_gnb();
        assert!(run_rules(&mut package).is_ok());
        assert!(package.render_status.rendered);
        assert!(package.render_status.errors.is_empty());
    }

    #[test]
    fn test_missing_label_fails_required_labels() {
        let mut package = rendered_gnb();
        // Strip the slice label from the deployment
        let deployment = package
            .resources
            .iter_mut()
            .find(|r| r.kind() == "Deployment")
            .unwrap();
        deployment.manifest["metadata"]["labels"]
            .as_object_mut()
            .unwrap()
            .remove("oran.io/slice");

        let err = run_rules(&mut package).unwrap_err();
        match &err {
            IntentError::ValidationRule { rule, .. } => assert_eq!(rule, "required-labels"),
            other => panic!("expected ValidationRule, got {other:?}"),
        }
        assert!(!package.render_status.rendered);
        assert!(!package.render_status.errors.is_empty());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_missing_qos_annotation_fails() {
        let mut package = rendered_gnb();
        let service = package
            .resources
            .iter_mut()
            .find(|r| r.kind() == "Service")
            .unwrap();
        service.manifest["metadata"]["annotations"]
            .as_object_mut()
            .unwrap()
            .remove("oran.io/qos-class");

        let err = run_rules(&mut package).unwrap_err();
        match err {
            IntentError::ValidationRule { rule, .. } => assert_eq!(rule, "qos-annotations"),
            other => panic!("expected ValidationRule, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_limits_fails_resource_limits() {
        let mut package = rendered_gnb();
        let deployment = package
            .resources
            .iter_mut()
            .find(|r| r.kind() == "Deployment")
            .unwrap();
        deployment.manifest["spec"]["template"]["spec"]["containers"][0]["resources"]
            .as_object_mut()
            .unwrap()
            .remove("limits");

        let err = run_rules(&mut package).unwrap_err();
        match err {
            IntentError::ValidationRule { rule, .. } => assert_eq!(rule, "resource-limits"),
            other => panic!("expected ValidationRule, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_port_fails_function_ports() {
        let mut package = rendered_gnb();
        let service = package
            .resources
            .iter_mut()
            .find(|r| r.kind() == "Service")
            .unwrap();
        // Drop the NGAP port from the service
        let ports = service.manifest["spec"]["ports"].as_array_mut().unwrap();
        ports.retain(|p| p["port"] != 38412);

        let err = run_rules(&mut package).unwrap_err();
        match &err {
            IntentError::ValidationRule { rule, reason, .. } => {
                assert_eq!(rule, "function-ports");
                assert!(reason.contains("38412"), "reason: {reason}");
            }
            other => panic!("expected ValidationRule, got {other:?}"),
        }
    }
}
