// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for Kptfile pipeline construction.

#[cfg(test)]
mod tests {
    use crate::crd::NetworkFunctionType;
    use crate::package::kptfile::{build_kptfile, SetterContext};

    fn gnb_context<'a>() -> SetterContext<'a> {
        SetterContext {
            intent_name: "slice-urllc-001",
            function: Some(NetworkFunctionType::Gnb),
            site: "site-tokyo-01",
            cluster: "edge01-tokyo",
            cloud_type: "edge",
            namespace: "slice-urllc-001-gnb",
            bandwidth: "100Mbps",
            latency: "1ms",
            qos_class: "ultra-low-latency",
        }
    }

    #[test]
    fn test_kptfile_schema_fields() {
        let kptfile = build_kptfile("slice-urllc-001-gnb", "gNB workload", &gnb_context());
        assert_eq!(kptfile.api_version, "kpt.dev/v1");
        assert_eq!(kptfile.kind, "Kptfile");
        assert_eq!(kptfile.metadata.name, "slice-urllc-001-gnb");
        assert_eq!(kptfile.inventory.namespace, "slice-urllc-001-gnb");
    }

    #[test]
    fn test_mutator_order() {
        let kptfile = build_kptfile("slice-urllc-001-gnb", "gNB workload", &gnb_context());
        let images: Vec<&str> = kptfile
            .pipeline
            .mutators
            .iter()
            .map(|m| m.image.as_str())
            .collect();

        assert_eq!(images.len(), 5);
        assert!(images[0].contains("apply-setters"));
        assert!(images[1].contains("set-namespace"));
        assert!(images[2].contains("set-labels"));
        assert!(images[3].contains("set-annotations"));
        assert!(images[4].contains("apply-replacements"));
    }

    #[test]
    fn test_setters_carry_the_variable_bundle() {
        let kptfile = build_kptfile("slice-urllc-001-gnb", "gNB workload", &gnb_context());
        let setters = &kptfile.pipeline.mutators[0].config_map;
        assert_eq!(setters.get("intent").map(String::as_str), Some("slice-urllc-001"));
        assert_eq!(setters.get("site").map(String::as_str), Some("site-tokyo-01"));
        assert_eq!(setters.get("cluster").map(String::as_str), Some("edge01-tokyo"));
        assert_eq!(setters.get("vnf-type").map(String::as_str), Some("gnb"));
        assert_eq!(setters.get("qos-latency").map(String::as_str), Some("1ms"));
    }

    #[test]
    fn test_annotations_mutator_carries_qos() {
        let kptfile = build_kptfile("slice-urllc-001-gnb", "gNB workload", &gnb_context());
        let annotations = &kptfile.pipeline.mutators[3].config_map;
        assert_eq!(
            annotations.get("oran.io/qos-class").map(String::as_str),
            Some("ultra-low-latency")
        );
        assert_eq!(
            annotations.get("oran.io/qos-bandwidth").map(String::as_str),
            Some("100Mbps")
        );
    }

    #[test]
    fn test_validators_include_strict_schema_check() {
        let kptfile = build_kptfile("slice-urllc-001-gnb", "gNB workload", &gnb_context());
        let validators = &kptfile.pipeline.validators;
        assert_eq!(validators.len(), 3);
        assert!(validators[0].image.contains("kubeval"));
        assert_eq!(validators[0].config_map.get("strict").map(String::as_str), Some("true"));
        assert!(validators[1].image.contains("domain-validator"));
        assert!(validators[2].image.contains("required-labels"));
    }

    #[test]
    fn test_non_function_package_skips_replacements() {
        let mut ctx = gnb_context();
        ctx.function = None;
        let kptfile = build_kptfile("slice-urllc-001-slice", "orchestration", &ctx);
        assert!(kptfile
            .pipeline
            .mutators
            .iter()
            .all(|m| !m.image.contains("apply-replacements")));
    }

    #[test]
    fn test_kptfile_serializes_camel_case() {
        let kptfile = build_kptfile("slice-urllc-001-gnb", "gNB workload", &gnb_context());
        let json = serde_json::to_value(&kptfile).unwrap();
        assert_eq!(json["apiVersion"], "kpt.dev/v1");
        assert!(json["pipeline"]["mutators"].is_array());
        assert!(json["inventory"]["inventoryId"].is_string());
    }
}
