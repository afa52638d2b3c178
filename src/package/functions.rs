// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Renders the per-function deployment package.
//!
//! Each network function gets a Namespace, a Deployment, a Service, a
//! ConfigMap and a NetworkPolicy. All builders are pure and easily testable;
//! the function type is the dispatch tag selecting image, port set, env
//! injection and the security-context exception.

use crate::constants::{
    DEP_ORAN_CN_COMMON, DEP_ORAN_COMMON, DEP_ORAN_RAN_COMMON, DEP_ORAN_TN_COMMON, NF_RUN_AS_UID,
    PACKAGE_VERSION, PORT_F1C, PORT_GTPU, PORT_NGAP, PORT_PFCP, PORT_SBI,
};
use crate::crd::{NetworkFunctionSpec, NetworkFunctionType, PlacementDecision};
use crate::errors::IntentError;
use crate::labels::{
    COMPONENT_NETWORK_FUNCTION, GENERATED_AT_ANNOTATION, K8S_COMPONENT, K8S_INSTANCE,
    K8S_MANAGED_BY, K8S_NAME, K8S_PART_OF, K8S_ZONE, MANAGED_BY_NEPHIO_ADAPTER,
    NEPHIO_COMPONENT_LABEL, ORAN_CLOUD_TYPE_LABEL, ORAN_QOS_BANDWIDTH_ANNOTATION,
    ORAN_QOS_CLASS_ANNOTATION, ORAN_QOS_LATENCY_ANNOTATION, ORAN_SITE_LABEL, ORAN_SLICE_LABEL,
    ORAN_ULTRA_LOW_LATENCY_KEY, ORAN_VNF_TYPE_LABEL, PART_OF_SLICE,
};
use crate::package::{
    function_namespace, function_package_name, kptfile, validation::ValidationRule,
    DeploymentTarget, KrmResource, Package, PackageCategory, PackageMetadata, QosContext,
    RenderStatus,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Affinity, ConfigMap, Container, ContainerPort, EnvVar, Namespace, PodAffinityTerm,
    PodAntiAffinity, PodSpec, PodTemplateSpec, ResourceRequirements as K8sResourceRequirements,
    SecurityContext, Service, ServicePort, ServiceSpec, Toleration, WeightedPodAffinityTerm,
};
use k8s_openapi::api::networking::v1::{
    NetworkPolicy, NetworkPolicyEgressRule, NetworkPolicyIngressRule, NetworkPolicyPeer,
    NetworkPolicyPort, NetworkPolicySpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::Serialize;
use std::collections::BTreeMap;

/// One conventional port of a network function.
pub struct FunctionPort {
    pub name: &'static str,
    pub port: i32,
    pub protocol: &'static str,
}

/// Conventional port set per function type.
#[must_use]
pub fn conventional_ports(function: NetworkFunctionType) -> Vec<FunctionPort> {
    match function {
        NetworkFunctionType::Gnb => vec![
            FunctionPort {
                name: "ngap",
                port: PORT_NGAP,
                protocol: "SCTP",
            },
            FunctionPort {
                name: "gtpu",
                port: PORT_GTPU,
                protocol: "UDP",
            },
        ],
        NetworkFunctionType::Amf | NetworkFunctionType::Smf => vec![FunctionPort {
            name: "sbi",
            port: PORT_SBI,
            protocol: "TCP",
        }],
        NetworkFunctionType::Upf => vec![
            FunctionPort {
                name: "gtpu",
                port: PORT_GTPU,
                protocol: "UDP",
            },
            FunctionPort {
                name: "pfcp",
                port: PORT_PFCP,
                protocol: "UDP",
            },
        ],
        NetworkFunctionType::Cu => vec![
            FunctionPort {
                name: "f1c",
                port: PORT_F1C,
                protocol: "SCTP",
            },
            FunctionPort {
                name: "gtpu",
                port: PORT_GTPU,
                protocol: "UDP",
            },
        ],
        NetworkFunctionType::Du => vec![
            FunctionPort {
                name: "f1c",
                port: PORT_F1C,
                protocol: "SCTP",
            },
            FunctionPort {
                name: "f1u",
                port: PORT_GTPU,
                protocol: "UDP",
            },
        ],
        // Transport functions use node-level networking.
        NetworkFunctionType::Tn => vec![],
    }
}

/// Container image for a function type.
fn container_image(function: NetworkFunctionType) -> String {
    format!("registry.oran.io/oran/{}:v1.0.0", function.as_lowercase())
}

/// Per-type environment injection.
fn function_env(function: NetworkFunctionType, intent_name: &str, qos: &QosContext) -> Vec<EnvVar> {
    let var = |name: &str, value: String| EnvVar {
        name: name.to_string(),
        value: Some(value),
        value_from: None,
    };

    let mut env = vec![
        var("SLICE_NAME", intent_name.to_string()),
        var("QOS_CLASS", qos.qos_class.as_str().to_string()),
    ];
    match function {
        NetworkFunctionType::Gnb => {
            env.push(var("NGAP_PORT", PORT_NGAP.to_string()));
            env.push(var("GTPU_PORT", PORT_GTPU.to_string()));
        }
        NetworkFunctionType::Amf | NetworkFunctionType::Smf => {
            env.push(var("SBI_PORT", PORT_SBI.to_string()));
        }
        NetworkFunctionType::Upf => {
            env.push(var("PFCP_PORT", PORT_PFCP.to_string()));
            env.push(var("GTPU_PORT", PORT_GTPU.to_string()));
        }
        NetworkFunctionType::Cu | NetworkFunctionType::Du => {
            env.push(var("F1C_PORT", PORT_F1C.to_string()));
        }
        NetworkFunctionType::Tn => {}
    }
    env
}

/// Security context for a function container. Everything runs as the
/// non-root slice UID except TN, which needs privileged network access.
fn security_context(function: NetworkFunctionType) -> SecurityContext {
    if function == NetworkFunctionType::Tn {
        SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }
    } else {
        SecurityContext {
            run_as_non_root: Some(true),
            run_as_user: Some(NF_RUN_AS_UID),
            ..Default::default()
        }
    }
}

/// Format CPU cores as a Kubernetes quantity ("4" or "500m").
fn cpu_quantity(cores: f64) -> Quantity {
    if (cores.fract()).abs() < f64::EPSILON {
        Quantity(format!("{}", cores as i64))
    } else {
        Quantity(format!("{}m", (cores * 1000.0).round() as i64))
    }
}

/// Format gigabytes as a Kubernetes quantity ("8Gi" or "512Mi").
fn memory_quantity(gb: f64) -> Quantity {
    if (gb.fract()).abs() < f64::EPSILON {
        Quantity(format!("{}Gi", gb as i64))
    } else {
        Quantity(format!("{}Mi", (gb * 1024.0).round() as i64))
    }
}

/// Standard labels stamped on every resource of a function package.
fn build_labels(
    package_name: &str,
    intent_name: &str,
    function: NetworkFunctionType,
    decision: &PlacementDecision,
    cloud_type: &str,
) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".into(), package_name.into());
    labels.insert(K8S_NAME.into(), function.as_lowercase().into());
    labels.insert(K8S_INSTANCE.into(), package_name.into());
    labels.insert(K8S_COMPONENT.into(), COMPONENT_NETWORK_FUNCTION.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_NEPHIO_ADAPTER.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_SLICE.into());
    labels.insert(ORAN_VNF_TYPE_LABEL.into(), function.as_lowercase().into());
    labels.insert(ORAN_CLOUD_TYPE_LABEL.into(), cloud_type.into());
    labels.insert(ORAN_SITE_LABEL.into(), decision.site.clone());
    labels.insert(ORAN_SLICE_LABEL.into(), intent_name.into());
    labels.insert(NEPHIO_COMPONENT_LABEL.into(), "network-slice".into());
    labels
}

/// QoS annotations plus the render timestamp.
fn build_annotations(qos: &QosContext, generated_at: &str) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    annotations.insert(ORAN_QOS_BANDWIDTH_ANNOTATION.into(), qos.bandwidth_raw.clone());
    annotations.insert(ORAN_QOS_LATENCY_ANNOTATION.into(), qos.latency_raw.clone());
    annotations.insert(
        ORAN_QOS_CLASS_ANNOTATION.into(),
        qos.qos_class.as_str().into(),
    );
    annotations.insert(GENERATED_AT_ANNOTATION.into(), generated_at.into());
    annotations
}

/// Node selector derived from the placement decision and hints.
fn build_node_selector(
    function: &NetworkFunctionSpec,
    decision: &PlacementDecision,
    cloud_type: &str,
) -> BTreeMap<String, String> {
    let mut selector = BTreeMap::new();
    selector.insert(ORAN_CLOUD_TYPE_LABEL.into(), cloud_type.into());
    selector.insert(ORAN_SITE_LABEL.into(), decision.site.clone());
    if let Some(zone) = &function.placement.zone {
        selector.insert(K8S_ZONE.into(), zone.clone());
    }
    selector
}

/// Tolerations: the vnf-type taint, plus ultra-low-latency nodes when the
/// latency target is at or below one millisecond.
fn build_tolerations(function: NetworkFunctionType, qos: &QosContext) -> Vec<Toleration> {
    let mut tolerations = vec![Toleration {
        key: Some(ORAN_VNF_TYPE_LABEL.to_string()),
        operator: Some("Equal".to_string()),
        value: Some(function.as_lowercase().to_string()),
        effect: Some("NoSchedule".to_string()),
        ..Default::default()
    }];
    if qos.latency_ms <= 1.0 {
        tolerations.push(Toleration {
            key: Some(ORAN_ULTRA_LOW_LATENCY_KEY.to_string()),
            operator: Some("Exists".to_string()),
            effect: Some("NoSchedule".to_string()),
            ..Default::default()
        });
    }
    tolerations
}

/// Prefer spreading same-name pods across hosts.
fn build_anti_affinity(package_name: &str) -> Affinity {
    let mut match_labels = BTreeMap::new();
    match_labels.insert("app".to_string(), package_name.to_string());

    Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![
                WeightedPodAffinityTerm {
                    weight: 100,
                    pod_affinity_term: PodAffinityTerm {
                        label_selector: Some(LabelSelector {
                            match_labels: Some(match_labels),
                            ..Default::default()
                        }),
                        topology_key: "kubernetes.io/hostname".to_string(),
                        ..Default::default()
                    },
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Render `function.conf` from the spec's free-form config plus placement.
fn render_function_conf(
    function: &NetworkFunctionSpec,
    decision: &PlacementDecision,
    intent_name: &str,
) -> String {
    let mut conf = String::new();
    conf.push_str(&format!("[function]\ntype = {}\n", function.r#type.as_lowercase()));
    conf.push_str(&format!("slice = {intent_name}\n"));
    conf.push_str(&format!("site = {}\n", decision.site));
    conf.push_str(&format!("cluster = {}\n", decision.cluster));
    for port in conventional_ports(function.r#type) {
        conf.push_str(&format!(
            "port.{} = {}/{}\n",
            port.name,
            port.port,
            port.protocol.to_ascii_lowercase()
        ));
    }
    if let Some(config) = &function.config {
        conf.push_str("\n[config]\n");
        for (key, value) in config {
            conf.push_str(&format!("{key} = {value}\n"));
        }
    }
    conf
}

/// Render `qos.conf` from the parsed QoS context.
fn render_qos_conf(qos: &QosContext) -> String {
    format!(
        "[qos]\nslice-type = {}\nbandwidth-mbps = {}\nlatency-ms = {}\nclass = {}\n",
        qos.slice_type, qos.bandwidth_mbps, qos.latency_ms, qos.qos_class.as_str()
    )
}

fn krm<T: Serialize>(
    filename: &str,
    resource: &T,
    package_name: &str,
) -> Result<KrmResource, IntentError> {
    let manifest = serde_json::to_value(resource).map_err(|e| IntentError::Render {
        package: package_name.to_string(),
        reason: format!("failed to serialize {filename}: {e}"),
        transient: false,
    })?;
    Ok(KrmResource {
        filename: filename.to_string(),
        manifest,
    })
}

/// Per-domain common package this function depends on.
fn domain_dependency(function: NetworkFunctionType) -> &'static str {
    if function.is_ran() {
        DEP_ORAN_RAN_COMMON
    } else if function == NetworkFunctionType::Tn {
        DEP_ORAN_TN_COMMON
    } else {
        DEP_ORAN_CN_COMMON
    }
}

/// Render the complete deployment package for one network function.
///
/// # Errors
///
/// Returns [`IntentError::Render`] when a resource fails to serialize.
#[allow(clippy::too_many_lines)]
pub fn render_function_package(
    intent_name: &str,
    function: &NetworkFunctionSpec,
    decision: &PlacementDecision,
    qos: &QosContext,
    generated_at: &str,
) -> Result<Package, IntentError> {
    let package_name = function_package_name(intent_name, function.r#type);
    let namespace = function_namespace(intent_name, function.r#type);
    let cloud_type = function
        .placement
        .cloud_type
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "edge".to_string());

    let labels = build_labels(&package_name, intent_name, function.r#type, decision, &cloud_type);
    let annotations = build_annotations(qos, generated_at);

    let metadata = |name: &str| ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.clone()),
        labels: Some(labels.clone()),
        annotations: Some(annotations.clone()),
        ..Default::default()
    };

    // Namespace (cluster-scoped, no namespace field on itself)
    let ns_resource = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.clone()),
            labels: Some(labels.clone()),
            annotations: Some(annotations.clone()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Deployment
    let mut selector_labels = BTreeMap::new();
    selector_labels.insert("app".to_string(), package_name.clone());

    let cpu = cpu_quantity(function.resources.cpu_cores);
    let memory = memory_quantity(function.resources.memory_gb);
    let mut resource_map = BTreeMap::new();
    resource_map.insert("cpu".to_string(), cpu);
    resource_map.insert("memory".to_string(), memory);

    let container = Container {
        name: function.r#type.as_lowercase().to_string(),
        image: Some(container_image(function.r#type)),
        ports: Some(
            conventional_ports(function.r#type)
                .iter()
                .map(|p| ContainerPort {
                    name: Some(p.name.to_string()),
                    container_port: p.port,
                    protocol: Some(p.protocol.to_string()),
                    ..Default::default()
                })
                .collect(),
        ),
        env: Some(function_env(function.r#type, intent_name, qos)),
        resources: Some(K8sResourceRequirements {
            requests: Some(resource_map.clone()),
            limits: Some(resource_map),
            ..Default::default()
        }),
        security_context: Some(security_context(function.r#type)),
        ..Default::default()
    };

    let deployment = Deployment {
        metadata: metadata(&package_name),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector_labels),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels.clone()),
                    annotations: Some(annotations.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    node_selector: Some(build_node_selector(function, decision, &cloud_type)),
                    tolerations: Some(build_tolerations(function.r#type, qos)),
                    affinity: Some(build_anti_affinity(&package_name)),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    };

    // Service
    let mut service_selector = BTreeMap::new();
    service_selector.insert("app".to_string(), package_name.clone());
    let service = Service {
        metadata: metadata(&package_name),
        spec: Some(ServiceSpec {
            selector: Some(service_selector),
            ports: Some(
                conventional_ports(function.r#type)
                    .iter()
                    .map(|p| ServicePort {
                        name: Some(p.name.to_string()),
                        port: p.port,
                        target_port: Some(IntOrString::Int(p.port)),
                        protocol: Some(p.protocol.to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    };

    // ConfigMap with the rendered function.conf and qos.conf
    let mut data = BTreeMap::new();
    data.insert(
        "function.conf".to_string(),
        render_function_conf(function, decision, intent_name),
    );
    data.insert("qos.conf".to_string(), render_qos_conf(qos));
    let configmap = ConfigMap {
        metadata: metadata(&format!("{package_name}-config")),
        data: Some(data),
        ..Default::default()
    };

    // NetworkPolicy: ingress and egress pinned to the slice's namespaces.
    let mut slice_selector = BTreeMap::new();
    slice_selector.insert(ORAN_SLICE_LABEL.to_string(), intent_name.to_string());
    let slice_peer = NetworkPolicyPeer {
        namespace_selector: Some(LabelSelector {
            match_labels: Some(slice_selector),
            ..Default::default()
        }),
        ..Default::default()
    };
    let ingress_ports: Vec<NetworkPolicyPort> = conventional_ports(function.r#type)
        .iter()
        .map(|p| NetworkPolicyPort {
            port: Some(IntOrString::Int(p.port)),
            protocol: Some(p.protocol.to_string()),
            ..Default::default()
        })
        .collect();

    let network_policy = NetworkPolicy {
        metadata: metadata(&package_name),
        spec: Some(NetworkPolicySpec {
            pod_selector: Some(LabelSelector::default()),
            policy_types: Some(vec!["Ingress".to_string(), "Egress".to_string()]),
            ingress: Some(vec![NetworkPolicyIngressRule {
                from: Some(vec![slice_peer.clone()]),
                ports: if ingress_ports.is_empty() {
                    None
                } else {
                    Some(ingress_ports)
                },
            }]),
            egress: Some(vec![NetworkPolicyEgressRule {
                to: Some(vec![slice_peer]),
                ports: None,
            }]),
        }),
    };

    let resources = vec![
        krm("namespace.yaml", &ns_resource, &package_name)?,
        krm("deployment.yaml", &deployment, &package_name)?,
        krm("service.yaml", &service, &package_name)?,
        krm("configmap.yaml", &configmap, &package_name)?,
        krm("networkpolicy.yaml", &network_policy, &package_name)?,
    ];

    let kptfile = kptfile::build_kptfile(
        &package_name,
        &format!("{} workload for slice {intent_name}", function.r#type),
        &kptfile::SetterContext {
            intent_name,
            function: Some(function.r#type),
            site: &decision.site,
            cluster: &decision.cluster,
            cloud_type: &cloud_type,
            namespace: &namespace,
            bandwidth: &qos.bandwidth_raw,
            latency: &qos.latency_raw,
            qos_class: qos.qos_class.as_str(),
        },
    );

    Ok(Package {
        metadata: PackageMetadata {
            name: package_name.clone(),
            version: PACKAGE_VERSION.to_string(),
            labels,
            annotations,
            category: PackageCategory::Function,
        },
        resources,
        kptfile,
        validation_rules: vec![
            ValidationRule::RequiredLabels,
            ValidationRule::QosAnnotations,
            ValidationRule::ResourceLimits,
            ValidationRule::FunctionPorts(function.r#type),
        ],
        dependencies: vec![
            DEP_ORAN_COMMON.to_string(),
            domain_dependency(function.r#type).to_string(),
        ],
        targets: vec![DeploymentTarget {
            cluster: decision.cluster.clone(),
            namespace,
            cloud_type,
        }],
        render_status: RenderStatus {
            rendered: true,
            timestamp: generated_at.to_string(),
            errors: Vec::new(),
            warnings: Vec::new(),
        },
    })
}

#[cfg(test)]
#[path = "functions_tests.rs"]
mod functions_tests;
