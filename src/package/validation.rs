// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Declarative validation rules carried by every package.
//!
//! The materializer runs these in-process after rendering. A failing rule
//! marks the package's render status and fails the Packaging phase: a rule
//! violation means the rendered output is defective, so retrying cannot help.

use crate::crd::NetworkFunctionType;
use crate::errors::IntentError;
use crate::labels::{
    NEPHIO_COMPONENT_LABEL, ORAN_QOS_BANDWIDTH_ANNOTATION, ORAN_QOS_CLASS_ANNOTATION,
    ORAN_QOS_LATENCY_ANNOTATION, ORAN_SLICE_LABEL,
};
use crate::package::{functions::conventional_ports, KrmResource, Package};
use serde::{Deserialize, Serialize};

/// A single declarative rule checked against a rendered package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationRule {
    /// Every resource carries the required O-RAN labels.
    RequiredLabels,
    /// Every resource carries the QoS annotations.
    QosAnnotations,
    /// The workload declares resource limits for cpu and memory.
    ResourceLimits,
    /// The Service and NetworkPolicy expose the function's conventional ports.
    FunctionPorts(NetworkFunctionType),
}

impl ValidationRule {
    /// Rule name used in error messages and render status.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ValidationRule::RequiredLabels => "required-labels",
            ValidationRule::QosAnnotations => "qos-annotations",
            ValidationRule::ResourceLimits => "resource-limits",
            ValidationRule::FunctionPorts(_) => "function-ports",
        }
    }
}

fn label_of<'a>(resource: &'a KrmResource, key: &str) -> Option<&'a str> {
    resource.manifest["metadata"]["labels"][key].as_str()
}

fn annotation_of<'a>(resource: &'a KrmResource, key: &str) -> Option<&'a str> {
    resource.manifest["metadata"]["annotations"][key].as_str()
}

fn check_required_labels(package: &Package) -> Result<(), String> {
    for resource in &package.resources {
        for key in [ORAN_SLICE_LABEL, NEPHIO_COMPONENT_LABEL] {
            if label_of(resource, key).is_none() {
                return Err(format!(
                    "{} is missing label {key}",
                    resource.filename
                ));
            }
        }
    }
    Ok(())
}

fn check_qos_annotations(package: &Package) -> Result<(), String> {
    for resource in &package.resources {
        for key in [
            ORAN_QOS_BANDWIDTH_ANNOTATION,
            ORAN_QOS_LATENCY_ANNOTATION,
            ORAN_QOS_CLASS_ANNOTATION,
        ] {
            if annotation_of(resource, key).is_none() {
                return Err(format!(
                    "{} is missing annotation {key}",
                    resource.filename
                ));
            }
        }
    }
    Ok(())
}

fn check_resource_limits(package: &Package) -> Result<(), String> {
    let Some(deployment) = package.resource_of_kind("Deployment") else {
        return Err("package has no Deployment to check limits on".to_string());
    };
    let containers = deployment.manifest["spec"]["template"]["spec"]["containers"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    if containers.is_empty() {
        return Err("Deployment has no containers".to_string());
    }
    for container in &containers {
        let limits = &container["resources"]["limits"];
        if limits["cpu"].is_null() || limits["memory"].is_null() {
            return Err(format!(
                "container {} lacks cpu/memory limits",
                container["name"].as_str().unwrap_or("?")
            ));
        }
    }
    Ok(())
}

fn check_function_ports(package: &Package, function: NetworkFunctionType) -> Result<(), String> {
    let expected = conventional_ports(function);
    if expected.is_empty() {
        return Ok(());
    }

    let Some(service) = package.resource_of_kind("Service") else {
        return Err("package has no Service to check ports on".to_string());
    };
    let service_ports = service.manifest["spec"]["ports"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    for port in &expected {
        let found = service_ports.iter().any(|p| {
            p["port"].as_i64() == Some(i64::from(port.port))
                && p["protocol"].as_str() == Some(port.protocol)
        });
        if !found {
            return Err(format!(
                "Service is missing port {}/{} ({})",
                port.port, port.protocol, port.name
            ));
        }
    }

    // The NetworkPolicy must admit the same ports it serves.
    if let Some(policy) = package.resource_of_kind("NetworkPolicy") {
        let ingress_ports = policy.manifest["spec"]["ingress"][0]["ports"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        for port in &expected {
            let found = ingress_ports.iter().any(|p| {
                p["port"].as_i64() == Some(i64::from(port.port))
                    && p["protocol"].as_str() == Some(port.protocol)
            });
            if !found {
                return Err(format!(
                    "NetworkPolicy is missing ingress port {}/{}",
                    port.port, port.protocol
                ));
            }
        }
    }

    Ok(())
}

/// Run every rule a package declares, marking its render status on failure.
///
/// # Errors
///
/// Returns [`IntentError::ValidationRule`] for the first violated rule.
pub fn run_rules(package: &mut Package) -> Result<(), IntentError> {
    let rules = package.validation_rules.clone();
    for rule in &rules {
        let outcome = match rule {
            ValidationRule::RequiredLabels => check_required_labels(package),
            ValidationRule::QosAnnotations => check_qos_annotations(package),
            ValidationRule::ResourceLimits => check_resource_limits(package),
            ValidationRule::FunctionPorts(function) => check_function_ports(package, *function),
        };
        if let Err(reason) = outcome {
            package.render_status.rendered = false;
            package
                .render_status
                .errors
                .push(format!("{}: {reason}", rule.name()));
            return Err(IntentError::ValidationRule {
                package: package.metadata.name.clone(),
                rule: rule.name().to_string(),
                reason,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
