// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Client for the external deployment-management service and the status
//! aggregation the engine consumes.
//!
//! The deployment-management service watches workloads on the target clusters
//! and reports per-function readiness; the observer here reduces those
//! reports into the intent's `deployedFunctions` list and the all-ready /
//! terminally-failed verdicts that drive the Deploying phase.

use crate::constants::DEPLOYMENT_CALL_TIMEOUT;
use crate::crd::{DeployedFunction, NetworkFunctionType};
use crate::errors::IntentError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

/// Status value a function must report to count as ready.
pub const FUNCTION_STATUS_READY: &str = "Ready";

/// Status value marking a terminal per-function failure.
pub const FUNCTION_STATUS_FAILED: &str = "Failed";

/// One function's deployment state as reported by the service.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeploymentStatus {
    pub name: String,
    pub r#type: NetworkFunctionType,
    pub cluster: String,
    pub namespace: String,
    pub status: String,
}

/// Access to the external deployment-management service.
#[async_trait]
pub trait DeploymentService: Send + Sync {
    /// Per-function status for one intent.
    async fn get_status(
        &self,
        intent_name: &str,
    ) -> Result<Vec<FunctionDeploymentStatus>, IntentError>;

    /// Tear down everything deployed for one intent. Idempotent.
    async fn delete_deployment(&self, intent_name: &str) -> Result<(), IntentError>;
}

/// HTTP implementation of [`DeploymentService`].
pub struct HttpDeploymentClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GetStatusResponse {
    functions: Vec<FunctionDeploymentStatus>,
}

impl HttpDeploymentClient {
    /// Create a client for the deployment-management service at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DeploymentService for HttpDeploymentClient {
    async fn get_status(
        &self,
        intent_name: &str,
    ) -> Result<Vec<FunctionDeploymentStatus>, IntentError> {
        let url = format!("{}/api/v1/deployments/{intent_name}", self.base_url);
        debug!(url = %url, "Polling deployment status");

        let response = self
            .http_client
            .get(&url)
            .timeout(DEPLOYMENT_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntentError::DeploymentStatus {
                reason: e.to_string(),
            })?;

        // A 404 means nothing has synced yet; report no functions rather
        // than an error so the Deploying poll keeps going.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(IntentError::DeploymentStatus {
                reason: format!("status query returned HTTP {}", response.status()),
            });
        }

        let body: GetStatusResponse =
            response
                .json()
                .await
                .map_err(|e| IntentError::DeploymentStatus {
                    reason: format!("malformed status response: {e}"),
                })?;
        Ok(body.functions)
    }

    async fn delete_deployment(&self, intent_name: &str) -> Result<(), IntentError> {
        let url = format!("{}/api/v1/deployments/{intent_name}", self.base_url);
        let response = self
            .http_client
            .delete(&url)
            .timeout(DEPLOYMENT_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntentError::DeploymentStatus {
                reason: e.to_string(),
            })?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            info!(intent = %intent_name, "Deployment teardown acknowledged");
            Ok(())
        } else {
            Err(IntentError::DeploymentStatus {
                reason: format!("teardown returned HTTP {}", response.status()),
            })
        }
    }
}

/// Aggregated verdict over one intent's functions.
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentObservation {
    /// Per-function state for the status subresource.
    pub functions: Vec<DeployedFunction>,
    /// Every expected function reports Ready.
    pub all_ready: bool,
    /// Some function reports a terminal failure.
    pub any_failed: bool,
}

/// Reduce service reports into the engine's verdict.
///
/// `all_ready` demands a Ready report for every *expected* function type: a
/// function the service has not seen yet keeps the intent in Deploying.
#[must_use]
pub fn observe(
    expected: &[NetworkFunctionType],
    reported: Vec<FunctionDeploymentStatus>,
) -> DeploymentObservation {
    let functions: Vec<DeployedFunction> = reported
        .into_iter()
        .map(|f| DeployedFunction {
            name: f.name,
            r#type: f.r#type,
            cluster: f.cluster,
            namespace: f.namespace,
            status: f.status,
        })
        .collect();

    let all_ready = expected.iter().all(|ty| {
        functions
            .iter()
            .any(|f| f.r#type == *ty && f.status == FUNCTION_STATUS_READY)
    });
    let any_failed = functions
        .iter()
        .any(|f| f.status == FUNCTION_STATUS_FAILED);

    DeploymentObservation {
        functions,
        all_ready,
        any_failed,
    }
}

#[cfg(test)]
#[path = "deployment_tests.rs"]
mod deployment_tests;
