// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers and the batched intent status writer.
//!
//! All status mutations of one reconcile pass are collected in an
//! [`IntentStatusUpdater`] and written once, with optimistic concurrency:
//! the writer reads the current resource version, writes the status
//! subresource against it, and on a 409 conflict refetches and retries up to
//! three times. Losing every retry surfaces as a transient
//! `ConcurrencyConflict`; the next reconcile loop observes the winner's
//! write.

use crate::constants::MAX_STATUS_WRITE_CONFLICTS;
use crate::crd::{Condition, IntentPhase, NetworkSliceIntent, NetworkSliceIntentStatus};
use crate::errors::IntentError;
use anyhow::Result;
use chrono::Utc;
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, warn};

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Arguments
///
/// * `condition_type` - The type of condition (e.g., "Ready", "Progressing")
/// * `status` - The status: "True", "False", or "Unknown"
/// * `reason` - A programmatic identifier in `CamelCase`
/// * `message` - A human-readable explanation
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Batches status changes for one intent and writes them once.
pub struct IntentStatusUpdater {
    namespace: String,
    name: String,
    status: NetworkSliceIntentStatus,
}

impl IntentStatusUpdater {
    /// Start from the intent's current status.
    #[must_use]
    pub fn new(intent: &NetworkSliceIntent) -> Self {
        Self {
            namespace: intent.namespace().unwrap_or_default(),
            name: intent.name_any(),
            status: intent.status.clone().unwrap_or_default(),
        }
    }

    /// The status being built.
    #[must_use]
    pub fn status(&self) -> &NetworkSliceIntentStatus {
        &self.status
    }

    /// Mutable access for phase handlers.
    pub fn status_mut(&mut self) -> &mut NetworkSliceIntentStatus {
        &mut self.status
    }

    /// Move to a new phase: stamps the phase start time, resets the
    /// per-phase retry counter and records the message.
    pub fn transition(&mut self, phase: IntentPhase, message: &str) {
        debug!(
            intent = %self.name,
            from = %self.status.phase,
            to = %phase,
            "Phase transition"
        );
        self.status.phase = phase;
        self.status.message = Some(message.to_string());
        self.status.phase_started_at = Some(Utc::now().to_rfc3339());
        self.status.retry_count = None;
        if self.status.started_at.is_none() {
            self.status.started_at = Some(Utc::now().to_rfc3339());
        }
    }

    /// Upsert a condition by type, preserving the transition time when the
    /// status value has not actually changed.
    pub fn set_condition(&mut self, condition: Condition) {
        if let Some(existing) = self
            .status
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            let unchanged = existing.status == condition.status;
            let keep_time = existing.last_transition_time.clone();
            *existing = condition;
            if unchanged {
                existing.last_transition_time = keep_time;
            }
        } else {
            self.status.conditions.push(condition);
        }
    }

    /// Record a failure condition from the error taxonomy: the reason is
    /// surfaced verbatim, the message is the error's display form.
    pub fn set_failure_condition(&mut self, error: &IntentError) {
        self.set_condition(create_condition(
            crate::status_reasons::CONDITION_TYPE_READY,
            "False",
            error.reason(),
            &error.to_string(),
        ));
    }

    /// Bump the per-phase transient-failure counter, returning the new count.
    pub fn bump_retry_count(&mut self) -> i32 {
        let count = self.status.retry_count.unwrap_or(0) + 1;
        self.status.retry_count = Some(count);
        count
    }

    /// Write the batched status to the API server.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::ConcurrencyConflict`] (wrapped) after
    /// exhausting the conflict-retry budget, or the underlying API error.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        let api: Api<NetworkSliceIntent> = Api::namespaced(client.clone(), &self.namespace);

        for attempt in 1..=MAX_STATUS_WRITE_CONFLICTS {
            // Read the current resource version and write against it.
            let mut current = api.get_status(&self.name).await?;
            current.status = Some(self.status.clone());

            match api
                .replace_status(&self.name, &PostParams::default(), &current)
                .await
            {
                Ok(_) => {
                    debug!(intent = %self.name, attempt = attempt, "Status written");
                    return Ok(());
                }
                Err(kube::Error::Api(ae)) if ae.code == 409 => {
                    warn!(
                        intent = %self.name,
                        attempt = attempt,
                        "Status write conflict, refetching"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(IntentError::ConcurrencyConflict {
            intent: format!("{}/{}", self.namespace, self.name),
            attempts: MAX_STATUS_WRITE_CONFLICTS,
        }
        .into())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
