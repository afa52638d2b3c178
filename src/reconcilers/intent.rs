// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The intent reconciliation engine.
//!
//! A level-triggered reconciler: every change event re-examines the full
//! desired-vs-actual gap and issues the next action. No in-process state
//! survives restart; the source of truth is the intent's status subresource.
//!
//! Phase flow:
//!
//! ```text
//! (none) -> Pending -> Planning -> Packaging -> Deploying -> Ready
//!              |           |           |            |          |
//!              +-----------+-----------+------------+          | health poll
//!                          v                                   v
//!                        Failed  <---- deadline/terminal ------+
//! ```
//!
//! Each reconcile pass performs at most one phase transition, persists it,
//! and requeues on the cadence the new phase calls for. Transient failures
//! bump a per-phase retry counter with capped exponential backoff; terminal
//! failures go straight to Failed with a machine-readable condition reason.

use crate::constants::{
    INTENT_DEADLINE, KIND_NETWORK_SLICE_INTENT, PACKAGING_PHASE_TIMEOUT, PLANNING_PHASE_TIMEOUT,
    REQUEUE_DEPLOYING_SECS, REQUEUE_INTERNAL_SECS, REQUEUE_PACKAGING_SECS, REQUEUE_READY_SECS,
};
use crate::context::Context;
use crate::crd::{IntentPhase, NetworkSliceIntent, NetworkSliceIntentSpec, SliceMetrics};
use crate::deployment::observe;
use crate::errors::IntentError;
use crate::labels::FINALIZER_NETWORK_SLICE_INTENT;
use crate::placement;
use crate::porch::PackagePublisher;
use crate::qos;
use crate::reconcilers::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use crate::reconcilers::retry::{backoff_delay, retries_remaining};
use crate::reconcilers::status::{create_condition, IntentStatusUpdater};
use crate::status_reasons::{
    CONDITION_TYPE_PROGRESSING, CONDITION_TYPE_READY, REASON_ALL_FUNCTIONS_READY, REASON_DEGRADED,
    REASON_PROGRESSING, REASON_REVISION_LIFECYCLE_STUCK,
};
use crate::{metrics, qos::parse_timeout_secs};
use anyhow::Result;
use chrono::{DateTime, Utc};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Requeue cadence for an intent sitting in `phase`.
#[must_use]
pub fn requeue_for(phase: IntentPhase) -> Action {
    let secs = match phase {
        IntentPhase::Pending | IntentPhase::Planning => REQUEUE_INTERNAL_SECS,
        IntentPhase::Packaging => REQUEUE_PACKAGING_SECS,
        IntentPhase::Deploying => REQUEUE_DEPLOYING_SECS,
        IntentPhase::Ready => REQUEUE_READY_SECS,
        IntentPhase::Failed => return Action::await_change(),
    };
    Action::requeue(Duration::from_secs(secs))
}

/// Validate an intent spec before any planning happens.
///
/// # Errors
///
/// Returns [`IntentError::Validation`] describing the first defect found.
pub fn validate_intent(spec: &NetworkSliceIntentSpec) -> Result<(), IntentError> {
    if spec.qos_profile.bandwidth.trim().is_empty() {
        return Err(IntentError::Validation {
            reason: "qosProfile.bandwidth must not be empty".to_string(),
        });
    }
    if spec.qos_profile.latency.trim().is_empty() {
        return Err(IntentError::Validation {
            reason: "qosProfile.latency must not be empty".to_string(),
        });
    }
    qos::parse_bandwidth_mbps(&spec.qos_profile.bandwidth)?;
    qos::parse_latency_ms(&spec.qos_profile.latency)?;
    if let Some(reliability) = &spec.qos_profile.reliability {
        qos::parse_reliability(reliability)?;
    }
    if spec.network_functions.is_empty() {
        return Err(IntentError::Validation {
            reason: "at least one network function is required".to_string(),
        });
    }
    if let Some(strategy) = &spec.deployment_strategy {
        if let Some(timeout) = &strategy.timeout {
            parse_timeout_secs(timeout)?;
        }
    }
    Ok(())
}

/// End-to-end deadline for an intent: the strategy's timeout override, or
/// the engine's ten-minute default.
#[must_use]
pub fn intent_deadline(spec: &NetworkSliceIntentSpec) -> Duration {
    spec.deployment_strategy
        .as_ref()
        .and_then(|s| s.timeout.as_ref())
        .and_then(|t| parse_timeout_secs(t).ok())
        .map_or(INTENT_DEADLINE, Duration::from_secs)
}

/// Seconds elapsed since an RFC3339 timestamp; `None` when absent or
/// unparseable.
fn elapsed_since(timestamp: Option<&String>) -> Option<Duration> {
    let parsed = DateTime::parse_from_rfc3339(timestamp?.as_str()).ok()?;
    (Utc::now() - parsed.with_timezone(&Utc)).to_std().ok()
}

/// Move the intent to Failed with a machine-readable condition and stop
/// requeueing until the spec changes.
async fn fail_intent(
    ctx: &Context,
    mut updater: IntentStatusUpdater,
    error: &IntentError,
) -> Result<Action> {
    warn!(error = %error, reason = error.reason(), "Intent failed");
    metrics::record_error(KIND_NETWORK_SLICE_INTENT, error.reason());

    updater.transition(IntentPhase::Failed, &error.to_string());
    updater.set_failure_condition(error);
    updater.apply(&ctx.client).await?;
    Ok(Action::await_change())
}

/// Handle a transient failure: retry with capped backoff until the per-phase
/// cap, then declare the intent Failed.
async fn handle_transient(
    ctx: &Context,
    mut updater: IntentStatusUpdater,
    error: IntentError,
) -> Result<Action> {
    if !error.is_transient() {
        return fail_intent(ctx, updater, &error).await;
    }

    let attempt = updater.bump_retry_count();
    if !retries_remaining(attempt) {
        return fail_intent(ctx, updater, &error).await;
    }

    warn!(
        error = %error,
        attempt = attempt,
        "Transient failure, backing off"
    );
    updater.set_condition(create_condition(
        CONDITION_TYPE_PROGRESSING,
        "False",
        error.reason(),
        &error.to_string(),
    ));
    updater.apply(&ctx.client).await?;
    Ok(Action::requeue(backoff_delay(attempt - 1)))
}

/// Upsert freshly published revisions into the recorded list, keyed by
/// (repository, package). Previously recorded revisions are never dropped:
/// the deletion path must see every revision that ever existed.
fn merge_revisions(
    recorded: &mut Vec<crate::crd::PackageRevisionRef>,
    published: Vec<crate::crd::PackageRevisionRef>,
) {
    for revision in published {
        match recorded.iter_mut().find(|r| {
            r.repository == revision.repository && r.package_name == revision.package_name
        }) {
            Some(existing) => *existing = revision,
            None => recorded.push(revision),
        }
    }
    recorded.sort_by(|a, b| {
        (a.repository.as_str(), a.package_name.as_str())
            .cmp(&(b.repository.as_str(), b.package_name.as_str()))
    });
}

/// Deletion runs the forward path in reverse: tear down the deployment,
/// delete every recorded package revision, then release the finalizer.
/// Every step is idempotent and individually retried; removing the
/// finalizer is the only commit point.
async fn handle_deletion(ctx: &Context, intent: &NetworkSliceIntent) -> Result<Action> {
    let name = intent.name_any();

    if !has_finalizer(intent, FINALIZER_NETWORK_SLICE_INTENT) {
        return Ok(Action::await_change());
    }

    info!(intent = %name, "Intent deleted; running teardown");

    ctx.deployments.delete_deployment(&name).await?;

    let recorded = intent
        .status
        .as_ref()
        .map(|s| s.package_revisions.clone())
        .unwrap_or_default();
    let publisher = PackagePublisher::new(ctx.porch.as_ref(), &ctx.management_repository);
    publisher.delete_revisions(&recorded).await?;

    remove_finalizer(&ctx.client, intent, FINALIZER_NETWORK_SLICE_INTENT).await?;
    info!(intent = %name, "Teardown complete, finalizer released");
    Ok(Action::await_change())
}

/// Pending: validate the spec, then enter Planning.
async fn handle_pending(
    ctx: &Context,
    intent: &NetworkSliceIntent,
    mut updater: IntentStatusUpdater,
) -> Result<Action> {
    if let Err(error) = validate_intent(&intent.spec) {
        return fail_intent(ctx, updater, &error).await;
    }

    updater.status_mut().observed_generation = intent.metadata.generation;
    updater.transition(IntentPhase::Planning, "validation ok; requesting sites");
    updater.set_condition(create_condition(
        CONDITION_TYPE_PROGRESSING,
        "True",
        REASON_PROGRESSING,
        "intent validated",
    ));
    updater.apply(&ctx.client).await?;
    Ok(requeue_for(IntentPhase::Planning))
}

/// Planning: snapshot the inventory, compute one decision per function,
/// persist the decisions and enter Packaging.
async fn handle_planning(
    ctx: &Context,
    intent: &NetworkSliceIntent,
    mut updater: IntentStatusUpdater,
) -> Result<Action> {
    if elapsed_since(updater.status().phase_started_at.as_ref())
        .is_some_and(|elapsed| elapsed > PLANNING_PHASE_TIMEOUT)
    {
        let error = IntentError::PhaseTimeout {
            phase: IntentPhase::Planning.to_string(),
            deadline_secs: PLANNING_PHASE_TIMEOUT.as_secs(),
        };
        return fail_intent(ctx, updater, &error).await;
    }

    // The snapshot is captured once and treated as immutable for the pass.
    let sites = match ctx.inventory.list_available_sites().await {
        Ok(sites) => sites,
        Err(error) => return handle_transient(ctx, updater, error).await,
    };
    debug!(sites = sites.len(), "Inventory snapshot captured");

    let decisions = match placement::plan(&intent.spec, &sites) {
        Ok(decisions) => decisions,
        Err(error) => return fail_intent(ctx, updater, &error).await,
    };

    for decision in &decisions {
        metrics::record_placement_score(
            decision.function.as_lowercase(),
            &decision.site,
            "default",
            decision.score,
        );
    }

    let planning_secs = elapsed_since(updater.status().phase_started_at.as_ref())
        .unwrap_or_default()
        .as_secs_f64();
    let status = updater.status_mut();
    status.placement_decisions = decisions;
    status
        .metrics
        .get_or_insert_with(SliceMetrics::default)
        .planning_duration_seconds = Some(planning_secs);

    updater.transition(IntentPhase::Packaging, "placement decided; rendering packages");
    updater.apply(&ctx.client).await?;
    Ok(requeue_for(IntentPhase::Packaging))
}

/// Packaging: materialize every package, publish the revisions, persist the
/// references and enter Deploying.
async fn handle_packaging(
    ctx: &Context,
    intent: &NetworkSliceIntent,
    mut updater: IntentStatusUpdater,
) -> Result<Action> {
    if elapsed_since(updater.status().phase_started_at.as_ref())
        .is_some_and(|elapsed| elapsed > PACKAGING_PHASE_TIMEOUT)
    {
        let error = IntentError::PhaseTimeout {
            phase: IntentPhase::Packaging.to_string(),
            deadline_secs: PACKAGING_PHASE_TIMEOUT.as_secs(),
        };
        return fail_intent(ctx, updater, &error).await;
    }

    let decisions = updater.status().placement_decisions.clone();
    let packages = match crate::package::materialize(intent, &decisions, &Utc::now().to_rfc3339())
    {
        Ok(packages) => packages,
        Err(error) if error.is_transient() => return handle_transient(ctx, updater, error).await,
        Err(error) => return fail_intent(ctx, updater, &error).await,
    };

    let publisher = PackagePublisher::new(ctx.porch.as_ref(), &ctx.management_repository);
    let outcome = match publisher.publish_all(&packages).await {
        Ok(outcome) => outcome,
        Err(error) => return fail_intent(ctx, updater, &error).await,
    };

    // Record every revision that landed before acting on any failure: no
    // revision in the external service may go untracked in status.
    merge_revisions(
        &mut updater.status_mut().package_revisions,
        outcome.revisions,
    );
    if let Some(error) = outcome.failure {
        if error.is_transient() {
            return handle_transient(ctx, updater, error).await;
        }
        return fail_intent(ctx, updater, &error).await;
    }

    for package in &packages {
        let repository = crate::porch::repository_for(package, &ctx.management_repository);
        let cluster = package
            .targets
            .first()
            .map(|t| t.cluster.as_str())
            .unwrap_or_default();
        metrics::record_package_distribution(
            &repository,
            cluster,
            package.metadata.category.as_str(),
        );
    }

    for warning in &outcome.warnings {
        updater.set_condition(create_condition(
            CONDITION_TYPE_PROGRESSING,
            "True",
            REASON_REVISION_LIFECYCLE_STUCK,
            warning,
        ));
    }

    let packaging_secs = elapsed_since(updater.status().phase_started_at.as_ref())
        .unwrap_or_default()
        .as_secs_f64();
    updater
        .status_mut()
        .metrics
        .get_or_insert_with(SliceMetrics::default)
        .packaging_duration_seconds = Some(packaging_secs);

    updater.transition(IntentPhase::Deploying, "revisions published; awaiting readiness");
    updater.apply(&ctx.client).await?;
    Ok(requeue_for(IntentPhase::Deploying))
}

/// Deploying: poll the deployment-management service until every function
/// reports ready, a function terminally fails, or the deadline expires.
async fn handle_deploying(
    ctx: &Context,
    intent: &NetworkSliceIntent,
    mut updater: IntentStatusUpdater,
) -> Result<Action> {
    let deadline = intent_deadline(&intent.spec);
    if elapsed_since(updater.status().started_at.as_ref()).is_some_and(|total| total > deadline) {
        let error = IntentError::PhaseTimeout {
            phase: IntentPhase::Deploying.to_string(),
            deadline_secs: deadline.as_secs(),
        };
        return fail_intent(ctx, updater, &error).await;
    }

    let name = intent.name_any();
    let reported = match ctx.deployments.get_status(&name).await {
        Ok(reported) => reported,
        Err(error) => {
            // Status-poll errors retry on the Deploying cadence for as long
            // as the deadline allows; they never count toward the retry cap.
            warn!(error = %error, "Deployment status poll failed");
            updater.set_condition(create_condition(
                CONDITION_TYPE_PROGRESSING,
                "False",
                error.reason(),
                &error.to_string(),
            ));
            updater.apply(&ctx.client).await?;
            return Ok(requeue_for(IntentPhase::Deploying));
        }
    };

    let expected: Vec<_> = intent
        .spec
        .network_functions
        .iter()
        .map(|f| f.r#type)
        .collect();
    let observation = observe(&expected, reported);

    let ready_count = observation
        .functions
        .iter()
        .filter(|f| f.status == crate::deployment::FUNCTION_STATUS_READY)
        .count();
    let status = updater.status_mut();
    status.deployed_functions = observation.functions.clone();
    status
        .metrics
        .get_or_insert_with(SliceMetrics::default)
        .success_rate = Some(ready_count as f64 / expected.len().max(1) as f64);

    if observation.any_failed {
        let failed = observation
            .functions
            .iter()
            .find(|f| f.status == crate::deployment::FUNCTION_STATUS_FAILED)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        let error = IntentError::DeploymentStatus {
            reason: format!("function '{failed}' terminally failed"),
        };
        return fail_intent(ctx, updater, &error).await;
    }

    if observation.all_ready {
        let deployment_secs = elapsed_since(updater.status().phase_started_at.as_ref())
            .unwrap_or_default()
            .as_secs_f64();
        let total_secs = elapsed_since(updater.status().started_at.as_ref())
            .unwrap_or_default()
            .as_secs_f64();

        let slice_type = intent
            .spec
            .qos_profile
            .slice_type
            .unwrap_or(crate::crd::SliceType::Balanced)
            .to_string();
        let qos_class = qos::parse_latency_ms(&intent.spec.qos_profile.latency)
            .map(|ms| qos::QosClass::from_latency_ms(ms).as_str())
            .unwrap_or("best-effort");
        let cluster = updater
            .status()
            .placement_decisions
            .first()
            .map(|d| d.cluster.clone())
            .unwrap_or_default();
        metrics::record_slice_deployment_time(&slice_type, &cluster, qos_class, total_secs);

        let slice_metrics = updater
            .status_mut()
            .metrics
            .get_or_insert_with(SliceMetrics::default);
        slice_metrics.deployment_duration_seconds = Some(deployment_secs);
        slice_metrics.total_duration_seconds = Some(total_secs);

        info!(intent = %name, total_secs = total_secs, "Slice ready");
        updater.transition(IntentPhase::Ready, "all network functions ready");
        updater.set_condition(create_condition(
            CONDITION_TYPE_READY,
            "True",
            REASON_ALL_FUNCTIONS_READY,
            &format!("{ready_count} of {} functions ready", expected.len()),
        ));
        updater.apply(&ctx.client).await?;
        return Ok(requeue_for(IntentPhase::Ready));
    }

    updater.status_mut().message = Some(format!(
        "{ready_count} of {} functions ready",
        expected.len()
    ));
    updater.apply(&ctx.client).await?;
    Ok(requeue_for(IntentPhase::Deploying))
}

/// Ready: periodic health poll. Degradation flips the Ready condition but
/// keeps the phase; the slice stays under its five-minute watch.
async fn handle_ready(
    ctx: &Context,
    intent: &NetworkSliceIntent,
    mut updater: IntentStatusUpdater,
) -> Result<Action> {
    let name = intent.name_any();
    match ctx.deployments.get_status(&name).await {
        Ok(reported) => {
            let expected: Vec<_> = intent
                .spec
                .network_functions
                .iter()
                .map(|f| f.r#type)
                .collect();
            let observation = observe(&expected, reported);
            updater.status_mut().deployed_functions = observation.functions.clone();

            if observation.all_ready {
                updater.set_condition(create_condition(
                    CONDITION_TYPE_READY,
                    "True",
                    REASON_ALL_FUNCTIONS_READY,
                    "health poll ok",
                ));
            } else {
                warn!(intent = %name, "Slice degraded during health poll");
                updater.set_condition(create_condition(
                    CONDITION_TYPE_READY,
                    "False",
                    REASON_DEGRADED,
                    "one or more functions regressed after Ready",
                ));
            }
            updater.apply(&ctx.client).await?;
        }
        Err(error) => {
            warn!(error = %error, "Health poll failed");
        }
    }
    Ok(requeue_for(IntentPhase::Ready))
}

/// Reconcile one `NetworkSliceIntent`.
///
/// # Errors
///
/// Returns an error when a status write or finalizer patch fails; the
/// controller's error policy requeues.
pub async fn reconcile_intent(ctx: Arc<Context>, intent: NetworkSliceIntent) -> Result<Action> {
    let namespace = intent.namespace().unwrap_or_default();
    let name = intent.name_any();

    // Single-writer-per-intent: the same intent never reconciles twice at
    // once; different intents proceed in parallel.
    let lock = ctx.intent_lock(&namespace, &name);
    let _guard = lock.lock().await;

    // Re-fetch: the watch event may carry a stale status.
    let api: Api<NetworkSliceIntent> = Api::namespaced(ctx.client.clone(), &namespace);
    let intent = match api.get(&name).await {
        Ok(fresh) => fresh,
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!(intent = %name, "Intent gone before reconcile");
            return Ok(Action::await_change());
        }
        Err(e) => return Err(e.into()),
    };

    if intent.metadata.deletion_timestamp.is_some() {
        return handle_deletion(&ctx, &intent).await;
    }

    // First observation: attach the finalizer and persist the Pending phase
    // before any work happens.
    if intent.status.is_none() {
        ensure_finalizer(&ctx.client, &intent, FINALIZER_NETWORK_SLICE_INTENT).await?;
        let mut updater = IntentStatusUpdater::new(&intent);
        updater.transition(IntentPhase::Pending, "intent observed");
        updater.apply(&ctx.client).await?;
        return Ok(requeue_for(IntentPhase::Pending));
    }
    ensure_finalizer(&ctx.client, &intent, FINALIZER_NETWORK_SLICE_INTENT).await?;

    let updater = IntentStatusUpdater::new(&intent);
    let phase = updater.status().phase;
    let spec_changed = super::should_reconcile(
        intent.metadata.generation,
        updater.status().observed_generation,
    );

    // A spec edit re-enters the cycle from Pending with a fresh slate;
    // recorded package revisions survive so deletion stays complete.
    if matches!(phase, IntentPhase::Failed | IntentPhase::Ready) && spec_changed {
        info!(intent = %name, "Spec changed; re-entering cycle");
        let mut updater = updater;
        let status = updater.status_mut();
        status.placement_decisions.clear();
        status.deployed_functions.clear();
        status.metrics = None;
        status.started_at = None;
        updater.transition(IntentPhase::Pending, "spec updated; re-entering cycle");
        updater.apply(&ctx.client).await?;
        return Ok(requeue_for(IntentPhase::Pending));
    }

    match phase {
        IntentPhase::Pending => handle_pending(&ctx, &intent, updater).await,
        IntentPhase::Planning => handle_planning(&ctx, &intent, updater).await,
        IntentPhase::Packaging => handle_packaging(&ctx, &intent, updater).await,
        IntentPhase::Deploying => handle_deploying(&ctx, &intent, updater).await,
        IntentPhase::Ready => handle_ready(&ctx, &intent, updater).await,
        // Terminal until the spec's generation advances.
        IntentPhase::Failed => Ok(Action::await_change()),
    }
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod intent_tests;
