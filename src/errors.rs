// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error taxonomy for the intent reconciliation engine and its collaborators.
//!
//! Every failure the engine can observe maps to exactly one variant here.
//! Each variant carries a stable machine-readable reason (surfaced verbatim
//! in the intent's status conditions) and a human message, and classifies
//! itself as transient (retried with capped backoff) or terminal (the intent
//! goes straight to Failed).

use crate::status_reasons;
use thiserror::Error;

/// Failures observed while reconciling a `NetworkSliceIntent`.
#[derive(Error, Debug, Clone)]
pub enum IntentError {
    /// The intent spec failed validation (malformed QoS values, empty
    /// function list, unknown slice type). Terminal, never retried.
    #[error("intent validation failed: {reason}")]
    Validation {
        /// Explanation of what is invalid
        reason: String,
    },

    /// No site satisfies the hard constraints for a function. Terminal;
    /// the planner never partially commits.
    #[error("function '{function}' is unplaceable: {reason}")]
    Unplaceable {
        /// The network function that could not be placed
        function: String,
        /// Why every candidate site was disqualified
        reason: String,
    },

    /// The inventory service could not be reached or returned an error.
    /// Transient; retried with backoff up to the per-phase cap.
    #[error("inventory service unavailable: {reason}")]
    InventoryUnavailable {
        /// Underlying transport or service error
        reason: String,
    },

    /// Package rendering failed. A determinism defect is terminal; an IO
    /// failure while rendering is transient.
    #[error("failed to render package '{package}': {reason}")]
    Render {
        /// The package that failed to render
        package: String,
        /// Specific reason for the failure
        reason: String,
        /// Whether the failure is worth retrying
        transient: bool,
    },

    /// A rendered package violated one of its declarative validation rules.
    /// Terminal: the rendered output is defective, retrying cannot help.
    #[error("package '{package}' violated validation rule '{rule}': {reason}")]
    ValidationRule {
        /// The package that failed validation
        package: String,
        /// The rule that was violated
        rule: String,
        /// Explanation of the violation
        reason: String,
    },

    /// Creating a package revision in the external service failed.
    /// Transient up to the retry cap, then terminal for the Packaging
    /// phase. A missing repository is permanent: repositories are
    /// provisioned out of band and never retried into existence.
    #[error("failed to create revision for package '{package}' in repository '{repository}': {reason}")]
    RevisionCreate {
        /// The package whose revision could not be created
        package: String,
        /// The target repository
        repository: String,
        /// Underlying service error
        reason: String,
        /// Whether the failure is worth retrying
        transient: bool,
    },

    /// A package revision did not reach the requested lifecycle within the
    /// polling cap. Reported as a warning; the intent still advances when
    /// every other package is Published.
    #[error("revision '{revision}' stuck in lifecycle '{lifecycle}'")]
    RevisionLifecycleStuck {
        /// The stuck revision name
        revision: String,
        /// The lifecycle it is stuck in
        lifecycle: String,
    },

    /// The deployment-management service could not report status.
    /// Transient; retried on the Deploying poll cadence.
    #[error("deployment status query failed: {reason}")]
    DeploymentStatus {
        /// Underlying transport or service error
        reason: String,
    },

    /// A phase (or the whole intent) exceeded its deadline. Terminal.
    #[error("phase '{phase}' exceeded its deadline of {deadline_secs}s")]
    PhaseTimeout {
        /// The phase that timed out
        phase: String,
        /// The deadline that was exceeded, in seconds
        deadline_secs: u64,
    },

    /// A status write lost an optimistic-concurrency race and exhausted its
    /// refetch-and-retry budget. Transient at the reconcile level: the next
    /// loop observes the winner's write.
    #[error("status write conflict for intent '{intent}' after {attempts} attempts")]
    ConcurrencyConflict {
        /// The intent whose status write conflicted
        intent: String,
        /// How many attempts were made
        attempts: u32,
    },
}

impl IntentError {
    /// The stable machine-readable reason for this error, surfaced verbatim
    /// in status conditions.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            IntentError::Validation { .. } => status_reasons::REASON_VALIDATION_ERROR,
            IntentError::Unplaceable { .. } => status_reasons::REASON_UNPLACEABLE,
            IntentError::InventoryUnavailable { .. } => {
                status_reasons::REASON_INVENTORY_UNAVAILABLE
            }
            IntentError::Render { .. } => status_reasons::REASON_RENDER_ERROR,
            IntentError::ValidationRule { .. } => status_reasons::REASON_VALIDATION_RULE_VIOLATION,
            IntentError::RevisionCreate { .. } => status_reasons::REASON_REVISION_CREATE_ERROR,
            IntentError::RevisionLifecycleStuck { .. } => {
                status_reasons::REASON_REVISION_LIFECYCLE_STUCK
            }
            IntentError::DeploymentStatus { .. } => status_reasons::REASON_DEPLOYMENT_STATUS_ERROR,
            IntentError::PhaseTimeout { .. } => status_reasons::REASON_PHASE_TIMEOUT,
            IntentError::ConcurrencyConflict { .. } => status_reasons::REASON_CONCURRENCY_CONFLICT,
        }
    }

    /// Whether the engine should retry (with capped backoff) rather than
    /// move the intent to Failed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            IntentError::Validation { .. }
            | IntentError::Unplaceable { .. }
            | IntentError::ValidationRule { .. }
            | IntentError::PhaseTimeout { .. } => false,
            IntentError::Render { transient, .. }
            | IntentError::RevisionCreate { transient, .. } => *transient,
            IntentError::InventoryUnavailable { .. }
            | IntentError::RevisionLifecycleStuck { .. }
            | IntentError::DeploymentStatus { .. }
            | IntentError::ConcurrencyConflict { .. } => true,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
