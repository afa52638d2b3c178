// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for slice intents.
//!
//! This module defines constants for condition reasons following Kubernetes
//! conventions. Reasons are programmatic identifiers in CamelCase that explain
//! why a condition has a particular status, and are surfaced verbatim from the
//! error taxonomy in [`crate::errors`].
//!
//! # Condition Types
//!
//! Every `NetworkSliceIntent` carries a single encompassing `type: Ready`
//! condition reporting overall slice health, plus a `type: Progressing`
//! condition while the intent moves through the Planning/Packaging/Deploying
//! phases.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   phase: Failed
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: UnplaceableError
//!       message: "no site satisfies hard constraints for function upf"
//! ```

// ============================================================================
// Error-Kind Reasons (one per taxonomy entry)
// ============================================================================

/// Intent validation failed; terminal, never retried.
pub const REASON_VALIDATION_ERROR: &str = "ValidationError";

/// No site satisfies the hard constraints for some function; terminal.
pub const REASON_UNPLACEABLE: &str = "UnplaceableError";

/// The inventory service could not be reached; retried with backoff.
pub const REASON_INVENTORY_UNAVAILABLE: &str = "InventoryUnavailable";

/// Package rendering failed.
pub const REASON_RENDER_ERROR: &str = "RenderError";

/// A rendered package violated one of its declarative validation rules; terminal.
pub const REASON_VALIDATION_RULE_VIOLATION: &str = "ValidationRuleViolation";

/// Creating a package revision in the external service failed.
pub const REASON_REVISION_CREATE_ERROR: &str = "RevisionCreateError";

/// A package revision is stuck mid-lifecycle; warning, intent still advances.
pub const REASON_REVISION_LIFECYCLE_STUCK: &str = "RevisionLifecycleStuck";

/// The deployment-management service could not report status.
pub const REASON_DEPLOYMENT_STATUS_ERROR: &str = "DeploymentStatusError";

/// A phase exceeded its deadline; terminal.
pub const REASON_PHASE_TIMEOUT: &str = "PhaseTimeout";

/// A status write lost an optimistic-concurrency race.
pub const REASON_CONCURRENCY_CONFLICT: &str = "ConcurrencyConflict";

// ============================================================================
// Progress Reasons
// ============================================================================

/// All network functions report ready.
pub const REASON_ALL_FUNCTIONS_READY: &str = "AllFunctionsReady";

/// The intent is moving through its lifecycle.
pub const REASON_PROGRESSING: &str = "Progressing";

/// A function previously ready has regressed; the phase stays Ready.
pub const REASON_DEGRADED: &str = "Degraded";

// ============================================================================
// Condition Types
// ============================================================================

/// Primary condition type indicating overall slice readiness.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition type reporting in-flight lifecycle progress.
pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";

/// The full enumerated error-kind set, as surfaced in Failed conditions.
pub const ERROR_KIND_REASONS: &[&str] = &[
    REASON_VALIDATION_ERROR,
    REASON_UNPLACEABLE,
    REASON_INVENTORY_UNAVAILABLE,
    REASON_RENDER_ERROR,
    REASON_VALIDATION_RULE_VIOLATION,
    REASON_REVISION_CREATE_ERROR,
    REASON_REVISION_LIFECYCLE_STUCK,
    REASON_DEPLOYMENT_STATUS_ERROR,
    REASON_PHASE_TIMEOUT,
    REASON_CONCURRENCY_CONFLICT,
];

/// Check whether a condition reason belongs to the enumerated error-kind set.
#[must_use]
pub fn is_error_kind_reason(reason: &str) -> bool {
    ERROR_KIND_REASONS.contains(&reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_reasons_are_camel_case() {
        for reason in ERROR_KIND_REASONS {
            assert!(
                reason.chars().next().unwrap().is_ascii_uppercase(),
                "reason {reason} should be CamelCase"
            );
            assert!(
                !reason.contains(' ') && !reason.contains('_'),
                "reason {reason} should not contain separators"
            );
        }
    }

    #[test]
    fn test_is_error_kind_reason() {
        assert!(is_error_kind_reason("ValidationError"));
        assert!(is_error_kind_reason("PhaseTimeout"));
        assert!(!is_error_kind_reason("AllFunctionsReady"));
        assert!(!is_error_kind_reason(""));
    }
}
