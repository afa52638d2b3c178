// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation machinery for network slice intents.
//!
//! This module contains the intent reconciliation engine and its support
//! code. The engine follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor intent changes via the Kubernetes API
//! 2. **Reconcile** - Compare the desired slice (spec) with observed state
//! 3. **Act** - Plan placement, render packages, publish revisions
//! 4. **Status** - Report the phase and conditions back to Kubernetes
//!
//! # Modules
//!
//! - [`intent`] - The phase state machine driving Pending through Ready
//! - [`finalizers`] - Idempotent finalizer add/remove patches
//! - [`retry`] - Capped exponential backoff for transient failures
//! - [`status`] - Condition helpers and the batched status writer

pub mod finalizers;
pub mod intent;
pub mod retry;
pub mod status;

pub use intent::{reconcile_intent, requeue_for, validate_intent};

/// Check if a resource's spec has changed by comparing generation with
/// `observed_generation`.
///
/// The `metadata.generation` field is incremented by Kubernetes only when
/// the spec changes, while `status.observed_generation` is set by the
/// controller after processing a spec. The engine only re-plans when the
/// generation has advanced past what it already observed.
///
/// # Returns
///
/// * `true` - Reconciliation is needed (spec changed or first reconciliation)
/// * `false` - No reconciliation needed (spec unchanged, status-only update)
#[must_use]
pub fn should_reconcile(current_generation: Option<i64>, observed_generation: Option<i64>) -> bool {
    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        (Some(_), None) => true, // First reconciliation
        _ => false,              // No generation tracking available
    }
}
