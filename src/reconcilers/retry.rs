// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Capped exponential backoff for transient failures.
//!
//! Transient errors (inventory outages, revision-create failures, deployment
//! status hiccups) are retried with exponential backoff: base 2 seconds,
//! doubling per attempt, capped at 60 seconds, with ±20% jitter to keep a
//! fleet of intents from retrying in lockstep. After five attempts in one
//! phase the intent is declared Failed.

use crate::constants::{
    BACKOFF_BASE_SECS, BACKOFF_CAP_SECS, BACKOFF_JITTER_FACTOR, MAX_RETRIES_PER_PHASE,
};
use rand::RngExt;
use std::time::Duration;

/// Backoff delay before retry number `attempt` (zero-based), with jitter.
///
/// Attempt 0 waits ~2 s, attempt 1 ~4 s, attempt 2 ~8 s, and so on up to the
/// 60-second cap.
#[must_use]
pub fn backoff_delay(attempt: i32) -> Duration {
    let exponent = attempt.clamp(0, 30) as u32;
    let base = BACKOFF_BASE_SECS.saturating_mul(1u64 << exponent);
    let capped = base.min(BACKOFF_CAP_SECS) as f64;

    let mut rng = rand::rng();
    let jitter = rng.random_range(-BACKOFF_JITTER_FACTOR..=BACKOFF_JITTER_FACTOR);
    Duration::from_secs_f64((capped * (1.0 + jitter)).max(0.0))
}

/// Backoff delay without jitter; used where determinism matters more than
/// desynchronization (and in tests).
#[must_use]
pub fn backoff_delay_base(attempt: i32) -> Duration {
    let exponent = attempt.clamp(0, 30) as u32;
    let base = BACKOFF_BASE_SECS.saturating_mul(1u64 << exponent);
    Duration::from_secs(base.min(BACKOFF_CAP_SECS))
}

/// Whether another retry is allowed after `retry_count` failures in the
/// current phase.
#[must_use]
pub fn retries_remaining(retry_count: i32) -> bool {
    retry_count < MAX_RETRIES_PER_PHASE
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
