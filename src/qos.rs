// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Strict unit-aware parsing and classification of QoS targets.
//!
//! QoS values arrive on the intent as unit-suffixed strings (`"4.5Mbps"`,
//! `"10ms"`). Parsing is strict: a missing or unknown unit, a non-positive
//! value or trailing garbage is a [`IntentError::Validation`] and fails the
//! intent before any planning happens.

use crate::crd::SliceType;
use crate::errors::IntentError;

/// QoS class derived from the intent's latency target. Stamped on every
/// rendered resource as the `oran.io/qos-class` annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QosClass {
    /// Latency target at or below one millisecond.
    UltraLowLatency,
    /// Latency target at or below ten milliseconds.
    LowLatency,
    /// Everything else.
    BestEffort,
}

impl QosClass {
    /// Derive the class from a latency target in milliseconds.
    #[must_use]
    pub fn from_latency_ms(latency_ms: f64) -> Self {
        if latency_ms <= 1.0 {
            QosClass::UltraLowLatency
        } else if latency_ms <= 10.0 {
            QosClass::LowLatency
        } else {
            QosClass::BestEffort
        }
    }

    /// Annotation value for this class.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QosClass::UltraLowLatency => "ultra-low-latency",
            QosClass::LowLatency => "low-latency",
            QosClass::BestEffort => "best-effort",
        }
    }
}

/// Split a unit-suffixed value into its numeric part and unit part.
///
/// The numeric part is everything up to the first alphabetic character;
/// the unit is the rest. Whitespace around the value is tolerated, embedded
/// whitespace is not.
fn split_value_unit(raw: &str) -> Option<(f64, &str)> {
    let trimmed = raw.trim();
    let split_at = trimmed.find(|c: char| c.is_ascii_alphabetic())?;
    let (num, unit) = trimmed.split_at(split_at);
    let value: f64 = num.parse().ok()?;
    Some((value, unit))
}

/// Parse a bandwidth target into Mbps.
///
/// Accepted units: `Kbps`, `Mbps`, `Gbps` (case-insensitive).
///
/// # Errors
///
/// Returns [`IntentError::Validation`] for empty input, unknown units or
/// non-positive values.
pub fn parse_bandwidth_mbps(raw: &str) -> Result<f64, IntentError> {
    let (value, unit) = split_value_unit(raw).ok_or_else(|| IntentError::Validation {
        reason: format!("bandwidth '{raw}' is not a unit-suffixed number (expected e.g. '4.5Mbps')"),
    })?;

    let mbps = match unit.to_ascii_lowercase().as_str() {
        "kbps" => value / 1000.0,
        "mbps" => value,
        "gbps" => value * 1000.0,
        other => {
            return Err(IntentError::Validation {
                reason: format!("bandwidth '{raw}' has unknown unit '{other}'"),
            })
        }
    };

    if mbps > 0.0 && mbps.is_finite() {
        Ok(mbps)
    } else {
        Err(IntentError::Validation {
            reason: format!("bandwidth '{raw}' must be a positive value"),
        })
    }
}

/// Parse a latency target into milliseconds.
///
/// Accepted units: `us`, `ms`, `s` (case-insensitive).
///
/// # Errors
///
/// Returns [`IntentError::Validation`] for empty input, unknown units or
/// non-positive values.
pub fn parse_latency_ms(raw: &str) -> Result<f64, IntentError> {
    let (value, unit) = split_value_unit(raw).ok_or_else(|| IntentError::Validation {
        reason: format!("latency '{raw}' is not a unit-suffixed number (expected e.g. '10ms')"),
    })?;

    let ms = match unit.to_ascii_lowercase().as_str() {
        "us" => value / 1000.0,
        "ms" => value,
        "s" => value * 1000.0,
        other => {
            return Err(IntentError::Validation {
                reason: format!("latency '{raw}' has unknown unit '{other}'"),
            })
        }
    };

    if ms > 0.0 && ms.is_finite() {
        Ok(ms)
    } else {
        Err(IntentError::Validation {
            reason: format!("latency '{raw}' must be a positive value"),
        })
    }
}

/// Parse a reliability target as a fraction in (0, 1].
///
/// # Errors
///
/// Returns [`IntentError::Validation`] when the value is not a fraction.
pub fn parse_reliability(raw: &str) -> Result<f64, IntentError> {
    let value: f64 = raw.trim().parse().map_err(|_| IntentError::Validation {
        reason: format!("reliability '{raw}' is not a number"),
    })?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(IntentError::Validation {
            reason: format!("reliability '{raw}' must be a fraction in (0, 1]"),
        })
    }
}

/// Parse a deployment-strategy timeout into seconds.
///
/// Accepted units: `s`, `m`, `h` (case-insensitive).
///
/// # Errors
///
/// Returns [`IntentError::Validation`] for malformed values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_timeout_secs(raw: &str) -> Result<u64, IntentError> {
    let (value, unit) = split_value_unit(raw).ok_or_else(|| IntentError::Validation {
        reason: format!("timeout '{raw}' is not a unit-suffixed number (expected e.g. '600s')"),
    })?;

    let secs = match unit.to_ascii_lowercase().as_str() {
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => {
            return Err(IntentError::Validation {
                reason: format!("timeout '{raw}' has unknown unit '{other}'"),
            })
        }
    };

    if secs > 0.0 && secs.is_finite() {
        Ok(secs as u64)
    } else {
        Err(IntentError::Validation {
            reason: format!("timeout '{raw}' must be positive"),
        })
    }
}

/// Latency budget in milliseconds a slice type must meet.
#[must_use]
pub fn required_latency_ms(slice_type: SliceType) -> f64 {
    match slice_type {
        SliceType::Urllc => 1.0,
        SliceType::Embb | SliceType::Balanced => 10.0,
        SliceType::Miot => 100.0,
    }
}

/// Weight of the latency-fit term in the placement score.
#[must_use]
pub fn latency_weight(slice_type: SliceType) -> f64 {
    match slice_type {
        SliceType::Urllc => 0.5,
        SliceType::Embb | SliceType::Balanced => 0.3,
        SliceType::Miot => 0.1,
    }
}

#[cfg(test)]
#[path = "qos_tests.rs"]
mod qos_tests;
