// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Great-circle distance between sites.

use crate::inventory::Coordinates;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance in kilometers beyond which paired functions earn no
/// geographic-affinity score.
pub const AFFINITY_RANGE_KM: f64 = 1000.0;

/// Great-circle distance between two coordinates in kilometers (haversine).
#[must_use]
pub fn great_circle_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Scale a pairing distance into the [0, 20] geographic-affinity score.
/// Co-located functions earn the full 20; the score decays linearly to zero
/// at [`AFFINITY_RANGE_KM`].
#[must_use]
pub fn affinity_score(distance_km: f64) -> f64 {
    20.0 * (1.0 - distance_km / AFFINITY_RANGE_KM).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "geo_tests.rs"]
mod geo_tests;
