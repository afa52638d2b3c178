// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Client for the external site inventory service.
//!
//! The inventory service owns the catalog of physical sites: their
//! coordinates, cloud tier, declared capacity and latency class. The planner
//! treats a snapshot of this catalog as immutable for the duration of a
//! Planning pass.

use crate::constants::INVENTORY_CALL_TIMEOUT;
use crate::errors::IntentError;
use crate::labels::SITE_CLUSTER_LABEL;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Geographic coordinates of a site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Declared capacity vector of a site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteCapacity {
    pub cpu_cores: f64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    pub bandwidth_mbps: f64,
}

/// A physical site as reported by the inventory service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Stable site identifier; also the placement tie-breaker.
    pub id: String,

    /// Human-readable site name.
    pub name: String,

    /// Cloud tier: "edge", "regional" or "central".
    pub cloud_type: String,

    /// Geographic location.
    pub coordinates: Coordinates,

    /// Declared capacity.
    pub capacity: SiteCapacity,

    /// Observed latency class in milliseconds.
    pub latency_class_ms: f64,

    /// Free-form site labels; carries region/zone and the hosting cluster.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Site {
    /// The workload cluster hosting this site, read from the site labels.
    /// A site without a hosting cluster cannot receive packages.
    #[must_use]
    pub fn cluster(&self) -> Option<&str> {
        self.labels.get(SITE_CLUSTER_LABEL).map(String::as_str)
    }

    /// Region label, when declared.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.labels
            .get("topology.kubernetes.io/region")
            .map(String::as_str)
    }

    /// Zone label, when declared.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.labels
            .get("topology.kubernetes.io/zone")
            .map(String::as_str)
    }
}

/// Access to the external inventory service.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// List every site currently available for placement.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::InventoryUnavailable`] when the service cannot
    /// be reached or replies with an error.
    async fn list_available_sites(&self) -> Result<Vec<Site>, IntentError>;
}

/// HTTP implementation of [`InventoryService`].
pub struct HttpInventoryClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ListSitesResponse {
    sites: Vec<Site>,
}

impl HttpInventoryClient {
    /// Create a client for the inventory service at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl InventoryService for HttpInventoryClient {
    async fn list_available_sites(&self) -> Result<Vec<Site>, IntentError> {
        let url = format!("{}/api/v1/sites", self.base_url);
        debug!(url = %url, "Querying inventory for available sites");

        let response = self
            .http_client
            .get(&url)
            .timeout(INVENTORY_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntentError::InventoryUnavailable {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(IntentError::InventoryUnavailable {
                reason: format!("inventory returned HTTP {}", response.status()),
            });
        }

        let body: ListSitesResponse =
            response
                .json()
                .await
                .map_err(|e| IntentError::InventoryUnavailable {
                    reason: format!("malformed inventory response: {e}"),
                })?;

        debug!(count = body.sites.len(), "Inventory returned sites");
        Ok(body.sites)
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;
