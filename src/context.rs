// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the intent controller.
//!
//! Every reconciliation receives an `Arc<Context>` carrying the Kubernetes
//! client, handles to the three external services, and the per-intent lock
//! map that enforces the single-writer-per-intent rule: two workers never
//! reconcile the same intent at once, while different intents reconcile
//! freely in parallel.

use crate::deployment::DeploymentService;
use crate::inventory::InventoryService;
use crate::porch::PackageRevisionService;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared context passed to the reconciler.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for intent and status operations.
    pub client: Client,

    /// Site inventory service.
    pub inventory: Arc<dyn InventoryService>,

    /// Package-revision service.
    pub porch: Arc<dyn PackageRevisionService>,

    /// Deployment-management service.
    pub deployments: Arc<dyn DeploymentService>,

    /// Management repository for slice-orchestration packages.
    pub management_repository: String,

    /// Per-intent mutexes keyed by `namespace/name`.
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl Context {
    /// Build a context around a client and the three service handles.
    #[must_use]
    pub fn new(
        client: Client,
        inventory: Arc<dyn InventoryService>,
        porch: Arc<dyn PackageRevisionService>,
        deployments: Arc<dyn DeploymentService>,
        management_repository: String,
    ) -> Self {
        Self {
            client,
            inventory,
            porch,
            deployments,
            management_repository,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The mutex serializing reconciliations of one intent.
    ///
    /// The map only ever grows by one entry per distinct intent; entries are
    /// tiny and the set of intents is operator-bounded, so no eviction.
    #[must_use]
    pub fn intent_lock(&self, namespace: &str, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = format!("{namespace}/{name}");
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
