// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Package-revision service client and the package publisher.
//!
//! The external package-revision service stores versioned packages in
//! per-cluster Git repositories and owns their content; this operator owns
//! their lifecycle. The publisher drives each rendered package through
//! Draft → Proposed → Published, polling the service's readiness conditions
//! with a bounded cap per transition.
//!
//! Lifecycle stalls after the cap are warnings, not failures: the downstream
//! sync agent retries on its own, so an intent still advances when every
//! other package is Published. Failing to *create* a revision, on the other
//! hand, is fatal for the Packaging phase.

use crate::constants::{
    PACKAGE_WORKSPACE, PUBLISH_CONCURRENCY, REVISION_CALL_TIMEOUT,
    REVISION_LIFECYCLE_POLL_SECS, REVISION_LIFECYCLE_TRANSITION_CAP,
};
use crate::crd::PackageRevisionRef;
use crate::errors::IntentError;
use crate::package::{Package, PackageCategory};
use crate::reconcilers::retry::backoff_delay;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Revision lifecycle values.
pub const LIFECYCLE_DRAFT: &str = "Draft";
pub const LIFECYCLE_PROPOSED: &str = "Proposed";
pub const LIFECYCLE_PUBLISHED: &str = "Published";
pub const LIFECYCLE_DELETION_START: &str = "DeletionStart";

/// Upstream-lock block recording where a revision's content came from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamLock {
    pub repo: String,
    pub directory: String,
    pub r#ref: String,
}

/// A package revision held in the external service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevision {
    /// Service-wide revision name: `<repository>.<package>.<workspace>`.
    pub name: String,
    pub repository: String,
    pub package_name: String,
    pub revision: String,
    pub workspace_name: String,
    pub lifecycle: String,
    /// Readiness condition reported by the service; lifecycle transitions
    /// are gated on it.
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_lock: Option<UpstreamLock>,
}

/// Deterministic revision name for a package in a repository.
#[must_use]
pub fn revision_name(repository: &str, package_name: &str, workspace: &str) -> String {
    format!("{repository}.{package_name}.{workspace}")
}

/// Access to the external package-revision service.
#[async_trait]
pub trait PackageRevisionService: Send + Sync {
    /// Create a draft revision. The target repository must already exist.
    async fn create(&self, revision: &PackageRevision) -> Result<PackageRevision, IntentError>;

    /// Fetch a revision by name.
    async fn get(&self, name: &str) -> Result<PackageRevision, IntentError>;

    /// List revisions in a repository.
    async fn list(&self, repository: &str) -> Result<Vec<PackageRevision>, IntentError>;

    /// Update a revision record (lifecycle changes).
    async fn update(&self, revision: &PackageRevision) -> Result<(), IntentError>;

    /// Upload a package's rendered resources into a draft revision.
    async fn update_resources(&self, name: &str, package: &Package) -> Result<(), IntentError>;

    /// Ask the service to move the revision Draft → Proposed.
    async fn propose(&self, name: &str) -> Result<(), IntentError>;

    /// Ask the service to move the revision Proposed → Published.
    async fn publish(&self, name: &str) -> Result<(), IntentError>;

    /// Remove a revision. Deleting an absent revision is a success.
    async fn delete(&self, name: &str) -> Result<(), IntentError>;
}

/// HTTP implementation of [`PackageRevisionService`].
pub struct HttpPorchClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ListRevisionsResponse {
    revisions: Vec<PackageRevision>,
}

#[derive(Serialize)]
struct UploadResourcesRequest<'a> {
    kptfile: &'a crate::package::Kptfile,
    files: BTreeMap<String, &'a serde_json::Value>,
}

impl HttpPorchClient {
    /// Create a client for the package-revision service at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn create_error(package: &str, repository: &str, reason: String) -> IntentError {
        IntentError::RevisionCreate {
            package: package.to_string(),
            repository: repository.to_string(),
            reason,
            transient: true,
        }
    }
}

#[async_trait]
impl PackageRevisionService for HttpPorchClient {
    async fn create(&self, revision: &PackageRevision) -> Result<PackageRevision, IntentError> {
        let url = format!(
            "{}/api/v1/repositories/{}/packagerevisions",
            self.base_url, revision.repository
        );
        let response = self
            .http_client
            .post(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .json(revision)
            .send()
            .await
            .map_err(|e| {
                Self::create_error(&revision.package_name, &revision.repository, e.to_string())
            })?;

        match response.status() {
            status if status.is_success() => {
                response.json().await.map_err(|e| {
                    Self::create_error(
                        &revision.package_name,
                        &revision.repository,
                        format!("malformed create response: {e}"),
                    )
                })
            }
            // The publisher does not create repositories; a missing one is a
            // clean failure, not something to retry into existence.
            reqwest::StatusCode::NOT_FOUND => Err(IntentError::RevisionCreate {
                package: revision.package_name.clone(),
                repository: revision.repository.clone(),
                reason: format!("repository '{}' does not exist", revision.repository),
                transient: false,
            }),
            status => Err(Self::create_error(
                &revision.package_name,
                &revision.repository,
                format!("create returned HTTP {status}"),
            )),
        }
    }

    async fn get(&self, name: &str) -> Result<PackageRevision, IntentError> {
        let url = format!("{}/api/v1/packagerevisions/{name}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::create_error(name, "", e.to_string()))?;

        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| Self::create_error(name, "", format!("malformed revision: {e}")))
        } else {
            Err(Self::create_error(
                name,
                "",
                format!("get returned HTTP {}", response.status()),
            ))
        }
    }

    async fn list(&self, repository: &str) -> Result<Vec<PackageRevision>, IntentError> {
        let url = format!(
            "{}/api/v1/repositories/{repository}/packagerevisions",
            self.base_url
        );
        let response = self
            .http_client
            .get(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::create_error("", repository, e.to_string()))?;

        if response.status().is_success() {
            let body: ListRevisionsResponse = response
                .json()
                .await
                .map_err(|e| Self::create_error("", repository, format!("malformed list: {e}")))?;
            Ok(body.revisions)
        } else {
            Err(Self::create_error(
                "",
                repository,
                format!("list returned HTTP {}", response.status()),
            ))
        }
    }

    async fn update(&self, revision: &PackageRevision) -> Result<(), IntentError> {
        let url = format!("{}/api/v1/packagerevisions/{}", self.base_url, revision.name);
        let response = self
            .http_client
            .put(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .json(revision)
            .send()
            .await
            .map_err(|e| {
                Self::create_error(&revision.package_name, &revision.repository, e.to_string())
            })?;

        // Updating an absent revision is treated as done: the record the
        // update wanted to change no longer exists.
        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(Self::create_error(
                &revision.package_name,
                &revision.repository,
                format!("update returned HTTP {}", response.status()),
            ))
        }
    }

    async fn update_resources(&self, name: &str, package: &Package) -> Result<(), IntentError> {
        let url = format!(
            "{}/api/v1/packagerevisions/{name}/resources",
            self.base_url
        );
        let request = UploadResourcesRequest {
            kptfile: &package.kptfile,
            files: package
                .resources
                .iter()
                .map(|r| (r.filename.clone(), &r.manifest))
                .collect(),
        };
        let response = self
            .http_client
            .put(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::create_error(&package.metadata.name, "", e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::create_error(
                &package.metadata.name,
                "",
                format!("resource upload returned HTTP {}", response.status()),
            ))
        }
    }

    async fn propose(&self, name: &str) -> Result<(), IntentError> {
        self.lifecycle_post(name, "propose").await
    }

    async fn publish(&self, name: &str) -> Result<(), IntentError> {
        self.lifecycle_post(name, "approve").await
    }

    async fn delete(&self, name: &str) -> Result<(), IntentError> {
        let url = format!("{}/api/v1/packagerevisions/{name}", self.base_url);
        let response = self
            .http_client
            .delete(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::create_error(name, "", e.to_string()))?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(Self::create_error(
                name,
                "",
                format!("delete returned HTTP {}", response.status()),
            ))
        }
    }
}

impl HttpPorchClient {
    async fn lifecycle_post(&self, name: &str, verb: &str) -> Result<(), IntentError> {
        let url = format!("{}/api/v1/packagerevisions/{name}/{verb}", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .timeout(REVISION_CALL_TIMEOUT)
            .send()
            .await
            .map_err(|e| IntentError::RevisionLifecycleStuck {
                revision: name.to_string(),
                lifecycle: format!("{verb} failed: {e}"),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IntentError::RevisionLifecycleStuck {
                revision: name.to_string(),
                lifecycle: format!("{verb} returned HTTP {}", response.status()),
            })
        }
    }
}

/// Result of publishing every package of an intent.
///
/// Revisions that were created are always reported, even when a sibling
/// package failed: the engine records them in status before acting on the
/// failure, so no revision in the external service goes untracked.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    /// One reference per successfully created revision, Draft or Published.
    pub revisions: Vec<PackageRevisionRef>,
    /// Lifecycle stalls and other non-fatal findings.
    pub warnings: Vec<String>,
    /// First fatal per-package failure, if any. The phase must not advance
    /// while this is set.
    pub failure: Option<IntentError>,
}

/// Repository a package is published to: the management repository for the
/// slice-orchestration package, the target cluster's repository (named after
/// the cluster) for everything else.
#[must_use]
pub fn repository_for(package: &Package, management_repository: &str) -> String {
    match package.metadata.category {
        PackageCategory::SliceOrchestration => management_repository.to_string(),
        PackageCategory::Function | PackageCategory::SyncWiring => package
            .targets
            .first()
            .map(|t| t.cluster.clone())
            .unwrap_or_else(|| management_repository.to_string()),
    }
}

/// Order packages so every package publishes after the dependencies it names
/// within this set. External dependencies (the common packages) are not part
/// of the set and do not constrain the order.
///
/// # Errors
///
/// Returns [`IntentError::Render`] on a dependency cycle, which is a spec
/// defect rather than something to retry.
pub fn publication_order(packages: &[Package]) -> Result<Vec<usize>, IntentError> {
    let names: BTreeMap<&str, usize> = packages
        .iter()
        .enumerate()
        .map(|(i, p)| (p.metadata.name.as_str(), i))
        .collect();

    let mut order = Vec::with_capacity(packages.len());
    let mut done: BTreeSet<usize> = BTreeSet::new();
    let mut in_progress: BTreeSet<usize> = BTreeSet::new();

    fn visit(
        index: usize,
        packages: &[Package],
        names: &BTreeMap<&str, usize>,
        done: &mut BTreeSet<usize>,
        in_progress: &mut BTreeSet<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), IntentError> {
        if done.contains(&index) {
            return Ok(());
        }
        if !in_progress.insert(index) {
            return Err(IntentError::Render {
                package: packages[index].metadata.name.clone(),
                reason: "dependency cycle among packages".to_string(),
                transient: false,
            });
        }
        for dep in &packages[index].dependencies {
            // Dependencies are name-based; strip the version pin.
            let dep_name = dep.split('@').next().unwrap_or(dep);
            if let Some(&dep_index) = names.get(dep_name) {
                if dep_index != index {
                    visit(dep_index, packages, names, done, in_progress, order)?;
                }
            }
        }
        in_progress.remove(&index);
        done.insert(index);
        order.push(index);
        Ok(())
    }

    for index in 0..packages.len() {
        visit(
            index,
            packages,
            &names,
            &mut done,
            &mut in_progress,
            &mut order,
        )?;
    }
    Ok(order)
}

/// Drives rendered packages through the package-revision lifecycle.
pub struct PackagePublisher<'a> {
    service: &'a dyn PackageRevisionService,
    management_repository: String,
}

impl<'a> PackagePublisher<'a> {
    #[must_use]
    pub fn new(service: &'a dyn PackageRevisionService, management_repository: &str) -> Self {
        Self {
            service,
            management_repository: management_repository.to_string(),
        }
    }

    /// Ensure a draft revision exists for `package`, retrying transient
    /// create failures with capped exponential backoff.
    async fn ensure_draft(&self, package: &Package) -> Result<PackageRevision, IntentError> {
        let repository = repository_for(package, &self.management_repository);

        // Reuse an existing draft if a previous Packaging pass created one;
        // creation is idempotent-by-name.
        if let Ok(existing) = self.service.list(&repository).await {
            if let Some(found) = existing.into_iter().find(|r| {
                r.package_name == package.metadata.name && r.workspace_name == PACKAGE_WORKSPACE
            }) {
                debug!(revision = %found.name, "Reusing existing revision");
                return Ok(found);
            }
        }

        let want = PackageRevision {
            name: revision_name(&repository, &package.metadata.name, PACKAGE_WORKSPACE),
            repository: repository.clone(),
            package_name: package.metadata.name.clone(),
            revision: package.metadata.version.clone(),
            workspace_name: PACKAGE_WORKSPACE.to_string(),
            lifecycle: LIFECYCLE_DRAFT.to_string(),
            ready: false,
            upstream_lock: None,
        };

        let mut last_err = None;
        for attempt in 0..crate::constants::MAX_RETRIES_PER_PHASE {
            match self.service.create(&want).await {
                Ok(created) => return Ok(created),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!(
                        package = %package.metadata.name,
                        attempt = attempt + 1,
                        error = %e,
                        "Revision create failed"
                    );
                    last_err = Some(e);
                    if attempt + 1 < crate::constants::MAX_RETRIES_PER_PHASE {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            HttpPorchClient::create_error(&package.metadata.name, &repository, "unreachable".into())
        }))
    }

    /// Poll until the revision reaches `lifecycle`, bounded by the
    /// per-transition cap. Returns false when the cap expires.
    async fn await_lifecycle(&self, name: &str, lifecycle: &str) -> bool {
        let started = Instant::now();
        loop {
            match self.service.get(name).await {
                Ok(revision) if revision.lifecycle == lifecycle && revision.ready => return true,
                Ok(_) | Err(_) => {}
            }
            if started.elapsed() >= REVISION_LIFECYCLE_TRANSITION_CAP {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_secs(REVISION_LIFECYCLE_POLL_SECS)).await;
        }
    }

    /// Publish one package: ensure draft, upload resources, propose, publish.
    async fn publish_one(
        &self,
        package: &Package,
    ) -> Result<(PackageRevisionRef, Option<String>), IntentError> {
        let draft = self.ensure_draft(package).await?;
        self.service.update_resources(&draft.name, package).await?;

        let mut warning = None;
        let mut lifecycle = draft.lifecycle.clone();

        if lifecycle == LIFECYCLE_DRAFT {
            let proposed = match self.service.propose(&draft.name).await {
                Ok(()) => self.await_lifecycle(&draft.name, LIFECYCLE_PROPOSED).await,
                Err(_) => false,
            };
            if proposed {
                lifecycle = LIFECYCLE_PROPOSED.to_string();
            } else {
                warning = Some(format!(
                    "revision '{}' stuck in Draft after propose",
                    draft.name
                ));
            }
        }

        if lifecycle == LIFECYCLE_PROPOSED {
            let published = match self.service.publish(&draft.name).await {
                Ok(()) => self.await_lifecycle(&draft.name, LIFECYCLE_PUBLISHED).await,
                Err(_) => false,
            };
            if published {
                lifecycle = LIFECYCLE_PUBLISHED.to_string();
            } else {
                warning = Some(format!(
                    "revision '{}' stuck in Proposed after publish",
                    draft.name
                ));
            }
        }

        info!(
            revision = %draft.name,
            lifecycle = %lifecycle,
            "Package revision advanced"
        );

        Ok((
            PackageRevisionRef {
                repository: draft.repository,
                package_name: draft.package_name,
                revision: draft.revision,
                workspace: draft.workspace_name,
                lifecycle,
            },
            warning,
        ))
    }

    /// Publish every package of an intent.
    ///
    /// Publication proceeds in topological layers: within a layer packages
    /// are independent and run in parallel up to the concurrency cap; one
    /// failure does not cancel in-flight siblings, but it does prevent the
    /// Packaging phase from advancing.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::Render`] for a dependency cycle (nothing has
    /// been created at that point). Per-package failures are reported in
    /// [`PublishOutcome::failure`] alongside the revisions that did land.
    pub async fn publish_all(&self, packages: &[Package]) -> Result<PublishOutcome, IntentError> {
        let order = publication_order(packages)?;

        let mut outcome = PublishOutcome::default();

        let results: Vec<Result<(PackageRevisionRef, Option<String>), IntentError>> =
            stream::iter(order.into_iter().map(|index| self.publish_one(&packages[index])))
                .buffer_unordered(PUBLISH_CONCURRENCY)
                .collect()
                .await;

        for result in results {
            match result {
                Ok((revision, warning)) => {
                    outcome.revisions.push(revision);
                    if let Some(warning) = warning {
                        warn!("{warning}");
                        outcome.warnings.push(warning);
                    }
                }
                Err(e) => {
                    if outcome.failure.is_none() {
                        outcome.failure = Some(e);
                    }
                }
            }
        }

        // Stable order for the status subresource.
        outcome
            .revisions
            .sort_by(|a, b| a.package_name.cmp(&b.package_name));
        Ok(outcome)
    }

    /// Delete every recorded revision: move it to DeletionStart, then remove
    /// it. Both steps are idempotent; an absent revision counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns the underlying service error so the finalizer retries.
    pub async fn delete_revisions(
        &self,
        revisions: &[PackageRevisionRef],
    ) -> Result<(), IntentError> {
        for reference in revisions {
            let name = revision_name(
                &reference.repository,
                &reference.package_name,
                &reference.workspace,
            );
            let tombstone = PackageRevision {
                name: name.clone(),
                repository: reference.repository.clone(),
                package_name: reference.package_name.clone(),
                revision: reference.revision.clone(),
                workspace_name: reference.workspace.clone(),
                lifecycle: LIFECYCLE_DELETION_START.to_string(),
                ready: false,
                upstream_lock: None,
            };
            self.service.update(&tombstone).await?;
            self.service.delete(&name).await?;
            info!(revision = %name, "Deleted package revision");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "porch_tests.rs"]
mod porch_tests;
