// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Placement planning for network slice intents.
//!
//! The planner is a pure function of its inputs: the same intent and the same
//! site snapshot always produce the same decision vector. For every function
//! it scores every candidate site and picks the highest-scoring site that
//! satisfies all hard constraints; ties break on lexicographic site id so the
//! output is fully deterministic.
//!
//! # Hard constraints
//!
//! Any failure disqualifies a site:
//!
//! - cloud type matches the function's hint, when one is given
//! - remaining capacity covers the function's resource floor (accounting for
//!   functions already placed on that site within this plan)
//! - explicit site/region/zone pins match
//! - required affinity/anti-affinity rules against already-placed functions
//! - the site's hosting cluster is in the intent's target-cluster list, when
//!   one is given
//!
//! # Scoring
//!
//! A weighted sum, clamped to [0, 100]: latency fit (weighted by slice type),
//! capacity headroom, a cloud-type preference bonus and a geographic-affinity
//! term for paired functions.

pub mod geo;

use crate::crd::{
    AffinityMode, NetworkFunctionSpec, NetworkFunctionType, NetworkSliceIntentSpec,
    PlacementDecision, SliceType,
};
use crate::errors::IntentError;
use crate::inventory::Site;
use crate::qos;
use std::collections::BTreeMap;
use tracing::debug;

/// Weight of the capacity-headroom term in the placement score.
const HEADROOM_WEIGHT: f64 = 0.3;

/// Bonus for matching the requested cloud type.
const CLOUD_TYPE_BONUS: f64 = 20.0;

/// Built-in pairing used for geographic affinity when a function declares no
/// explicit rules: the user plane follows its radio, session control follows
/// mobility control, the distributed unit follows its centralized unit.
fn default_pairing(function: NetworkFunctionType) -> Option<NetworkFunctionType> {
    match function {
        NetworkFunctionType::Upf => Some(NetworkFunctionType::Gnb),
        NetworkFunctionType::Smf => Some(NetworkFunctionType::Amf),
        NetworkFunctionType::Du => Some(NetworkFunctionType::Cu),
        _ => None,
    }
}

/// Per-site resources consumed by functions placed earlier in this plan.
#[derive(Default, Clone, Copy)]
struct Allocated {
    cpu_cores: f64,
    memory_gb: f64,
    storage_gb: f64,
}

/// Why a site was disqualified; folded into the unplaceable reason.
#[derive(Debug, PartialEq, Eq)]
enum Disqualification {
    CloudTypeMismatch,
    InsufficientCapacity,
    PinMismatch,
    AffinityViolation,
    NoHostingCluster,
    ClusterNotTargeted,
}

impl Disqualification {
    fn describe(&self) -> &'static str {
        match self {
            Disqualification::CloudTypeMismatch => "wrong cloud type",
            Disqualification::InsufficientCapacity => "insufficient capacity",
            Disqualification::PinMismatch => "site/region/zone pin mismatch",
            Disqualification::AffinityViolation => "affinity constraint violated",
            Disqualification::NoHostingCluster => "no hosting cluster",
            Disqualification::ClusterNotTargeted => "cluster not in target list",
        }
    }
}

/// Check every hard constraint for `site`, returning the first failure.
fn disqualify(
    site: &Site,
    function: &NetworkFunctionSpec,
    target_clusters: Option<&Vec<String>>,
    allocated: &BTreeMap<String, Allocated>,
    placed: &[(NetworkFunctionType, String)],
) -> Option<Disqualification> {
    // A site the publisher cannot deliver packages to is never a candidate.
    let Some(cluster) = site.cluster() else {
        return Some(Disqualification::NoHostingCluster);
    };

    if let Some(targets) = target_clusters {
        if !targets.iter().any(|t| t == cluster) {
            return Some(Disqualification::ClusterNotTargeted);
        }
    }

    if let Some(cloud_type) = function.placement.cloud_type {
        if site.cloud_type != cloud_type.to_string() {
            return Some(Disqualification::CloudTypeMismatch);
        }
    }

    if let Some(pin) = &function.placement.site {
        if pin != &site.id && pin != &site.name {
            return Some(Disqualification::PinMismatch);
        }
    }
    if let Some(region) = &function.placement.region {
        if site.region() != Some(region.as_str()) {
            return Some(Disqualification::PinMismatch);
        }
    }
    if let Some(zone) = &function.placement.zone {
        if site.zone() != Some(zone.as_str()) {
            return Some(Disqualification::PinMismatch);
        }
    }

    let used = allocated.get(&site.id).copied().unwrap_or_default();
    let floor = &function.resources;
    if site.capacity.cpu_cores - used.cpu_cores < floor.cpu_cores
        || site.capacity.memory_gb - used.memory_gb < floor.memory_gb
        || site.capacity.storage_gb - used.storage_gb < floor.storage_gb
    {
        return Some(Disqualification::InsufficientCapacity);
    }

    if let Some(rules) = &function.placement.affinity {
        for rule in rules.iter().filter(|r| r.required) {
            // A required rule only binds once the target function is placed;
            // placement order in the intent's function list governs this.
            for (placed_type, placed_site) in placed {
                if *placed_type != rule.target {
                    continue;
                }
                let same_site = placed_site == &site.id;
                let violated = match rule.mode {
                    AffinityMode::Affinity => !same_site,
                    AffinityMode::AntiAffinity => same_site,
                };
                if violated {
                    return Some(Disqualification::AffinityViolation);
                }
            }
        }
    }

    None
}

/// Score one candidate site for one function. Returns the score and its
/// justification strings.
fn score_site(
    site: &Site,
    function: &NetworkFunctionSpec,
    slice_type: SliceType,
    allocated: &BTreeMap<String, Allocated>,
    placed: &[(NetworkFunctionType, String)],
    sites_by_id: &BTreeMap<&str, &Site>,
) -> (f64, Vec<String>) {
    let mut justification = Vec::new();

    // Latency fit, weighted by how much the slice type cares.
    let required_ms = qos::required_latency_ms(slice_type);
    let fit = (1.0 - site.latency_class_ms / required_ms).clamp(0.0, 1.0);
    let latency_term = 100.0 * fit * qos::latency_weight(slice_type);
    if site.latency_class_ms <= required_ms {
        justification.push(format!(
            "latency budget met ({}ms <= {}ms)",
            site.latency_class_ms, required_ms
        ));
    } else {
        justification.push(format!(
            "latency budget exceeded ({}ms > {}ms)",
            site.latency_class_ms, required_ms
        ));
    }

    // Capacity headroom over CPU and memory, averaged.
    let used = allocated.get(&site.id).copied().unwrap_or_default();
    let cpu_headroom = 1.0 - used.cpu_cores / site.capacity.cpu_cores;
    let mem_headroom = 1.0 - used.memory_gb / site.capacity.memory_gb;
    let headroom = (cpu_headroom + mem_headroom) / 2.0;
    let headroom_term = 100.0 * headroom.clamp(0.0, 1.0) * HEADROOM_WEIGHT;
    justification.push(format!("capacity headroom {:.0}%", headroom * 100.0));

    // Cloud-type preference.
    let cloud_term = match function.placement.cloud_type {
        Some(ct) if site.cloud_type == ct.to_string() => {
            justification.push(format!("cloud type {ct} matches request"));
            CLOUD_TYPE_BONUS
        }
        _ => 0.0,
    };

    // Geographic affinity toward the paired function's site. Explicit
    // preferred rules win over the built-in pairing.
    let paired = function
        .placement
        .affinity
        .as_ref()
        .and_then(|rules| {
            rules
                .iter()
                .find(|r| !r.required && r.mode == AffinityMode::Affinity)
                .map(|r| r.target)
        })
        .or_else(|| default_pairing(function.r#type));

    let geo_term = paired
        .and_then(|target| {
            placed
                .iter()
                .find(|(placed_type, _)| *placed_type == target)
                .and_then(|(_, placed_site_id)| sites_by_id.get(placed_site_id.as_str()))
                .map(|paired_site| {
                    let km = geo::great_circle_km(site.coordinates, paired_site.coordinates);
                    if paired_site.id == site.id {
                        justification.push(format!("co-located with {target} at {}", site.id));
                    } else {
                        justification.push(format!("{km:.0}km from paired {target}"));
                    }
                    geo::affinity_score(km)
                })
        })
        .unwrap_or(0.0);

    let score = (latency_term + headroom_term + cloud_term + geo_term).clamp(0.0, 100.0);
    (score, justification)
}

/// Compute one placement decision per network function.
///
/// Decisions come back in the intent's function order. The planner never
/// partially commits: the first function with no qualifying site aborts the
/// whole plan with [`IntentError::Unplaceable`].
///
/// # Errors
///
/// Returns [`IntentError::Unplaceable`] naming the offending function when no
/// site satisfies its hard constraints, or [`IntentError::Validation`] when
/// the QoS profile cannot be parsed (the engine validates before planning, so
/// this indicates a spec edit race).
pub fn plan(
    spec: &NetworkSliceIntentSpec,
    sites: &[Site],
) -> Result<Vec<PlacementDecision>, IntentError> {
    let slice_type = spec.qos_profile.slice_type.unwrap_or(SliceType::Balanced);
    // Parsing is re-checked so the planner stays a total function of its inputs.
    qos::parse_latency_ms(&spec.qos_profile.latency)?;

    let sites_by_id: BTreeMap<&str, &Site> = sites.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut allocated: BTreeMap<String, Allocated> = BTreeMap::new();
    let mut placed: Vec<(NetworkFunctionType, String)> = Vec::new();
    let mut decisions = Vec::with_capacity(spec.network_functions.len());

    for function in &spec.network_functions {
        let mut disqualified: Vec<(&Site, Disqualification)> = Vec::new();
        let mut candidates: Vec<(&Site, f64, Vec<String>)> = Vec::new();

        for site in sites {
            match disqualify(
                site,
                function,
                spec.target_clusters.as_ref(),
                &allocated,
                &placed,
            ) {
                Some(reason) => disqualified.push((site, reason)),
                None => {
                    let (score, justification) = score_site(
                        site,
                        function,
                        slice_type,
                        &allocated,
                        &placed,
                        &sites_by_id,
                    );
                    candidates.push((site, score, justification));
                }
            }
        }

        // Highest score wins; lexicographic site id breaks ties.
        candidates.sort_by(|(a_site, a_score, _), (b_site, b_score, _)| {
            b_score
                .total_cmp(a_score)
                .then_with(|| a_site.id.cmp(&b_site.id))
        });

        let Some((site, score, justification)) = candidates.into_iter().next() else {
            let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
            for (_, reason) in &disqualified {
                *counts.entry(reason.describe()).or_default() += 1;
            }
            let summary = counts
                .iter()
                .map(|(reason, count)| format!("{count} {reason}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(IntentError::Unplaceable {
                function: function.r#type.to_string(),
                reason: format!(
                    "no site satisfies hard constraints ({} candidates: {summary})",
                    disqualified.len()
                ),
            });
        };

        debug!(
            function = %function.r#type,
            site = %site.id,
            score = score,
            "Placed function"
        );

        let entry = allocated.entry(site.id.clone()).or_default();
        entry.cpu_cores += function.resources.cpu_cores;
        entry.memory_gb += function.resources.memory_gb;
        entry.storage_gb += function.resources.storage_gb;
        placed.push((function.r#type, site.id.clone()));

        decisions.push(PlacementDecision {
            function: function.r#type,
            site: site.id.clone(),
            // Hosting cluster presence is a hard constraint, checked above.
            cluster: site.cluster().unwrap_or_default().to_string(),
            score,
            constraints_met: true,
            justification,
        });
    }

    Ok(decisions)
}
