// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # nephio-adapter - Intent-driven 5G Network Slice Operator
//!
//! nephio-adapter is a Kubernetes operator written in Rust that turns
//! declarative network slice intents into deployed 5G network-function
//! workloads across a fleet of geographically distributed clusters.
//!
//! ## Overview
//!
//! An operator submits a [`crd::NetworkSliceIntent`] naming a slice type
//! (eMBB, uRLLC, mIoT), QoS targets and a list of network functions (gNB,
//! AMF, SMF, UPF, ...). The controller then:
//!
//! - plans where each function should run ([`placement`])
//! - materializes a deployment package per function ([`package`])
//! - publishes the packages to per-cluster repositories through the
//!   package-revision service ([`porch`])
//! - watches the deployment-management service until every function reports
//!   ready ([`deployment`])
//!
//! driving each intent from *Pending* to *Ready* under a strict end-to-end
//! deadline, with a finalizer-guarded teardown path.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types for slice intents
//! - [`reconcilers`] - The intent state machine and its support code
//! - [`placement`] - Deterministic multi-site placement planning
//! - [`package`] - KRM package materialization with Kptfile pipelines
//! - [`porch`] - Package-revision service client and publisher
//! - [`inventory`] - Site inventory client
//! - [`deployment`] - Deployment-management client and status aggregation
//!
//! ## Example
//!
//! ```rust,no_run
//! use nephio_adapter::crd::{QosProfile, SliceType};
//!
//! let qos = QosProfile {
//!     bandwidth: "4.5Mbps".to_string(),
//!     latency: "10ms".to_string(),
//!     reliability: Some("0.999".to_string()),
//!     slice_type: Some(SliceType::Embb),
//! };
//! ```
//!
//! ## Features
//!
//! - **Deterministic planning** - Same intent and inventory snapshot, same
//!   placement decisions
//! - **Deterministic rendering** - Re-materializing an intent is
//!   byte-identical modulo the render timestamp
//! - **Status tracking** - Full status subresource with phase, conditions
//!   and per-function readiness

pub mod constants;
pub mod context;
pub mod crd;
pub mod deployment;
pub mod errors;
pub mod inventory;
pub mod labels;
pub mod metrics;
pub mod package;
pub mod placement;
pub mod porch;
pub mod qos;
pub mod reconcilers;
pub mod status_reasons;
