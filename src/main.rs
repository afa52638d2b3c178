// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{routing::get, Router};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder};
use nephio_adapter::{
    constants::{
        DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_RENEW_DEADLINE_SECS,
        DEFAULT_LEASE_RETRY_PERIOD_SECS, DEFAULT_MANAGEMENT_REPOSITORY, DEFAULT_WORKER_THREADS,
        ERROR_REQUEUE_DURATION_SECS, KIND_NETWORK_SLICE_INTENT, METRICS_SERVER_BIND_ADDRESS,
        METRICS_SERVER_PATH, METRICS_SERVER_PORT,
    },
    context::Context,
    crd::NetworkSliceIntent,
    deployment::HttpDeploymentClient,
    inventory::HttpInventoryClient,
    metrics,
    porch::HttpPorchClient,
    reconcilers::reconcile_intent,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    let workers = std::env::var("NEPHIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_WORKER_THREADS);

    // Build Tokio runtime with custom thread names; the worker count is the
    // reconciler pool size.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("nephio-adapter")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting network slice intent operator");
}

/// External service endpoints, from environment variables.
struct ServiceEndpoints {
    inventory_url: String,
    porch_url: String,
    deployment_url: String,
    management_repository: String,
}

fn load_service_endpoints() -> ServiceEndpoints {
    let inventory_url = std::env::var("NEPHIO_INVENTORY_URL")
        .unwrap_or_else(|_| "http://inventory.mano-system.svc:8080".to_string());
    let porch_url = std::env::var("NEPHIO_PORCH_URL")
        .unwrap_or_else(|_| "http://porch.mano-system.svc:8080".to_string());
    let deployment_url = std::env::var("NEPHIO_DEPLOYMENT_URL")
        .unwrap_or_else(|_| "http://deployment.mano-system.svc:8080".to_string());
    let management_repository = std::env::var("NEPHIO_MANAGEMENT_REPOSITORY")
        .unwrap_or_else(|_| DEFAULT_MANAGEMENT_REPOSITORY.to_string());

    ServiceEndpoints {
        inventory_url,
        porch_url,
        deployment_url,
        management_repository,
    }
}

/// Initialize the Kubernetes client and the shared controller context.
async fn initialize_context() -> Result<Arc<Context>> {
    debug!("Initializing Kubernetes client");
    let config = kube::Config::infer().await?;
    let client = Client::try_from(config)?;

    let endpoints = load_service_endpoints();
    info!(
        inventory = %endpoints.inventory_url,
        porch = %endpoints.porch_url,
        deployment = %endpoints.deployment_url,
        management_repository = %endpoints.management_repository,
        "External services configured"
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    let context = Arc::new(Context::new(
        client,
        Arc::new(HttpInventoryClient::new(
            http_client.clone(),
            &endpoints.inventory_url,
        )),
        Arc::new(HttpPorchClient::new(http_client.clone(), &endpoints.porch_url)),
        Arc::new(HttpDeploymentClient::new(
            http_client,
            &endpoints.deployment_url,
        )),
        endpoints.management_repository,
    ));

    Ok(context)
}

/// Start the Prometheus metrics HTTP server
///
/// Serves metrics on the configured port and path (default: 0.0.0.0:8080/metrics)
///
/// # Returns
/// A `JoinHandle` that can be used to monitor the server task
fn start_metrics_server() -> tokio::task::JoinHandle<()> {
    info!(
        bind_address = METRICS_SERVER_BIND_ADDRESS,
        port = METRICS_SERVER_PORT,
        path = METRICS_SERVER_PATH,
        "Starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        async fn healthz_handler() -> &'static str {
            "ok"
        }

        let app = Router::new()
            .route(METRICS_SERVER_PATH, get(metrics_handler))
            .route("/healthz", get(healthz_handler));

        let bind_addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Leader election configuration
struct LeaderElectionConfig {
    enabled: bool,
    lease_name: String,
    lease_namespace: String,
    identity: String,
    lease_duration: u64,
    renew_deadline: u64,
    retry_period: u64,
}

/// Load leader election configuration from environment variables
fn load_leader_election_config() -> LeaderElectionConfig {
    let enabled = std::env::var("NEPHIO_ENABLE_LEADER_ELECTION")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true);

    let lease_name =
        std::env::var("NEPHIO_LEASE_NAME").unwrap_or_else(|_| "nephio-adapter-leader".to_string());

    let lease_namespace = std::env::var("NEPHIO_LEASE_NAMESPACE")
        .or_else(|_| std::env::var("POD_NAMESPACE"))
        .unwrap_or_else(|_| "mano-system".to_string());

    let lease_duration = std::env::var("NEPHIO_LEASE_DURATION_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_DURATION_SECS);

    let renew_deadline = std::env::var("NEPHIO_LEASE_RENEW_DEADLINE_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RENEW_DEADLINE_SECS);

    let retry_period = std::env::var("NEPHIO_LEASE_RETRY_PERIOD_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RETRY_PERIOD_SECS);

    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("nephio-adapter-{}", rand::random::<u32>()));

    LeaderElectionConfig {
        enabled,
        lease_name,
        lease_namespace,
        identity,
        lease_duration,
        renew_deadline,
        retry_period,
    }
}

/// Reconcile wrapper for `NetworkSliceIntent`
async fn reconcile_intent_wrapper(
    intent: Arc<NetworkSliceIntent>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = std::time::Instant::now();

    debug!(
        intent = %intent.name_any(),
        namespace = ?intent.namespace(),
        "Reconcile wrapper called for NetworkSliceIntent"
    );

    let result = Box::pin(reconcile_intent(ctx.clone(), (*intent).clone())).await;
    let duration = start.elapsed();

    match result {
        Ok(action) => {
            metrics::record_reconciliation_success(KIND_NETWORK_SLICE_INTENT, duration);
            Ok(action)
        }
        Err(e) => {
            error!("Failed to reconcile NetworkSliceIntent: {}", e);
            metrics::record_reconciliation_error(KIND_NETWORK_SLICE_INTENT, duration);
            metrics::record_error(KIND_NETWORK_SLICE_INTENT, "reconcile_error");
            Err(e.into())
        }
    }
}

/// Error policy: transient reconcile errors requeue on a fixed cadence.
#[allow(clippy::needless_pass_by_value)]
fn error_policy(
    intent: Arc<NetworkSliceIntent>,
    error: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    warn!(
        intent = %intent.name_any(),
        error = %error,
        "Reconcile failed, requeueing"
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Run the intent operator until the process is told to stop.
async fn run_intent_operator(context: Arc<Context>) -> Result<()> {
    info!("Starting NetworkSliceIntent operator");

    let api = Api::<NetworkSliceIntent>::all(context.client.clone());

    Controller::new(api, Config::default())
        .run(reconcile_intent_wrapper, error_policy, context)
        .for_each(|result| async move {
            if let Err(e) = result {
                debug!("Controller event error: {e:?}");
            }
        })
        .await;

    Ok(())
}

/// Monitor leadership status - returns when leadership is lost or an error occurs
async fn monitor_leadership(
    mut leader_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), anyhow::Error> {
    loop {
        leader_rx.changed().await?;
        if !*leader_rx.borrow() {
            return Ok(());
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            result
        }
    }
}

/// Run the operator with leader election monitoring and signal handling.
async fn run_with_leader_election(
    context: Arc<Context>,
    leader_rx: tokio::sync::watch::Receiver<bool>,
    _lease_handle: tokio::task::JoinHandle<
        Result<LeaseManager, kube_lease_manager::LeaseManagerError>,
    >,
) -> Result<()> {
    let shutdown_result: Result<()> = tokio::select! {
        result = wait_for_shutdown_signal() => {
            info!("Stopping operator and releasing leader election lease...");
            result
        }
        result = monitor_leadership(leader_rx) => {
            match result {
                Ok(()) => {
                    warn!("Leadership lost! Stopping operator...");
                    anyhow::bail!("Leadership lost - stepping down")
                }
                Err(e) => {
                    error!("Leadership monitor error: {:?}", e);
                    anyhow::bail!("Leadership monitoring failed: {e}")
                }
            }
        }
        result = run_intent_operator(context) => {
            error!("CRITICAL: intent operator exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("intent operator exited unexpectedly without error")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully, leader election lease released");
    Ok(())
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let context = initialize_context().await?;

    let _metrics_handle = start_metrics_server();

    let leader_election_config = load_leader_election_config();

    if leader_election_config.enabled {
        info!(
            lease_name = %leader_election_config.lease_name,
            lease_namespace = %leader_election_config.lease_namespace,
            identity = %leader_election_config.identity,
            lease_duration_secs = leader_election_config.lease_duration,
            renew_deadline_secs = leader_election_config.renew_deadline,
            "Leader election enabled"
        );

        info!("Starting leader election, waiting to acquire leadership...");
        let lease_manager = LeaseManagerBuilder::new(
            context.client.clone(),
            &leader_election_config.lease_name,
        )
        .with_namespace(&leader_election_config.lease_namespace)
        .with_identity(&leader_election_config.identity)
        .with_duration(leader_election_config.lease_duration)
        .with_grace(leader_election_config.retry_period)
        .build()
        .await?;

        let (leader_rx, lease_handle) = lease_manager.watch().await;

        // Wait until we become leader
        let mut rx = leader_rx.clone();
        while !*rx.borrow_and_update() {
            rx.changed().await?;
        }

        info!("Leadership acquired, starting controller...");
        run_with_leader_election(context, leader_rx, lease_handle).await?;
    } else {
        warn!("Leader election DISABLED - running without high availability");

        let shutdown_result: Result<()> = tokio::select! {
            result = wait_for_shutdown_signal() => {
                info!("Stopping operator...");
                result
            }
            result = run_intent_operator(context) => {
                error!("CRITICAL: intent operator exited unexpectedly: {:?}", result);
                result?;
                anyhow::bail!("intent operator exited unexpectedly without error")
            }
        };
        shutdown_result?;
        info!("Graceful shutdown completed successfully");
    }

    Ok(())
}
