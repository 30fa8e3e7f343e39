//! `run` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use config_loader::ConfigLoader;
use contracts::ClusterBlueprint;
use dispatcher::{mock_replicas, DispatchError, DispatchResult, QueryDispatcher};
use observability::DispatchStatsAggregator;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::error::CliError;

/// One dispatch result for JSON output
#[derive(Serialize)]
struct DispatchReport {
    round: u32,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    replica: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    elapsed_ms: f64,
}

impl DispatchReport {
    fn new(round: u32, result: &DispatchResult, elapsed: Duration) -> Self {
        let outcome = dispatcher::DispatchKind::of(result).as_str();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match result {
            Ok(response) => Self {
                round,
                outcome,
                replica: Some(response.replica.clone()),
                attempt: Some(response.attempt),
                payload: Some(response.payload.clone()),
                error: None,
                elapsed_ms,
            },
            Err(e) => Self {
                round,
                outcome,
                replica: None,
                attempt: None,
                payload: None,
                error: Some(e.to_string()),
                elapsed_ms,
            },
        }
    }
}

/// Execute the `run` command
pub async fn run_query(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)?;
    apply_overrides(&mut blueprint, args)?;

    info!(
        replicas = blueprint.replicas.len(),
        max_attempts = blueprint.dispatch.max_attempts,
        retry_interval_ms = blueprint.dispatch.retry_interval_ms,
        timeout_ms = blueprint.dispatch.timeout_ms,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_exporter(args.metrics_port)
            .map_err(|e| CliError::metrics_endpoint(args.metrics_port, e.to_string()))?;
    }

    let shutdown_signal = setup_shutdown_signal();
    tokio::pin!(shutdown_signal);

    tokio::select! {
        stats = run_rounds(&blueprint, args) => {
            let stats = stats?;
            if !args.json {
                println!("\n{}", stats.summary());
            }
        }
        _ = &mut shutdown_signal => {
            warn!("Received shutdown signal, stopping dispatches...");
        }
    }

    info!("Replica Query finished");
    Ok(())
}

/// Apply command-line overrides on top of the configured retry policy, then
/// re-run the configuration rules on the result
fn apply_overrides(blueprint: &mut ClusterBlueprint, args: &RunArgs) -> Result<()> {
    let dispatch = &mut blueprint.dispatch;
    if let Some(max_attempts) = args.max_attempts {
        info!(max_attempts, "Overriding max attempts from CLI");
        dispatch.max_attempts = max_attempts;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        info!(timeout_ms, "Overriding timeout from CLI");
        dispatch.timeout_ms = timeout_ms;
    }
    if let Some(retry_interval_ms) = args.retry_interval_ms {
        info!(retry_interval_ms, "Overriding retry interval from CLI");
        dispatch.retry_interval_ms = retry_interval_ms;
    }

    ConfigLoader::validate(blueprint).map_err(CliError::InvalidOverride)?;
    Ok(())
}

async fn run_rounds(blueprint: &ClusterBlueprint, args: &RunArgs) -> Result<DispatchStatsAggregator> {
    let replicas = mock_replicas(blueprint);
    let dispatcher = QueryDispatcher::from_config(&blueprint.dispatch);
    let mut stats = DispatchStatsAggregator::new();

    for round in 1..=args.repeat {
        let started = tokio::time::Instant::now();
        let result = dispatcher.dispatch(args.query.as_str(), &replicas).await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match &result {
            Ok(response) => stats.record_success(&response.replica, elapsed_ms),
            Err(DispatchError::AllFailed { .. }) => stats.record_all_failed(elapsed_ms),
            Err(DispatchError::TimedOut { .. }) => stats.record_timed_out(elapsed_ms),
        }

        if args.json {
            let report = DispatchReport::new(round, &result, elapsed);
            let json =
                serde_json::to_string(&report).context("Failed to serialize dispatch result")?;
            println!("{}", json);
        } else {
            print_result(round, &result, elapsed);
        }
    }

    let snapshot = dispatcher.metrics();
    info!(
        dispatches = snapshot.dispatches,
        attempts = snapshot.attempts,
        retries = snapshot.retries,
        discarded_outcomes = snapshot.discarded_outcomes,
        "Dispatcher counters"
    );

    Ok(stats)
}

fn print_result(round: u32, result: &DispatchResult, elapsed: Duration) {
    match result {
        Ok(response) => println!(
            "[{}] Success: {} (replica {}, attempt {}, {:.1} ms)",
            round,
            response.payload,
            response.replica,
            response.attempt,
            elapsed.as_secs_f64() * 1000.0
        ),
        Err(e) => println!(
            "[{}] Failed: {} ({:.1} ms)",
            round,
            e,
            elapsed.as_secs_f64() * 1000.0
        ),
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
