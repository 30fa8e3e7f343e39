//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::ClusterBlueprint;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dispatch: DispatchInfo,
    replica_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    replicas: Vec<ReplicaInfo>,
}

#[derive(Serialize)]
struct DispatchInfo {
    max_attempts: u32,
    retry_interval_ms: u64,
    timeout_ms: u64,
}

#[derive(Serialize)]
struct ReplicaInfo {
    name: String,
    behavior: &'static str,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    failures: Option<u32>,
    payload: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &ClusterBlueprint, args: &InfoArgs) -> ConfigInfo {
    let replicas = if args.replicas {
        blueprint
            .replicas
            .iter()
            .map(|r| ReplicaInfo {
                name: r.name.clone(),
                behavior: r.behavior.as_str(),
                latency_ms: r.latency_ms,
                failures: (r.behavior == contracts::ReplicaBehavior::Flaky).then_some(r.failures),
                payload: r.payload_or_default(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dispatch: DispatchInfo {
            max_attempts: blueprint.dispatch.max_attempts,
            retry_interval_ms: blueprint.dispatch.retry_interval_ms,
            timeout_ms: blueprint.dispatch.timeout_ms,
        },
        replica_count: blueprint.replicas.len(),
        replicas,
    }
}

fn print_config_info(blueprint: &ClusterBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Replica Query Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let dispatch = &blueprint.dispatch;
    println!("⚙️  Dispatch");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Max attempts: {}", dispatch.max_attempts);
    println!("   ├─ Retry interval: {}ms", dispatch.retry_interval_ms);
    println!("   └─ Timeout: {}ms", dispatch.timeout_ms);

    println!("\n🗄  Replicas ({})", blueprint.replicas.len());
    for (i, replica) in blueprint.replicas.iter().enumerate() {
        let is_last = i == blueprint.replicas.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, replica.name, replica.behavior.as_str());

        if args.replicas {
            println!("   {}  ├─ Latency: {}ms", child_prefix, replica.latency_ms);
            if replica.behavior == contracts::ReplicaBehavior::Flaky {
                println!("   {}  ├─ Failures: {}", child_prefix, replica.failures);
            }
            println!(
                "   {}  └─ Payload: {}",
                child_prefix,
                replica.payload_or_default()
            );
        }
    }

    println!();
}
