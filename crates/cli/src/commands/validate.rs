//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{ClusterBlueprint, ReplicaBehavior};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    replica_count: usize,
    max_attempts: u32,
    retry_interval_ms: u64,
    timeout_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    replica_count: blueprint.replicas.len(),
                    max_attempts: blueprint.dispatch.max_attempts,
                    retry_interval_ms: blueprint.dispatch.retry_interval_ms,
                    timeout_ms: blueprint.dispatch.timeout_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ClusterBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let dispatch = &blueprint.dispatch;

    if blueprint.replicas.is_empty() {
        warnings.push("No replicas configured - every dispatch will fail immediately".to_string());
    }

    for replica in &blueprint.replicas {
        if replica.behavior == ReplicaBehavior::Flaky && replica.failures >= dispatch.max_attempts
        {
            warnings.push(format!(
                "Replica '{}' fails {} times but only {} attempts are allowed - it cannot succeed on the first dispatch",
                replica.name, replica.failures, dispatch.max_attempts
            ));
        }

        if replica.latency_ms >= dispatch.timeout_ms {
            warnings.push(format!(
                "Replica '{}' latency {}ms is not below the {}ms timeout",
                replica.name, replica.latency_ms, dispatch.timeout_ms
            ));
        }
    }

    // every failed attempt is followed by one backoff
    let backoff_ms = u64::from(dispatch.max_attempts).saturating_mul(dispatch.retry_interval_ms);
    if backoff_ms >= dispatch.timeout_ms {
        warnings.push(format!(
            "Retry backoff alone ({}ms) reaches the {}ms timeout - exhausted replicas surface as timed out",
            backoff_ms, dispatch.timeout_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Replicas: {}", summary.replica_count);
            println!("  Max attempts: {}", summary.max_attempts);
            println!("  Retry interval: {}ms", summary.retry_interval_ms);
            println!("  Timeout: {}ms", summary.timeout_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
