//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Replica Query - race one query across replicated hosts
#[derive(Parser, Debug)]
#[command(
    name = "replica-query",
    author,
    version,
    about = "Dispatch a query to replicated hosts and return the first success",
    long_about = "Fans a single query out to every configured replica, retries transient\n\
                  failures a bounded number of times, and returns the first successful\n\
                  answer within a global deadline."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "REPLICA_QUERY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "REPLICA_QUERY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a query against the replicas of a configuration file
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Replay the built-in demonstration scenarios
    Demo(DemoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "REPLICA_QUERY_CONFIG"
    )]
    pub config: PathBuf,

    /// Query text sent to every replica
    #[arg(
        long,
        default_value = "SELECT * FROM users WHERE id=123",
        env = "REPLICA_QUERY_QUERY"
    )]
    pub query: String,

    /// Override the dispatch deadline in milliseconds
    #[arg(long, env = "REPLICA_QUERY_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Override the maximum attempts per replica
    #[arg(long, env = "REPLICA_QUERY_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Override the delay between attempts in milliseconds
    #[arg(long, env = "REPLICA_QUERY_RETRY_INTERVAL_MS")]
    pub retry_interval_ms: Option<u64>,

    /// Number of dispatches to perform
    #[arg(long, default_value = "1", env = "REPLICA_QUERY_REPEAT")]
    pub repeat: u32,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "REPLICA_QUERY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Print each dispatch result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed replica information
    #[arg(long)]
    pub replicas: bool,
}

/// Arguments for the `demo` command
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Run only one scenario (1-4); all scenarios run when omitted
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub scenario: Option<u8>,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "replica-query",
            "-v",
            "run",
            "--config",
            "cluster.toml",
            "--query",
            "SELECT 1",
            "--timeout-ms",
            "750",
            "--max-attempts",
            "5",
            "--repeat",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("cluster.toml"));
        assert_eq!(args.query, "SELECT 1");
        assert_eq!(args.timeout_ms, Some(750));
        assert_eq!(args.max_attempts, Some(5));
        assert_eq!(args.retry_interval_ms, None);
        assert_eq!(args.repeat, 3);
    }

    #[test]
    fn test_demo_scenario_range() {
        let cli = Cli::try_parse_from(["replica-query", "demo", "--scenario", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Demo(DemoArgs { scenario: Some(3) })
        ));

        assert!(Cli::try_parse_from(["replica-query", "demo", "--scenario", "5"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["replica-query", "-q", "-v", "demo"]).is_err());
    }
}
