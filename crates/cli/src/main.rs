//! # Replica Query CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 查询分发与结果统计
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::{LogLevel, ObservabilityConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_demo, run_info, run_query, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Replica Query CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_query(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Demo(args) => run_demo(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// Metrics export is started by the commands that dispatch queries.
fn init_logging(cli: &Cli) -> Result<()> {
    let log_format = match cli.log_format {
        cli::LogFormat::Json => observability::LogFormat::Json,
        cli::LogFormat::Pretty => observability::LogFormat::Pretty,
        cli::LogFormat::Compact => observability::LogFormat::Compact,
    };

    observability::init_with_config(ObservabilityConfig {
        log_format,
        log_level: LogLevel::from_verbosity(cli.verbose, cli.quiet),
        metrics_port: None,
    })
}
