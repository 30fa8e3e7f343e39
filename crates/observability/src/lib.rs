//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty 格式)
//! - Prometheus 指标导出
//! - 分发结果指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{LogLevel, ObservabilityConfig};
//!
//! // 初始化 (-v 对应 debug)
//! observability::init_with_config(ObservabilityConfig {
//!     log_level: LogLevel::from_verbosity(1, false),
//!     ..Default::default()
//! })?;
//!
//! // 记录分发结果
//! let started = Instant::now();
//! let result = dispatcher.dispatch(query, &replicas).await;
//! metrics::record_dispatch("success", started.elapsed().as_secs_f64() * 1000.0, replicas.len());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_attempt, record_discarded_outcome, record_dispatch, record_retry, record_worker_exit,
    DispatchStatsAggregator, MetricsSummary, RunningStats, StatsSummary,
};

/// 日志过滤环境变量，优先于 RUST_LOG
pub const LOG_ENV: &str = "REPLICA_QUERY_LOG";

/// 跟随日志级别的 crate，其余依赖固定为 warn
const LOG_TARGETS: &[&str] = &[
    "replica_query",
    "dispatcher",
    "config_loader",
    "contracts",
    "observability",
];

/// 分发延迟直方图桶 (毫秒)
const LATENCY_BUCKETS_MS: &[f64] = &[
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0,
];

/// 可观测性配置
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 本项目 crate 的日志级别
    pub log_level: LogLevel,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
}

impl ObservabilityConfig {
    /// 未设置环境变量时使用的过滤规则
    ///
    /// 例如 `warn,replica_query=debug,dispatcher=debug,...`
    pub fn filter_directives(&self) -> String {
        let level = self.log_level.as_str();
        let mut directives = String::from("warn");
        for target in LOG_TARGETS {
            directives.push_str(&format!(",{}={}", target, level));
        }
        directives
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(self.filter_directives()))
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `-q` 为 warn，`-v` 为 debug，`-vv` 及以上为 trace
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Warn;
        }
        match verbose {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// 初始化 Tracing，并在配置了端口时启动 Prometheus 导出
///
/// 全局 subscriber 只能安装一次，重复调用返回错误。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_exporter(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        log_level = config.log_level.as_str(),
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 启动 Prometheus HTTP 导出 (0.0.0.0:port)
///
/// 可在 Tracing 初始化之后单独调用。
pub fn init_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("replica_query_dispatch_latency_ms".to_string()),
            LATENCY_BUCKETS_MS,
        )
        .context("Invalid latency buckets")?
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
