//! Dispatcher 指标收集模块
//!
//! 记录分发结果、单次尝试结果与工作任务退出状态，并在内存中聚合统计。

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// 记录一次分发调用的最终结果
///
/// `result` 取值：`success` / `all_failed` / `timed_out`。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch;
///
/// record_dispatch("success", 12.5, 3);
/// ```
pub fn record_dispatch(result: &str, latency_ms: f64, replica_count: usize) {
    counter!(
        "replica_query_dispatch_total",
        "result" => result.to_string()
    )
    .increment(1);

    histogram!(
        "replica_query_dispatch_latency_ms",
        "result" => result.to_string()
    )
    .record(latency_ms);

    gauge!("replica_query_dispatch_replicas").set(replica_count as f64);
}

/// 记录单次尝试结果
///
/// `status` 取值：`success` / `not_found` / `transient` / `cancelled`。
pub fn record_attempt(replica: &str, status: &str) {
    counter!(
        "replica_query_attempts_total",
        "replica" => replica.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录重试 (进入退避等待)
pub fn record_retry(replica: &str) {
    counter!(
        "replica_query_retries_total",
        "replica" => replica.to_string()
    )
    .increment(1);
}

/// 记录工作任务退出状态
///
/// `exit` 取值：`reported` / `exhausted` / `cancelled` / `panicked`。
pub fn record_worker_exit(exit: &str) {
    counter!(
        "replica_query_worker_exits_total",
        "exit" => exit.to_string()
    )
    .increment(1);
}

/// 记录被丢弃的结果 (收集器已返回)
pub fn record_discarded_outcome(replica: &str) {
    counter!(
        "replica_query_outcomes_discarded_total",
        "replica" => replica.to_string()
    )
    .increment(1);
}

/// 分发统计聚合器
///
/// 在内存中聚合多次分发的结果，便于 CLI 输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 总分发次数
    pub total_dispatches: u64,

    /// 成功次数
    pub successes: u64,

    /// 全部失败次数
    pub all_failed: u64,

    /// 超时次数
    pub timed_out: u64,

    /// 延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各副本获胜次数
    pub wins: HashMap<String, u64>,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功
    pub fn record_success(&mut self, replica: &str, latency_ms: f64) {
        self.total_dispatches += 1;
        self.successes += 1;
        *self.wins.entry(replica.to_string()).or_insert(0) += 1;
        self.latency_stats.push(latency_ms);
    }

    /// 记录一次全部失败
    pub fn record_all_failed(&mut self, latency_ms: f64) {
        self.total_dispatches += 1;
        self.all_failed += 1;
        self.latency_stats.push(latency_ms);
    }

    /// 记录一次超时
    pub fn record_timed_out(&mut self, latency_ms: f64) {
        self.total_dispatches += 1;
        self.timed_out += 1;
        self.latency_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_dispatches: self.total_dispatches,
            successes: self.successes,
            all_failed: self.all_failed,
            timed_out: self.timed_out,
            success_rate: if self.total_dispatches > 0 {
                self.successes as f64 / self.total_dispatches as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            wins: self.wins.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_dispatches: u64,
    pub successes: u64,
    pub all_failed: u64,
    pub timed_out: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
    pub wins: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total dispatches: {}", self.total_dispatches)?;
        writeln!(
            f,
            "Successes: {} ({:.2}%)",
            self.successes, self.success_rate
        )?;
        writeln!(f, "All failed: {}", self.all_failed)?;
        writeln!(f, "Timed out: {}", self.timed_out)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.wins.is_empty() {
            let mut wins: Vec<_> = self.wins.iter().collect();
            wins.sort();
            writeln!(f, "Wins per replica:")?;
            for (replica, count) in wins {
                writeln!(f, "  {}: {}", replica, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
