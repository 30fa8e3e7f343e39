//! ClusterBlueprint - Config Loader 输出
//!
//! 描述完整的集群配置：分发参数、副本列表及其模拟行为。

use serde::{Deserialize, Serialize};

use crate::DispatchConfig;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的集群配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 分发参数 (重试次数、重试间隔、总超时)
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// 副本定义列表 (顺序即分发顺序)
    #[serde(default)]
    pub replicas: Vec<ReplicaConfig>,
}

impl ClusterBlueprint {
    /// 查找副本配置
    pub fn replica(&self, name: &str) -> Option<&ReplicaConfig> {
        self.replicas.iter().find(|r| r.name == name)
    }
}

/// 副本配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// 唯一标识符
    pub name: String,

    /// 模拟行为
    #[serde(default)]
    pub behavior: ReplicaBehavior,

    /// 每次请求的模拟延迟 (毫秒)
    #[serde(default)]
    pub latency_ms: u64,

    /// flaky 副本在成功前返回的临时错误次数
    #[serde(default = "default_failures")]
    pub failures: u32,

    /// 成功时返回的内容 (默认 "result from <name>")
    #[serde(default)]
    pub payload: Option<String>,
}

fn default_failures() -> u32 {
    2
}

impl ReplicaConfig {
    /// 创建指定行为的副本配置
    pub fn new(name: impl Into<String>, behavior: ReplicaBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            latency_ms: 0,
            failures: default_failures(),
            payload: None,
        }
    }

    /// 设置模拟延迟
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// 设置 flaky 失败次数
    pub fn with_failures(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    /// 成功时返回的内容
    pub fn payload_or_default(&self) -> String {
        self.payload
            .clone()
            .unwrap_or_else(|| format!("result from {}", self.name))
    }
}

/// 副本模拟行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaBehavior {
    /// 立即 (或延迟后) 成功
    #[default]
    Ok,
    /// 返回 not found (终止性错误)
    NotFound,
    /// 前 `failures` 次返回临时错误，之后成功
    Flaky,
    /// 始终返回临时错误
    Failing,
    /// 永不返回，直到被取消
    Hang,
}

impl ReplicaBehavior {
    /// 行为名称 (与配置文件中的写法一致)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not_found",
            Self::Flaky => "flaky",
            Self::Failing => "failing",
            Self::Hang => "hang",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_serde_snake_case() {
        let json = serde_json::to_string(&ReplicaBehavior::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        assert_eq!(ReplicaBehavior::NotFound.as_str(), "not_found");
    }

    #[test]
    fn test_replica_defaults() {
        let cfg: ReplicaConfig = serde_json::from_str(r#"{"name": "r1"}"#).unwrap();
        assert_eq!(cfg.behavior, ReplicaBehavior::Ok);
        assert_eq!(cfg.latency_ms, 0);
        assert_eq!(cfg.failures, 2);
        assert_eq!(cfg.payload_or_default(), "result from r1");
    }

    #[test]
    fn test_blueprint_lookup() {
        let bp = ClusterBlueprint {
            version: ConfigVersion::V1,
            dispatch: DispatchConfig::default(),
            replicas: vec![
                ReplicaConfig::new("a", ReplicaBehavior::Ok),
                ReplicaConfig::new("b", ReplicaBehavior::Flaky).with_failures(1),
            ],
        };
        assert_eq!(bp.replica("b").map(|r| r.failures), Some(1));
        assert!(bp.replica("c").is_none());
    }
}
