//! 配置校验模块
//!
//! 校验规则：
//! - replica name 非空且唯一
//! - max_attempts >= 1
//! - timeout_ms > 0

use std::collections::HashSet;

use contracts::{ClusterBlueprint, ContractError};

/// 校验 ClusterBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ClusterBlueprint) -> Result<(), ContractError> {
    validate_dispatch(blueprint)?;
    validate_replica_names(blueprint)?;
    Ok(())
}

/// 校验分发参数
fn validate_dispatch(blueprint: &ClusterBlueprint) -> Result<(), ContractError> {
    let dispatch = &blueprint.dispatch;

    if dispatch.max_attempts == 0 {
        return Err(ContractError::config_validation(
            "dispatch.max_attempts",
            "max_attempts must be >= 1",
        ));
    }

    if dispatch.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatch.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }

    Ok(())
}

/// 校验 replica name 非空且唯一
fn validate_replica_names(blueprint: &ClusterBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, replica) in blueprint.replicas.iter().enumerate() {
        if replica.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("replicas[{}].name", idx),
                "replica name cannot be empty",
            ));
        }
        if !seen.insert(replica.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("replicas[name={}]", replica.name),
                "duplicate replica name",
            ));
        }
    }
    Ok(())
}
