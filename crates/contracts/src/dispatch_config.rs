//! Dispatch tuning contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attempts per replica
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between attempts against the same replica
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;

/// Default deadline for a whole dispatch call
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum attempts per replica (>= 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Global deadline for one dispatch call in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl DispatchConfig {
    /// Delay between attempts
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Deadline for the whole dispatch call
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_interval(), Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let config: DispatchConfig = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.retry_interval_ms, DEFAULT_RETRY_INTERVAL_MS);
    }
}
