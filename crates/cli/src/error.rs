//! Error types for CLI operations.

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Command-line overrides produced an invalid configuration
    #[error("Invalid command-line override: {0}")]
    InvalidOverride(#[source] ContractError),

    /// Metrics exporter could not be started
    #[error("Failed to start metrics endpoint on port {port}: {message}")]
    MetricsEndpoint { port: u16, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn metrics_endpoint(port: u16, message: impl Into<String>) -> Self {
        Self::MetricsEndpoint {
            port,
            message: message.into(),
        }
    }
}
