//! Layered error definitions
//!
//! Categorized by source: config / replica

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a single replica attempt
///
/// `NotFound` is the only terminal error; everything else is retried by the
/// dispatcher up to its attempt bound.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Definitive negative answer from the replica
    #[error("not found")]
    NotFound,

    /// The cancellation scope fired before the replica answered
    #[error("query cancelled")]
    Cancelled,

    /// Retryable failure (connection reset, overload, ...)
    #[error("transient failure: {message}")]
    Transient { message: String },

    /// IO error from a network-backed replica
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReplicaError {
    /// Create transient failure
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the dispatcher should try this replica again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound | Self::Cancelled)
    }
}
