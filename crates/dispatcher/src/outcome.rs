//! Attempt outcomes and dispatch results

use std::fmt;
use std::time::Duration;

use contracts::ReplicaError;

use crate::error::DispatchError;

/// Result of a single attempt against one replica
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The replica answered
    Success {
        replica: String,
        replica_index: usize,
        attempt: u32,
        payload: String,
    },
    /// Definitive negative answer; the replica is not retried
    NotFound {
        replica: String,
        replica_index: usize,
        attempt: u32,
    },
    /// Retryable failure
    TransientFailure {
        replica: String,
        replica_index: usize,
        attempt: u32,
        cause: ReplicaError,
    },
    /// The cancellation scope fired during the attempt
    Cancelled {
        replica: String,
        replica_index: usize,
        attempt: u32,
    },
}

impl AttemptOutcome {
    /// Classify the raw result of one replica call
    pub fn from_result(
        replica: &str,
        replica_index: usize,
        attempt: u32,
        result: Result<String, ReplicaError>,
    ) -> Self {
        let replica = replica.to_string();
        match result {
            Ok(payload) => Self::Success {
                replica,
                replica_index,
                attempt,
                payload,
            },
            Err(cause) if cause.is_retryable() => Self::TransientFailure {
                replica,
                replica_index,
                attempt,
                cause,
            },
            Err(cause) if cause.is_not_found() => Self::NotFound {
                replica,
                replica_index,
                attempt,
            },
            Err(_) => Self::Cancelled {
                replica,
                replica_index,
                attempt,
            },
        }
    }

    /// Name of the replica that produced this outcome
    pub fn replica(&self) -> &str {
        match self {
            Self::Success { replica, .. }
            | Self::NotFound { replica, .. }
            | Self::TransientFailure { replica, .. }
            | Self::Cancelled { replica, .. } => replica,
        }
    }

    /// 1-based attempt number
    pub fn attempt(&self) -> u32 {
        match self {
            Self::Success { attempt, .. }
            | Self::NotFound { attempt, .. }
            | Self::TransientFailure { attempt, .. }
            | Self::Cancelled { attempt, .. } => *attempt,
        }
    }

    /// Success or not-found: no further attempts against this replica
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::NotFound { .. })
    }

    /// Metric label
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::NotFound { .. } => "not_found",
            Self::TransientFailure { .. } => "transient",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Winning answer of a dispatch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    /// Payload returned by the winning replica
    pub payload: String,
    /// Name of the winning replica
    pub replica: String,
    /// Position of the winning replica in the dispatched collection
    pub replica_index: usize,
    /// Attempt on which the replica succeeded
    pub attempt: u32,
    /// Time from dispatch start to acceptance
    pub elapsed: Duration,
}

/// Externally visible outcome of one dispatch call
pub type DispatchResult = Result<QueryResponse, DispatchError>;

/// Kind of a dispatch result, used for logging, metrics and comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Success,
    AllFailed,
    TimedOut,
}

impl DispatchKind {
    pub fn of(result: &DispatchResult) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(DispatchError::AllFailed { .. }) => Self::AllFailed,
            Err(DispatchError::TimedOut { .. }) => Self::TimedOut,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AllFailed => "all_failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
