//! Dispatcher error types

use std::time::Duration;

use thiserror::Error;

/// Failure of a whole dispatch call
///
/// Finer-grained replica errors (not found, transient, cancelled) are absorbed
/// by the workers and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Every replica exhausted its retries or answered not found
    #[error("all replicas failed after multiple retries")]
    AllFailed { replicas: usize },

    /// The global deadline elapsed before any replica succeeded
    #[error("query timed out after {timeout:?}")]
    TimedOut { timeout: Duration },
}

impl DispatchError {
    pub fn is_all_failed(&self) -> bool {
        matches!(self, Self::AllFailed { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
