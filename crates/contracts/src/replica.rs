//! ReplicaClient trait - Dispatcher input interface
//!
//! Defines the abstract interface for one backing host that can answer a query.

use tokio_util::sync::CancellationToken;

use crate::{Query, ReplicaError};

/// Replica client trait
///
/// Implementations are supplied by the caller (network clients, test doubles)
/// and are never constructed by the dispatcher.
#[trait_variant::make(ReplicaClient: Send)]
pub trait LocalReplicaClient {
    /// Replica name (used for logging/metrics and to credit the winner)
    fn name(&self) -> &str;

    /// Execute one query attempt
    ///
    /// Must observe `cancel`: return promptly without doing work when it is
    /// already cancelled, and abort with [`ReplicaError::Cancelled`] when it
    /// fires mid-flight.
    ///
    /// # Errors
    /// [`ReplicaError::NotFound`] is a terminal answer for this replica; every
    /// other error is treated as retryable.
    async fn execute(&self, query: &Query, cancel: &CancellationToken)
        -> Result<String, ReplicaError>;
}
