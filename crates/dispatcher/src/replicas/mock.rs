//! MockReplica - configurable in-process replica for demos and tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use contracts::{Query, ReplicaBehavior, ReplicaClient, ReplicaConfig, ReplicaError};

/// Replica that simulates a database host
///
/// Latency is applied before every answer and is interrupted by the
/// cancellation scope. The call counter persists across dispatches, so a
/// `Flaky` replica that already recovered keeps succeeding.
#[derive(Debug)]
pub struct MockReplica {
    name: String,
    behavior: ReplicaBehavior,
    latency: Duration,
    failures: u32,
    payload: String,
    calls: AtomicU32,
}

impl MockReplica {
    /// Create a replica with the given behavior and no latency
    pub fn new(name: impl Into<String>, behavior: ReplicaBehavior) -> Self {
        let name = name.into();
        let payload = format!("result from {}", name);
        Self {
            name,
            behavior,
            latency: Duration::ZERO,
            failures: 2,
            payload,
            calls: AtomicU32::new(0),
        }
    }

    /// Always answers with its payload
    pub fn ok(name: impl Into<String>) -> Self {
        Self::new(name, ReplicaBehavior::Ok)
    }

    /// Always answers not found
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(name, ReplicaBehavior::NotFound)
    }

    /// Fails transiently `failures` times, then answers
    pub fn flaky(name: impl Into<String>, failures: u32) -> Self {
        Self::new(name, ReplicaBehavior::Flaky).with_failures(failures)
    }

    /// Always fails transiently
    pub fn failing(name: impl Into<String>) -> Self {
        Self::new(name, ReplicaBehavior::Failing)
    }

    /// Never answers until cancelled
    pub fn hanging(name: impl Into<String>) -> Self {
        Self::new(name, ReplicaBehavior::Hang)
    }

    /// Build from configuration
    pub fn from_config(config: &ReplicaConfig) -> Self {
        Self::new(&config.name, config.behavior)
            .with_latency(Duration::from_millis(config.latency_ms))
            .with_failures(config.failures)
            .with_payload(config.payload_or_default())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failures(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn behavior(&self) -> ReplicaBehavior {
        self.behavior
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Number of calls that started work (not rejected as already cancelled)
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, call: u32) -> Result<String, ReplicaError> {
        match self.behavior {
            ReplicaBehavior::Ok => Ok(self.payload.clone()),
            ReplicaBehavior::NotFound => Err(ReplicaError::NotFound),
            ReplicaBehavior::Flaky if call <= self.failures => {
                Err(ReplicaError::transient("temporary connection error"))
            }
            ReplicaBehavior::Flaky => Ok(self.payload.clone()),
            ReplicaBehavior::Failing => Err(ReplicaError::transient("temporary connection error")),
            // handled before answering
            ReplicaBehavior::Hang => Err(ReplicaError::Cancelled),
        }
    }
}

impl ReplicaClient for MockReplica {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "mock_replica_execute",
        skip(self, query, cancel),
        fields(replica = %self.name, behavior = self.behavior.as_str())
    )]
    async fn execute(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<String, ReplicaError> {
        if cancel.is_cancelled() {
            return Err(ReplicaError::Cancelled);
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(replica = %self.name, call, query = %query, "Executing query");

        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ReplicaError::Cancelled),
                _ = sleep(self.latency) => {}
            }
        }

        if self.behavior == ReplicaBehavior::Hang {
            cancel.cancelled().await;
            return Err(ReplicaError::Cancelled);
        }

        self.answer(call)
    }
}
