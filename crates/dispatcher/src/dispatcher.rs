//! Dispatcher - fan-out a query to replicas, race to the first success

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use contracts::{DispatchConfig, Query, ReplicaClient};

use crate::error::DispatchError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::outcome::{AttemptOutcome, DispatchKind, DispatchResult, QueryResponse};
use crate::session::{DispatchSession, SessionEvent};
use crate::worker::{replica_worker, WorkerContext, WorkerExit};

/// Builder for creating a QueryDispatcher
#[derive(Debug, Clone)]
pub struct DispatcherBuilder {
    max_attempts: u32,
    retry_interval: Duration,
    timeout: Duration,
}

impl DispatcherBuilder {
    /// Create a builder with the default retry policy (3 attempts, 500ms, 2s)
    pub fn new() -> Self {
        Self::from_config(&DispatchConfig::default())
    }

    /// Start from a loaded configuration
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_interval: config.retry_interval(),
            timeout: config.timeout(),
        }
    }

    /// Maximum attempts per replica (values below 1 are raised to 1)
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Fixed delay between attempts against the same replica
    pub fn retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Default deadline for a whole dispatch call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> QueryDispatcher {
        QueryDispatcher {
            max_attempts: self.max_attempts.max(1),
            retry_interval: self.retry_interval,
            timeout: self.timeout,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends one query to many replicas and returns the first success
///
/// Clones share the same metrics.
#[derive(Debug, Clone)]
pub struct QueryDispatcher {
    max_attempts: u32,
    retry_interval: Duration,
    timeout: Duration,
    metrics: Arc<DispatchMetrics>,
}

impl QueryDispatcher {
    /// Dispatcher with the default retry policy
    pub fn new() -> Self {
        DispatcherBuilder::new().build()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        DispatcherBuilder::from_config(config).build()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get dispatcher metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispatch with the configured deadline
    pub async fn dispatch<R>(
        &self,
        query: impl Into<Query>,
        replicas: &[Arc<R>],
    ) -> DispatchResult
    where
        R: ReplicaClient + Sync + 'static,
    {
        self.dispatch_with_timeout(query, replicas, self.timeout)
            .await
    }

    /// Dispatch with an explicit deadline for this call
    ///
    /// Returns exactly one of success, `AllFailed` or `TimedOut`. An empty
    /// replica set is `AllFailed` immediately.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, query, replicas),
        fields(replicas = replicas.len(), timeout_ms = timeout.as_millis() as u64)
    )]
    pub async fn dispatch_with_timeout<R>(
        &self,
        query: impl Into<Query>,
        replicas: &[Arc<R>],
        timeout: Duration,
    ) -> DispatchResult
    where
        R: ReplicaClient + Sync + 'static,
    {
        let query = query.into();
        let started = Instant::now();
        self.metrics.inc_dispatches();

        let result = if replicas.is_empty() {
            debug!("No replicas to query");
            Err(DispatchError::AllFailed { replicas: 0 })
        } else {
            self.run_session(query, replicas, timeout).await
        };

        self.record_result(&result, started.elapsed(), replicas.len());
        result
    }

    async fn run_session<R>(
        &self,
        query: Query,
        replicas: &[Arc<R>],
        timeout: Duration,
    ) -> DispatchResult
    where
        R: ReplicaClient + Sync + 'static,
    {
        let (mut session, outcomes_tx) = DispatchSession::open(timeout, replicas.len());

        let mut workers = JoinSet::new();
        for (index, replica) in replicas.iter().enumerate() {
            let ctx = WorkerContext {
                query: query.clone(),
                cancel: session.token(),
                outcomes: outcomes_tx.clone(),
                max_attempts: self.max_attempts,
                retry_interval: self.retry_interval,
                metrics: Arc::clone(&self.metrics),
            };
            workers.spawn(replica_worker(Arc::clone(replica), index, ctx));
        }
        // From here on only workers hold senders.
        drop(outcomes_tx);
        spawn_janitor(workers);

        loop {
            match session.next_event().await {
                SessionEvent::Outcome(AttemptOutcome::Success {
                    replica,
                    replica_index,
                    attempt,
                    payload,
                }) => {
                    session.cancel();
                    return Ok(QueryResponse {
                        payload,
                        replica,
                        replica_index,
                        attempt,
                        elapsed: session.elapsed(),
                    });
                }
                SessionEvent::Outcome(AttemptOutcome::NotFound {
                    replica, attempt, ..
                }) => {
                    info!(
                        replica = %replica,
                        attempt,
                        "Replica reported not found, waiting for others"
                    );
                }
                SessionEvent::Outcome(other) => {
                    debug!(
                        replica = %other.replica(),
                        status = other.status(),
                        "Ignoring non-terminal outcome"
                    );
                }
                SessionEvent::Drained => {
                    return Err(DispatchError::AllFailed {
                        replicas: replicas.len(),
                    });
                }
                SessionEvent::DeadlineElapsed => {
                    return Err(DispatchError::TimedOut { timeout });
                }
            }
        }
    }

    fn record_result(&self, result: &DispatchResult, elapsed: Duration, replica_count: usize) {
        let kind = DispatchKind::of(result);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match result {
            Ok(response) => {
                self.metrics.inc_successes();
                info!(
                    replica = %response.replica,
                    attempt = response.attempt,
                    elapsed_ms,
                    "Dispatch succeeded"
                );
            }
            Err(DispatchError::AllFailed { .. }) => {
                self.metrics.inc_all_failed();
                warn!(elapsed_ms, "All replicas failed");
            }
            Err(DispatchError::TimedOut { .. }) => {
                self.metrics.inc_timed_out();
                warn!(elapsed_ms, "Dispatch timed out");
            }
        }

        observability::record_dispatch(kind.as_str(), elapsed_ms, replica_count);
    }
}

impl Default for QueryDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Reap finished workers and report how each one exited
///
/// Runs detached; outstanding workers stop on their own once the session
/// token is cancelled.
fn spawn_janitor(mut workers: JoinSet<WorkerExit>) {
    tokio::spawn(async move {
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(exit) => observability::record_worker_exit(exit.as_str()),
                Err(e) => {
                    error!(error = ?e, "Replica worker panicked");
                    observability::record_worker_exit("panicked");
                }
            }
        }
        debug!("All replica workers finished");
    });
}

/// Dispatch `query` to `replicas` with the default retry policy and the given
/// deadline
#[instrument(name = "dispatch", skip(query, replicas))]
pub async fn dispatch<R>(
    query: impl Into<Query>,
    replicas: &[Arc<R>],
    timeout: Duration,
) -> DispatchResult
where
    R: ReplicaClient + Sync + 'static,
{
    QueryDispatcher::new()
        .dispatch_with_timeout(query, replicas, timeout)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replicas::MockReplica;

    #[tokio::test]
    async fn test_empty_replicas_all_failed() {
        let dispatcher = QueryDispatcher::new();
        let replicas: Vec<Arc<MockReplica>> = Vec::new();

        let started = Instant::now();
        let result = dispatcher.dispatch("SELECT 1", &replicas).await;

        assert_eq!(result, Err(DispatchError::AllFailed { replicas: 0 }));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(dispatcher.metrics().all_failed, 1);
        assert_eq!(dispatcher.metrics().attempts, 0);
    }

    #[tokio::test]
    async fn test_single_ok_replica() {
        let replicas = vec![Arc::new(MockReplica::ok("replica-1"))];

        let response = dispatch("SELECT 1", &replicas, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(response.payload, "result from replica-1");
        assert_eq!(response.replica, "replica-1");
        assert_eq!(response.replica_index, 0);
        assert_eq!(response.attempt, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_then_ok() {
        let replicas = vec![
            Arc::new(MockReplica::not_found("replica-1")),
            Arc::new(MockReplica::ok("replica-2").with_latency(Duration::from_millis(50))),
        ];
        let dispatcher = QueryDispatcher::new();

        let response = dispatcher
            .dispatch("SELECT * FROM users WHERE id=123", &replicas)
            .await
            .unwrap();

        assert_eq!(response.replica, "replica-2");
        assert_eq!(replicas[0].calls(), 1);
        assert_eq!(dispatcher.metrics().not_found, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_not_found_is_all_failed() {
        let replicas = vec![
            Arc::new(MockReplica::not_found("replica-1")),
            Arc::new(MockReplica::not_found("replica-2")),
        ];

        let result = dispatch("SELECT 1", &replicas, Duration::from_secs(2)).await;

        assert_eq!(result, Err(DispatchError::AllFailed { replicas: 2 }));
        assert_eq!(replicas[0].calls(), 1);
        assert_eq!(replicas[1].calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let replicas = vec![Arc::new(MockReplica::hanging("replica-1"))];
        let dispatcher = QueryDispatcher::builder()
            .timeout(Duration::from_millis(300))
            .build();

        let started = Instant::now();
        let result = dispatcher.dispatch("SELECT 1", &replicas).await;

        assert_eq!(
            result,
            Err(DispatchError::TimedOut {
                timeout: Duration::from_millis(300)
            })
        );
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(dispatcher.metrics().timed_out, 1);
    }

    #[test]
    fn test_builder() {
        let dispatcher = QueryDispatcher::builder()
            .max_attempts(0)
            .retry_interval(Duration::from_millis(10))
            .timeout(Duration::from_secs(1))
            .build();

        assert_eq!(dispatcher.max_attempts(), 1);
        assert_eq!(dispatcher.retry_interval(), Duration::from_millis(10));
        assert_eq!(dispatcher.timeout(), Duration::from_secs(1));

        let from_config = QueryDispatcher::from_config(&DispatchConfig::default());
        assert_eq!(from_config.max_attempts(), 3);
        assert_eq!(from_config.retry_interval(), Duration::from_millis(500));
        assert_eq!(from_config.timeout(), Duration::from_secs(2));
    }
}
