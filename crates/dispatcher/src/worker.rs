//! Replica worker - bounded retry loop against one replica

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use contracts::{Query, ReplicaClient, ReplicaError};

use crate::metrics::DispatchMetrics;
use crate::outcome::AttemptOutcome;

/// How a worker finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Sent a success or not-found outcome
    Reported,
    /// Ran out of attempts without a terminal answer
    Exhausted,
    /// Stopped by the cancellation scope
    Cancelled,
}

impl WorkerExit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Everything a worker shares with its dispatch session
pub(crate) struct WorkerContext {
    pub query: Query,
    pub cancel: CancellationToken,
    pub outcomes: mpsc::Sender<AttemptOutcome>,
    pub max_attempts: u32,
    pub retry_interval: Duration,
    pub metrics: Arc<DispatchMetrics>,
}

/// Drive up to `max_attempts` calls against one replica
///
/// Emits at most one outcome (success or not-found). Exhaustion and
/// cancellation end the worker silently.
#[instrument(
    name = "replica_worker_loop",
    skip(replica, ctx),
    fields(replica = %replica.name())
)]
pub(crate) async fn replica_worker<R>(
    replica: Arc<R>,
    replica_index: usize,
    ctx: WorkerContext,
) -> WorkerExit
where
    R: ReplicaClient + Sync,
{
    let name = replica.name();

    for attempt in 1..=ctx.max_attempts {
        if ctx.cancel.is_cancelled() {
            debug!(replica = %name, attempt, "Cancelled before attempt");
            return WorkerExit::Cancelled;
        }

        ctx.metrics.inc_attempts();
        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(ReplicaError::Cancelled),
            result = replica.execute(&ctx.query, &ctx.cancel) => result,
        };

        let outcome = AttemptOutcome::from_result(name, replica_index, attempt, result);
        observability::record_attempt(name, outcome.status());

        match outcome {
            AttemptOutcome::TransientFailure { ref cause, .. } => {
                warn!(
                    replica = %name,
                    attempt,
                    max_attempts = ctx.max_attempts,
                    error = %cause,
                    "Attempt failed"
                );
                if attempt < ctx.max_attempts {
                    ctx.metrics.inc_retries();
                    observability::record_retry(name);
                }

                // The final failure waits too, so exhaustion is reported no
                // earlier than max_attempts * retry_interval.
                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => {
                        debug!(replica = %name, attempt, "Cancelled during backoff");
                        return WorkerExit::Cancelled;
                    }
                    _ = sleep(ctx.retry_interval) => {}
                }
            }
            AttemptOutcome::Cancelled { .. } => {
                debug!(replica = %name, attempt, "Cancelled during attempt");
                return WorkerExit::Cancelled;
            }
            terminal => {
                if matches!(terminal, AttemptOutcome::NotFound { .. }) {
                    ctx.metrics.inc_not_found();
                }
                report(&ctx, terminal);
                return WorkerExit::Reported;
            }
        }
    }

    debug!(replica = %name, attempts = ctx.max_attempts, "Attempts exhausted");
    WorkerExit::Exhausted
}

/// Send the worker's single outcome (non-blocking)
fn report(ctx: &WorkerContext, outcome: AttemptOutcome) {
    match ctx.outcomes.try_send(outcome) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(outcome)) => {
            ctx.metrics.inc_discarded_outcomes();
            observability::record_discarded_outcome(outcome.replica());
            warn!(replica = %outcome.replica(), "Completion channel full, outcome dropped");
        }
        Err(mpsc::error::TrySendError::Closed(outcome)) => {
            ctx.metrics.inc_discarded_outcomes();
            observability::record_discarded_outcome(outcome.replica());
            debug!(
                replica = %outcome.replica(),
                status = outcome.status(),
                "Dispatch already decided, outcome discarded"
            );
        }
    }
}
