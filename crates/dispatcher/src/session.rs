//! DispatchSession - per-call deadline, cancellation scope and completion channel
//!
//! The completion channel reaches end-of-stream only when every worker has
//! finished and dropped its sender, so `Drained` strictly means "all workers
//! done", never "N messages received".

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::outcome::AttemptOutcome;

/// Upper bound used when `start + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// What the collector observed next
#[derive(Debug)]
pub(crate) enum SessionEvent {
    /// A worker reported an outcome
    Outcome(AttemptOutcome),
    /// All workers finished; no more outcomes will arrive
    Drained,
    /// The global deadline elapsed
    DeadlineElapsed,
}

/// Ephemeral state of one dispatch call
///
/// Dropping the session cancels the shared token, so every exit path of the
/// collector releases the workers.
pub(crate) struct DispatchSession {
    started: Instant,
    deadline: Instant,
    cancel: CancellationToken,
    outcomes: mpsc::Receiver<AttemptOutcome>,
    _release: DropGuard,
}

impl DispatchSession {
    /// Open a session for `replica_count` workers
    ///
    /// Returns the session and the sender to clone into each worker. The
    /// channel holds one slot per replica, so a worker never blocks on its
    /// single report.
    pub(crate) fn open(
        timeout: Duration,
        replica_count: usize,
    ) -> (Self, mpsc::Sender<AttemptOutcome>) {
        let started = Instant::now();
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(replica_count.max(1));

        let session = Self {
            started,
            deadline,
            _release: cancel.clone().drop_guard(),
            cancel,
            outcomes: rx,
        };
        (session, tx)
    }

    /// Token handed to workers and replica clients
    pub(crate) fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signal every worker to stop
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wait for the next outcome, end-of-stream, or the deadline
    ///
    /// An outcome already queued when the deadline fires is returned first.
    pub(crate) async fn next_event(&mut self) -> SessionEvent {
        tokio::select! {
            biased;
            outcome = self.outcomes.recv() => match outcome {
                Some(outcome) => SessionEvent::Outcome(outcome),
                None => SessionEvent::Drained,
            },
            _ = sleep_until(self.deadline) => SessionEvent::DeadlineElapsed,
        }
    }
}
