//! The broadcast engine.
//!
//! Delivers the next unsent assignment to every current subscriber with
//! bounded parallel fan-out, handling per-recipient delivery failures
//! without aborting the rest of the broadcast.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{Mutex, Semaphore};
use uuid::Uuid;

use crate::model::{AssignmentId, AssignmentKind};
use crate::registry::{PendingAnswerRegistry, SubscriberRegistry};
use crate::store::AssignmentStore;
use crate::traits::Transport;

/// Configuration for the broadcaster.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Maximum concurrent delivery attempts.
    pub parallelism: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self { parallelism: 8 }
    }
}

/// Result of one broadcast run.
#[derive(Debug, Clone)]
pub struct BroadcastOutcome {
    /// Unique id of this broadcast run, for log correlation.
    pub run_id: Uuid,
    /// The assignment that was released.
    pub assignment_id: AssignmentId,
    /// Recipients the transport confirmed delivery to.
    pub delivered: usize,
    /// Recipients whose delivery failed (permanently or transiently).
    pub failed: usize,
}

/// Orchestrates delivery of the next unsent assignment to all current
/// subscribers.
pub struct Broadcaster {
    store: Arc<AssignmentStore>,
    subscribers: Arc<SubscriberRegistry>,
    pending: Arc<PendingAnswerRegistry>,
    transport: Arc<dyn Transport>,
    config: BroadcasterConfig,
    // Serializes whole broadcast runs so "exactly one assignment
    // released per call" holds under concurrent triggers.
    guard: Mutex<()>,
}

impl Broadcaster {
    pub fn new(
        store: Arc<AssignmentStore>,
        subscribers: Arc<SubscriberRegistry>,
        pending: Arc<PendingAnswerRegistry>,
        transport: Arc<dyn Transport>,
        config: BroadcasterConfig,
    ) -> Self {
        Self {
            store,
            subscribers,
            pending,
            transport,
            config,
            guard: Mutex::new(()),
        }
    }

    /// Broadcast the next unsent assignment, if any.
    ///
    /// Returns `None` when no assignment is waiting. The assignment is
    /// marked sent after all attempts complete, regardless of how many
    /// recipients were actually reached; a broadcast is only ever
    /// attempted once per assignment.
    pub async fn broadcast_next(&self) -> Option<BroadcastOutcome> {
        let _run = self.guard.lock().await;

        let assignment = self.store.next_unsent()?;
        let run_id = Uuid::new_v4();
        let recipients = self.subscribers.snapshot();

        tracing::info!(
            %run_id,
            assignment_id = assignment.id,
            kind = %assignment.kind,
            recipients = recipients.len(),
            "broadcasting assignment"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let assignment = Arc::new(assignment);
        let mut attempts = FuturesUnordered::new();

        for recipient in recipients {
            let semaphore = Arc::clone(&semaphore);
            let transport = Arc::clone(&self.transport);
            let assignment = Arc::clone(&assignment);

            attempts.push(async move {
                // Semaphore close only happens on drop; treat as failure.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (recipient, Attempt::TransientFailure);
                };
                match transport.deliver(recipient, &assignment).await {
                    Ok(()) => (recipient, Attempt::Delivered),
                    Err(e) if e.is_permanent() => {
                        tracing::warn!(recipient, error = %e, "permanent delivery failure");
                        (recipient, Attempt::PermanentFailure)
                    }
                    Err(e) => {
                        tracing::warn!(recipient, error = %e, "delivery failed");
                        (recipient, Attempt::TransientFailure)
                    }
                }
            });
        }

        let mut delivered = 0usize;
        let mut failed = 0usize;

        while let Some((recipient, attempt)) = attempts.next().await {
            match attempt {
                Attempt::Delivered => {
                    delivered += 1;
                    if matches!(assignment.kind, AssignmentKind::Text) {
                        self.pending.set(recipient, assignment.id);
                    }
                }
                Attempt::PermanentFailure => {
                    failed += 1;
                    self.subscribers.remove(recipient);
                }
                Attempt::TransientFailure => {
                    failed += 1;
                }
            }
        }

        self.store.mark_sent(assignment.id);

        tracing::info!(
            %run_id,
            assignment_id = assignment.id,
            delivered,
            failed,
            "broadcast complete"
        );

        Some(BroadcastOutcome {
            run_id,
            assignment_id: assignment.id,
            delivered,
            failed,
        })
    }
}

enum Attempt {
    Delivered,
    PermanentFailure,
    TransientFailure,
}
