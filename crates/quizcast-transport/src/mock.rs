//! Mock transport for testing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizcast_core::error::DeliveryError;
use quizcast_core::model::{Assignment, AssignmentId, RecipientId};
use quizcast_core::traits::Transport;

/// A mock transport for exercising the broadcaster and the CLI service
/// without a real messaging backend.
///
/// Failures are scripted per recipient; everything else is recorded as
/// delivered.
#[derive(Default)]
pub struct MockTransport {
    fail_permanently: HashSet<RecipientId>,
    fail_transiently: HashSet<RecipientId>,
    /// (recipient, assignment id) pairs in delivery-completion order.
    deliveries: Mutex<Vec<(RecipientId, AssignmentId)>>,
    call_count: AtomicU32,
}

impl MockTransport {
    /// A transport where every delivery succeeds.
    pub fn reliable() -> Self {
        Self::default()
    }

    /// Script a permanent failure for the given recipients.
    pub fn with_permanent_failures(recipients: &[RecipientId]) -> Self {
        Self {
            fail_permanently: recipients.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Script a transient failure for the given recipients.
    pub fn with_transient_failures(recipients: &[RecipientId]) -> Self {
        Self {
            fail_transiently: recipients.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Deliveries that succeeded, in completion order.
    pub fn deliveries(&self) -> Vec<(RecipientId, AssignmentId)> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Total delivery attempts, including failures.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(
        &self,
        recipient: RecipientId,
        assignment: &Assignment,
    ) -> Result<(), DeliveryError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_permanently.contains(&recipient) {
            return Err(DeliveryError::Blocked);
        }
        if self.fail_transiently.contains(&recipient) {
            return Err(DeliveryError::Timeout(30));
        }

        self.deliveries
            .lock()
            .unwrap()
            .push((recipient, assignment.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quizcast_core::model::AssignmentKind;

    fn assignment(id: AssignmentId) -> Assignment {
        Assignment {
            id,
            kind: AssignmentKind::Text,
            question: "q".into(),
            correct_answer: "a".into(),
            explanation: None,
            sent: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_successful_deliveries() {
        let transport = MockTransport::reliable();
        transport.deliver(1, &assignment(1)).await.unwrap();
        transport.deliver(2, &assignment(1)).await.unwrap();

        assert_eq!(transport.deliveries(), vec![(1, 1), (2, 1)]);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let transport = MockTransport::with_permanent_failures(&[2]);
        transport.deliver(1, &assignment(1)).await.unwrap();
        let err = transport.deliver(2, &assignment(1)).await.unwrap_err();

        assert!(err.is_permanent());
        assert_eq!(transport.deliveries(), vec![(1, 1)]);
        assert_eq!(transport.call_count(), 2);
    }
}
