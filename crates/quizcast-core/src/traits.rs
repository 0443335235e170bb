//! The transport seam between the core engine and the outside world.
//!
//! Implemented by the `quizcast-transport` crate. The core hands the
//! transport a full [`Assignment`] and lets the implementation decide
//! how to render it (buttons for choice, plain prompt for text).

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::model::{Assignment, RecipientId};

/// Trait for message delivery backends.
///
/// Implementations must resolve every delivery attempt within a bounded
/// timeout; the engine never retries, so a returned error is final for
/// that attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name (e.g. "telegram").
    fn name(&self) -> &str;

    /// Deliver one assignment to one recipient.
    async fn deliver(
        &self,
        recipient: RecipientId,
        assignment: &Assignment,
    ) -> Result<(), DeliveryError>;
}
