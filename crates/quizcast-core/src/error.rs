//! Core error types.
//!
//! `DeliveryError` is defined here rather than in the transport crate so
//! the broadcaster can classify failures as permanent or transient
//! without string matching.

use thiserror::Error;

use crate::model::AssignmentId;

/// Errors raised by the core engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A choice assignment was created with no options.
    #[error("choice assignment has no options")]
    EmptyOptions,

    /// Two options share the same label.
    #[error("duplicate option label: {0}")]
    DuplicateLabel(String),

    /// The correct answer of a choice assignment is not an option label.
    #[error("correct answer '{0}' is not among the option labels")]
    CorrectLabelMissing(String),

    /// An inbound event referenced an assignment that does not exist.
    #[error("unknown assignment id: {0}")]
    UnknownAssignment(AssignmentId),

    /// An inbound event referenced an assignment of the wrong kind,
    /// e.g. a text reply for a choice assignment.
    #[error("assignment {0} is not a {1} assignment")]
    WrongKind(AssignmentId, &'static str),

    /// A free-text reply arrived from a recipient with no pending entry.
    #[error("no pending text assignment for this recipient")]
    NoPendingAnswer,
}

impl CoreError {
    /// Returns `true` if an inbound event carrying this error should be
    /// discarded silently with no state change.
    pub fn is_discard(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownAssignment(_)
                | CoreError::WrongKind(..)
                | CoreError::NoPendingAnswer
        )
    }
}

/// Errors that can occur when delivering a message to a recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient blocked the bot or deleted their account.
    #[error("recipient blocked delivery")]
    Blocked,

    /// The recipient id is unknown to the transport.
    #[error("recipient not found")]
    RecipientNotFound,

    /// The transport hit its rate limit.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The delivery attempt timed out.
    #[error("delivery timed out after {0}s")]
    Timeout(u64),

    /// The transport API returned an error response.
    #[error("transport error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl DeliveryError {
    /// Returns `true` if this failure is permanent for the recipient.
    ///
    /// The broadcaster unsubscribes a recipient only on permanent
    /// failure; transient failures count as undelivered but keep the
    /// subscription (there are no retries either way).
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DeliveryError::Blocked | DeliveryError::RecipientNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_permanence() {
        assert!(DeliveryError::Blocked.is_permanent());
        assert!(DeliveryError::RecipientNotFound.is_permanent());
        assert!(!DeliveryError::Timeout(30).is_permanent());
        assert!(!DeliveryError::RateLimited {
            retry_after_secs: 5
        }
        .is_permanent());
        assert!(!DeliveryError::NetworkError("dns".into()).is_permanent());
    }

    #[test]
    fn discardable_core_errors() {
        assert!(CoreError::UnknownAssignment(7).is_discard());
        assert!(CoreError::WrongKind(7, "text").is_discard());
        assert!(CoreError::NoPendingAnswer.is_discard());
        assert!(!CoreError::EmptyOptions.is_discard());
    }
}
