//! Subscriber and pending-answer registries.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use crate::model::{AssignmentId, RecipientId};

/// The set of recipients currently eligible for broadcasts.
///
/// Membership only; there is no per-subscriber metadata.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    inner: RwLock<HashSet<RecipientId>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent set insertion. Returns `true` if the recipient was new.
    pub fn add(&self, recipient: RecipientId) -> bool {
        self.inner
            .write()
            .expect("subscriber registry poisoned")
            .insert(recipient)
    }

    /// Idempotent set removal. Returns `true` if the recipient was present.
    pub fn remove(&self, recipient: RecipientId) -> bool {
        self.inner
            .write()
            .expect("subscriber registry poisoned")
            .remove(&recipient)
    }

    pub fn contains(&self, recipient: RecipientId) -> bool {
        self.inner
            .read()
            .expect("subscriber registry poisoned")
            .contains(&recipient)
    }

    /// A point-in-time copy of the membership.
    ///
    /// Broadcasts iterate the snapshot, so concurrent add/remove never
    /// affects an iteration in progress.
    pub fn snapshot(&self) -> Vec<RecipientId> {
        self.inner
            .read()
            .expect("subscriber registry poisoned")
            .iter()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("subscriber registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tracks, per recipient, which free-text assignment they still owe an
/// answer for.
///
/// At most one entry per recipient: a new broadcast overwrites any
/// stale entry, and grading consumes the entry atomically.
#[derive(Debug, Default)]
pub struct PendingAnswerRegistry {
    inner: Mutex<HashMap<RecipientId, AssignmentId>>,
}

impl PendingAnswerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `recipient` owes an answer for `assignment_id`,
    /// overwriting any prior pending entry for that recipient.
    pub fn set(&self, recipient: RecipientId, assignment_id: AssignmentId) {
        self.inner
            .lock()
            .expect("pending registry poisoned")
            .insert(recipient, assignment_id);
    }

    /// Atomically read and clear the recipient's pending entry.
    ///
    /// Grading goes through here so a given reply is consumed at most
    /// once even if two replies race.
    pub fn take(&self, recipient: RecipientId) -> Option<AssignmentId> {
        self.inner
            .lock()
            .expect("pending registry poisoned")
            .remove(&recipient)
    }

    /// Read without clearing; used by reports only.
    pub fn peek(&self, recipient: RecipientId) -> Option<AssignmentId> {
        self.inner
            .lock()
            .expect("pending registry poisoned")
            .get(&recipient)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("pending registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_add_remove_idempotent() {
        let registry = SubscriberRegistry::new();
        assert!(registry.add(1));
        assert!(!registry.add(1));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(1));
        assert!(!registry.remove(1));
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_detached() {
        let registry = SubscriberRegistry::new();
        registry.add(1);
        registry.add(2);
        let snapshot = registry.snapshot();
        registry.remove(1);
        registry.add(3);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(&1));
        assert!(!snapshot.contains(&3));
    }

    #[test]
    fn pending_set_overwrites() {
        let pending = PendingAnswerRegistry::new();
        pending.set(7, 1);
        pending.set(7, 2);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.peek(7), Some(2));
    }

    #[test]
    fn take_clears_entry() {
        let pending = PendingAnswerRegistry::new();
        pending.set(7, 1);
        assert_eq!(pending.take(7), Some(1));
        assert_eq!(pending.take(7), None);
        assert!(pending.is_empty());
    }
}
