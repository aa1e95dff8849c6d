//! Observable state holder with automatic change notifications.
//!
//! Replacing the state is the notification: every write broadcasts the new
//! snapshot. Subscribers always see the latest value and never a backlog.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

// =============================================================================
// ObservableState
// =============================================================================

/// A state snapshot that broadcasts every replacement.
///
/// ## Thread Safety
///
/// Reads go through the `tokio::sync::watch` slot and never block writers for
/// longer than a clone. Writes are expected from a single owner (the container
/// driver); concurrent writers would each replace the snapshot in turn.
///
/// ## Usage
///
/// ```ignore
/// let state = ObservableState::new(0u32);
/// let rx = state.subscribe();
///
/// // This replaces AND broadcasts
/// state.apply(|n| n + 1);
///
/// assert_eq!(*rx.borrow(), 1);
/// ```
pub struct ObservableState<S> {
    tx: watch::Sender<S>,
    transitions: AtomicU64,
}

impl<S: Clone + Send + Sync + 'static> ObservableState<S> {
    /// Create a holder seeded with the initial snapshot.
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            transitions: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Mutation Methods (all broadcast automatically)
    // =========================================================================

    /// Derive the next snapshot from the current one and broadcast it.
    pub fn apply<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S,
    {
        let next = {
            let current = self.tx.borrow();
            f(&current)
        };
        self.replace(next);
    }

    /// Replace the snapshot, returning the previous one.
    fn replace(&self, state: S) -> S {
        let previous = self.tx.send_replace(state);
        let count = self.transitions.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!("State replaced, transition {}", count);
        previous
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    /// Clone of the current snapshot.
    pub fn get(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Number of replacements since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Acquire)
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribe to state changes.
    ///
    /// The receiver holds the current snapshot immediately and is marked
    /// changed on every later replacement.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Snapshot {
        items: Vec<&'static str>,
        loading: bool,
    }

    fn empty() -> Snapshot {
        Snapshot {
            items: Vec::new(),
            loading: false,
        }
    }

    #[test]
    fn test_apply_broadcasts() {
        let state = ObservableState::new(empty());
        let rx = state.subscribe();

        assert!(rx.borrow().items.is_empty());

        state.apply(|s| Snapshot {
            loading: true,
            ..s.clone()
        });
        assert!(rx.borrow().loading);

        state.apply(|_| Snapshot {
            items: vec!["a", "b"],
            loading: false,
        });
        assert_eq!(rx.borrow().items, vec!["a", "b"]);
        assert!(!rx.borrow().loading);
    }

    #[test]
    fn test_replace_returns_previous() {
        let state = ObservableState::new(1u32);
        let previous = state.replace(2);
        assert_eq!(previous, 1);
        assert_eq!(state.get(), 2);
    }

    #[test]
    fn test_late_subscriber_sees_current() {
        let state = ObservableState::new(0u32);
        for n in 1..=5 {
            state.apply(|_| n);
        }

        let rx = state.subscribe();
        assert_eq!(*rx.borrow(), 5);
        assert_eq!(state.transitions(), 5);
    }

    #[test]
    fn test_slow_subscriber_skips_intermediate() {
        let state = ObservableState::new(0u32);
        let mut rx = state.subscribe();

        state.apply(|n| n + 1);
        state.apply(|n| n + 1);
        state.apply(|n| n + 1);

        // Only the latest value is pending, not a queue of three
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(*rx.borrow_and_update(), 3);
        assert!(!rx.has_changed().unwrap_or(true));
    }
}
