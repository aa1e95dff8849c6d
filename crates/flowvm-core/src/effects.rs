//! Effect fan-out.
//!
//! Every observer owns an unbounded queue. An effect published while an
//! observer is attached reaches that observer exactly once, however slowly it
//! drains; observers attaching later never see it.

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Fan-out of effects to the observers attached at publish time.
pub(crate) struct EffectHub<E> {
    observers: Mutex<Vec<mpsc::UnboundedSender<E>>>,
}

impl<E: Clone> EffectHub<E> {
    pub(crate) fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Attach an observer. It receives effects published from now on.
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().push(tx);
        rx
    }

    /// Deliver `effect` to every attached observer, detaching dropped ones.
    ///
    /// Returns the number of observers reached.
    pub(crate) fn publish(&self, effect: E) -> usize {
        let mut observers = self.observers.lock();
        observers.retain(|tx| tx.send(effect.clone()).is_ok());
        observers.len()
    }

    /// Detach every observer. Their streams end once drained.
    pub(crate) fn close(&self) {
        self.observers.lock().clear();
    }
}
