//! Handler-side action emission.
//!
//! Every emission is acknowledged by the driver once the action has been
//! applied (state folded, effect published, event run). A handler awaiting
//! `emit` therefore observes its own actions in order, and a concat lane's
//! next intent starts only after the previous one's actions took effect.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::action::Action;
use crate::error::{HandlerError, HandlerResult};
use crate::model::{Model, ModelAction};

/// Generation check for handlers on a latest lane.
#[derive(Debug, Clone)]
pub(crate) struct Guard {
    generation: Arc<AtomicU64>,
    expected: u64,
}

impl Guard {
    pub(crate) fn new(generation: Arc<AtomicU64>, expected: u64) -> Self {
        Self {
            generation,
            expected,
        }
    }

    /// `false` once a newer intent has been dispatched to the lane.
    pub(crate) fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.expected
    }
}

/// An action in transit from a handler to the driver.
pub(crate) struct Envelope<M: Model> {
    pub(crate) lane: &'static str,
    pub(crate) action: ModelAction<M>,
    pub(crate) guard: Option<Guard>,
    pub(crate) ack: oneshot::Sender<()>,
}

/// Handle given to `Model::handle` for producing actions.
pub struct Emitter<M: Model> {
    lane: &'static str,
    tx: mpsc::UnboundedSender<Envelope<M>>,
    guard: Option<Guard>,
}

impl<M: Model> Emitter<M> {
    pub(crate) fn new(
        lane: &'static str,
        tx: mpsc::UnboundedSender<Envelope<M>>,
        guard: Option<Guard>,
    ) -> Self {
        Self { lane, tx, guard }
    }

    /// Lane this emitter belongs to.
    pub fn lane(&self) -> &'static str {
        self.lane
    }

    /// `false` once the handler has been superseded or the container ended.
    pub fn is_current(&self) -> bool {
        !self.tx.is_closed() && self.guard.as_ref().map_or(true, Guard::is_current)
    }

    /// Send an action and wait until the container applied it.
    ///
    /// Returns `HandlerError::Cancelled` if the handler was superseded, the
    /// action was discarded as stale, or the container terminated.
    pub async fn emit(&self, action: ModelAction<M>) -> HandlerResult {
        if !self.is_current() {
            return Err(HandlerError::Cancelled);
        }

        let (ack, applied) = oneshot::channel();
        self.tx
            .send(Envelope {
                lane: self.lane,
                action,
                guard: self.guard.clone(),
                ack,
            })
            .map_err(|_| HandlerError::Cancelled)?;

        applied.await.map_err(|_| HandlerError::Cancelled)
    }

    pub async fn set_state(&self, mutation: M::Mutation) -> HandlerResult {
        self.emit(Action::State(mutation)).await
    }

    pub async fn effect(&self, effect: M::Effect) -> HandlerResult {
        self.emit(Action::Effect(effect)).await
    }

    pub async fn event(&self, event: M::Event) -> HandlerResult {
        self.emit(Action::Event(event)).await
    }
}

impl<M: Model> Clone for Emitter<M> {
    fn clone(&self) -> Self {
        Self {
            lane: self.lane,
            tx: self.tx.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for Emitter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("lane", &self.lane)
            .field("current", &self.is_current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_tracks_generation() {
        let generation = Arc::new(AtomicU64::new(3));
        let guard = Guard::new(generation.clone(), 3);
        assert!(guard.is_current());

        generation.fetch_add(1, Ordering::AcqRel);
        assert!(!guard.is_current());
    }
}
