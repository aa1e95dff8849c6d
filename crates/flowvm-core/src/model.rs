//! The model trait: routing, handling and reduction for one screen.

use futures::future::BoxFuture;

use crate::action::{Action, Route};
use crate::emitter::Emitter;
use crate::error::{HandlerError, HandlerResult};

/// Action type produced by the handlers of model `M`.
pub type ModelAction<M> =
    Action<<M as Model>::Mutation, <M as Model>::Effect, <M as Model>::Event>;

/// A screen's intent processing, plugged into a `StateContainer`.
///
/// The container calls `route` for every submitted intent, runs `handle` on
/// the lane it names, and folds emitted state actions with `reduce`.
pub trait Model: Sized + Send + Sync + 'static {
    type Intent: Send + 'static;
    type State: Clone + Send + Sync + 'static;
    type Mutation: Send + 'static;
    type Effect: Clone + Send + 'static;
    type Event: Send + 'static;

    /// Classify an intent. Must return the same policy for every intent of a
    /// given lane; a mismatch is a wiring bug and terminates the container.
    fn route(&self, intent: &Self::Intent) -> Route;

    /// Produce actions for one intent through `emitter`.
    ///
    /// Returning `Err(HandlerError::Failed(..))` ends the handler and is passed
    /// to `recover`. Emission errors (`HandlerError::Cancelled`) should be
    /// propagated with `?`.
    fn handle(&self, intent: Self::Intent, emitter: Emitter<Self>)
        -> BoxFuture<'static, HandlerResult>;

    /// Fold one state action into the previous snapshot.
    fn reduce(state: &Self::State, mutation: Self::Mutation) -> Self::State;

    /// Map a handler failure on `lane` to a user-visible effect.
    ///
    /// Never called for cancellations.
    fn recover(&self, lane: &'static str, error: &HandlerError) -> Option<Self::Effect> {
        let _ = (lane, error);
        None
    }
}
