//! State container
//!
//! The `StateContainer` is the public face of one screen's MVI pipeline:
//! - `submit` enqueues intents without blocking
//! - `current_state` / `observe_state` read the single current snapshot
//! - `observe_effects` attaches to one-shot effects
//!
//! ## Lifecycle
//!
//! ```text
//! builder().spawn() ──→ Active(initial) ──→ Active(s') ──→ …
//!                                                         │
//!              shutdown() / drop / parent scope cancelled ▼
//!                                                    Terminated
//! ```
//!
//! On termination every in-flight handler is aborted, actions not yet folded
//! are discarded, and all observer streams end.

mod driver;


use std::sync::Arc;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{UnboundedReceiverStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ContainerConfig;
use crate::effects::EffectHub;
use crate::error::ContainerError;
use crate::model::Model;
use crate::observable_state::ObservableState;
use crate::sink::{DiscardEvents, EventSink};
use crate::stream::distinct_until_changed;

use driver::Driver;

// =============================================================================
// Builder
// =============================================================================

/// Configures and spawns a `StateContainer`.
pub struct ContainerBuilder<M: Model> {
    model: Arc<M>,
    initial_state: M::State,
    initial_intents: Vec<M::Intent>,
    sources: Vec<BoxStream<'static, M::Intent>>,
    sink: Arc<dyn EventSink<M::Event>>,
    parent: Option<CancellationToken>,
    config: ContainerConfig,
}

impl<M: Model> ContainerBuilder<M> {
    /// Intents processed first, in order, before any other source.
    pub fn initial_intents(mut self, intents: impl IntoIterator<Item = M::Intent>) -> Self {
        self.initial_intents.extend(intents);
        self
    }

    /// Merge an external intent stream for the container's lifetime.
    pub fn intent_source<S>(mut self, source: S) -> Self
    where
        S: Stream<Item = M::Intent> + Send + 'static,
    {
        self.sources.push(source.boxed());
        self
    }

    /// Sink that runs event actions. Defaults to `DiscardEvents`.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink<M::Event>>) -> Self {
        self.sink = sink;
        self
    }

    /// Tie the container to a hosting scope. Cancelling `parent` terminates it.
    pub fn scope(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the container on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(self) -> StateContainer<M> {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("container", name = %self.config.name, %id);

        let scope = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let state = Arc::new(ObservableState::new(self.initial_state));
        let effects = Arc::new(EffectHub::new());
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();

        // Initial intents are queued before any source can interleave
        for intent in self.initial_intents {
            let _ = intents_tx.send(intent);
        }

        for (index, mut source) in self.sources.into_iter().enumerate() {
            let tx = intents_tx.clone();
            let scope = scope.clone();
            tokio::spawn(
                async move {
                    loop {
                        tokio::select! {
                            _ = scope.cancelled() => break,
                            next = source.next() => match next {
                                Some(intent) => {
                                    if tx.send(intent).is_err() {
                                        break;
                                    }
                                }
                                None => {
                                    tracing::debug!("Intent source {} completed", index);
                                    break;
                                }
                            },
                        }
                    }
                }
                .instrument(span.clone()),
            );
        }

        let driver = Driver::new(
            self.model,
            self.config.clone(),
            state.clone(),
            effects.clone(),
            self.sink,
            scope.clone(),
            intents_rx,
        );
        let handle = tokio::spawn(driver.run().instrument(span));

        StateContainer {
            id,
            config: self.config,
            intents: intents_tx,
            state,
            effects,
            scope,
            driver: Mutex::new(Some(handle)),
        }
    }
}

// =============================================================================
// StateContainer
// =============================================================================

/// A running MVI pipeline for one model.
///
/// Dropping the container ends its scope.
pub struct StateContainer<M: Model> {
    id: Uuid,
    config: ContainerConfig,
    intents: mpsc::UnboundedSender<M::Intent>,
    state: Arc<ObservableState<M::State>>,
    effects: Arc<EffectHub<M::Effect>>,
    scope: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<M: Model> StateContainer<M> {
    /// Start configuring a container for `model` seeded with `initial_state`.
    pub fn builder(model: Arc<M>, initial_state: M::State) -> ContainerBuilder<M> {
        ContainerBuilder {
            model,
            initial_state,
            initial_intents: Vec::new(),
            sources: Vec::new(),
            sink: Arc::new(DiscardEvents),
            parent: None,
            config: ContainerConfig::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Enqueue an intent. Never blocks and never drops while active.
    pub fn submit(&self, intent: M::Intent) -> Result<(), ContainerError> {
        if self.scope.is_cancelled() {
            return Err(ContainerError::Terminated);
        }
        self.intents
            .send(intent)
            .map_err(|_| ContainerError::Terminated)
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The current snapshot. Never triggers computation.
    pub fn current_state(&self) -> M::State {
        self.state.get()
    }

    /// Number of state transitions folded so far.
    pub fn transitions(&self) -> u64 {
        self.state.transitions()
    }

    /// Stream of snapshots, starting with the current one.
    ///
    /// Slow observers skip intermediate snapshots and always resume at the
    /// latest. The stream ends when the container terminates.
    pub fn observe_state(&self) -> BoxStream<'static, M::State> {
        if self.scope.is_cancelled() {
            return stream::empty().boxed();
        }
        WatchStream::new(self.state.subscribe())
            .take_until(self.scope.clone().cancelled_owned())
            .boxed()
    }

    /// A projection of the state, re-emitted only when it changes.
    pub fn observe_slice<T, F>(&self, project: F) -> BoxStream<'static, T>
    where
        T: Clone + PartialEq + Send + 'static,
        F: FnMut(M::State) -> T + Send + 'static,
    {
        distinct_until_changed(self.observe_state().map(project)).boxed()
    }

    /// Wait for the first snapshot matching `predicate`, current one included.
    ///
    /// Returns `None` if the container terminates first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Option<M::State>
    where
        F: FnMut(&M::State) -> bool,
    {
        let mut states = self.observe_state();
        while let Some(state) = states.next().await {
            if predicate(&state) {
                return Some(state);
            }
        }
        None
    }

    // =========================================================================
    // Effects
    // =========================================================================

    /// Stream of effects emitted after this call. Nothing is replayed.
    ///
    /// Every effect published while the stream is alive is delivered to it
    /// exactly once, in order, no matter how slowly it is polled.
    pub fn observe_effects(&self) -> BoxStream<'static, M::Effect> {
        if self.scope.is_cancelled() {
            return stream::empty().boxed();
        }
        UnboundedReceiverStream::new(self.effects.subscribe())
            .take_until(self.scope.clone().cancelled_owned())
            .boxed()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn is_terminated(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Resolves once the container has terminated, for any reason.
    pub async fn terminated(&self) {
        self.scope.cancelled().await
    }

    /// End the scope and wait for the driver to stop.
    ///
    /// # Panics
    ///
    /// Resumes the panic of a handler or reducer that terminated the
    /// container.
    pub async fn shutdown(&self) {
        self.scope.cancel();
        let handle = self.driver.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }
}

impl<M: Model> Drop for StateContainer<M> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
