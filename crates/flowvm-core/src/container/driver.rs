//! The container driver: intent dispatch, lane bookkeeping and the state fold.
//!
//! One driver task runs per container. It is the only writer of the state and
//! the only publisher of effects, and it owns every handler task in a
//! `JoinSet` so that ending the scope aborts all in-flight work.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::action::{Action, Policy};
use crate::config::ContainerConfig;
use crate::effects::EffectHub;
use crate::emitter::{Emitter, Envelope, Guard};
use crate::error::HandlerError;
use crate::model::Model;
use crate::observable_state::ObservableState;
use crate::sink::EventSink;

// =============================================================================
// Lanes
// =============================================================================

/// An intent admitted to run, with its cancellation handles.
struct Admitted<I> {
    intent: I,
    guard: Option<Guard>,
    token: CancellationToken,
}

/// Per-lane scheduling state.
struct Lane<I> {
    policy: Policy,
    generation: Arc<AtomicU64>,
    in_flight: usize,
    pending: VecDeque<I>,
    /// Token of the running handler (latest lanes only).
    current: Option<CancellationToken>,
}

impl<I> Lane<I> {
    fn new(policy: Policy) -> Self {
        Self {
            policy,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: 0,
            pending: VecDeque::new(),
            current: None,
        }
    }

    /// Admit a new intent, queueing it if the lane is saturated.
    fn admit(&mut self, intent: I, scope: &CancellationToken) -> Option<Admitted<I>> {
        match self.policy {
            Policy::Latest => {
                let expected = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                if let Some(previous) = self.current.take() {
                    tracing::debug!("Superseding in-flight handler");
                    previous.cancel();
                }
                let token = scope.child_token();
                self.current = Some(token.clone());
                self.in_flight += 1;
                Some(Admitted {
                    intent,
                    guard: Some(Guard::new(self.generation.clone(), expected)),
                    token,
                })
            }
            Policy::Concat | Policy::Merge { .. } => {
                if self.in_flight < self.policy.max_in_flight() {
                    self.in_flight += 1;
                    Some(Admitted {
                        intent,
                        guard: None,
                        token: scope.child_token(),
                    })
                } else {
                    self.pending.push_back(intent);
                    tracing::debug!("Lane busy, {} intent(s) queued", self.pending.len());
                    None
                }
            }
        }
    }

    /// Record a finished handler and admit the next queued intent, if any.
    fn release(&mut self, scope: &CancellationToken) -> Option<Admitted<I>> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let intent = self.pending.pop_front()?;
        self.in_flight += 1;
        Some(Admitted {
            intent,
            guard: None,
            token: scope.child_token(),
        })
    }
}

// =============================================================================
// Driver
// =============================================================================

pub(crate) struct Driver<M: Model> {
    model: Arc<M>,
    config: ContainerConfig,
    state: Arc<ObservableState<M::State>>,
    effects: Arc<EffectHub<M::Effect>>,
    sink: Arc<dyn EventSink<M::Event>>,
    scope: CancellationToken,
    intents: mpsc::UnboundedReceiver<M::Intent>,
    actions_tx: mpsc::UnboundedSender<Envelope<M>>,
    actions_rx: mpsc::UnboundedReceiver<Envelope<M>>,
    lanes: HashMap<&'static str, Lane<M::Intent>>,
    tasks: JoinSet<&'static str>,
}

impl<M: Model> Driver<M> {
    pub(crate) fn new(
        model: Arc<M>,
        config: ContainerConfig,
        state: Arc<ObservableState<M::State>>,
        effects: Arc<EffectHub<M::Effect>>,
        sink: Arc<dyn EventSink<M::Event>>,
        scope: CancellationToken,
        intents: mpsc::UnboundedReceiver<M::Intent>,
    ) -> Self {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        Self {
            model,
            config,
            state,
            effects,
            sink,
            scope,
            intents,
            actions_tx,
            actions_rx,
            lanes: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Run until the scope ends or every intent sender is gone.
    ///
    /// Actions are drained before intents so handlers waiting on an
    /// acknowledgement make progress ahead of new work.
    pub(crate) async fn run(mut self) {
        // Cancels the scope on every exit path, unwinding included
        let _scope_guard = self.scope.clone().drop_guard();
        tracing::info!("State container active");

        loop {
            tokio::select! {
                biased;

                _ = self.scope.cancelled() => {
                    tracing::debug!("Scope ended");
                    break;
                }
                Some(envelope) = self.actions_rx.recv() => {
                    self.apply(envelope).await;
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.finished(joined);
                }
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.dispatch(intent),
                    None => {
                        tracing::debug!("All intent senders dropped");
                        break;
                    }
                },
            }
        }

        let aborted = self.tasks.len();
        self.tasks.abort_all();
        self.effects.close();
        tracing::info!(
            "State container terminated, {} handler(s) aborted, {} transition(s)",
            aborted,
            self.state.transitions()
        );
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn dispatch(&mut self, intent: M::Intent) {
        let route = self.model.route(&intent);
        let policy = route.policy.resolve(self.config.default_merge_limit);

        let lane = self
            .lanes
            .entry(route.lane)
            .or_insert_with(|| Lane::new(policy));
        assert_eq!(
            lane.policy, policy,
            "lane '{}' routed with conflicting policies",
            route.lane
        );

        tracing::debug!(lane = route.lane, "Intent received");
        if let Some(admitted) = lane.admit(intent, &self.scope) {
            self.spawn_handler(route.lane, admitted);
        }
    }

    fn spawn_handler(&mut self, lane: &'static str, admitted: Admitted<M::Intent>) {
        let Admitted {
            intent,
            guard,
            token,
        } = admitted;

        let emitter = Emitter::new(lane, self.actions_tx.clone(), guard);
        let work = self.model.handle(intent, emitter.clone());
        let model = self.model.clone();

        let task = async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(HandlerError::Cancelled),
                result = work => result,
            };

            match outcome {
                Ok(()) => tracing::debug!("Handler completed"),
                Err(HandlerError::Cancelled) => tracing::debug!("Handler cancelled"),
                Err(error) => {
                    tracing::warn!("Handler failed: {}", error);
                    if let Some(effect) = model.recover(lane, &error) {
                        // Stale handlers get Cancelled here and stay silent
                        let _ = emitter.effect(effect).await;
                    }
                }
            }
            lane
        };

        self.tasks
            .spawn(task.instrument(tracing::debug_span!("handler", lane)));
    }

    fn finished(&mut self, joined: Result<&'static str, JoinError>) {
        let lane = match joined {
            Ok(lane) => lane,
            Err(err) if err.is_panic() => {
                tracing::error!("Handler panicked, terminating container");
                std::panic::resume_unwind(err.into_panic());
            }
            Err(_) => return,
        };

        let next = self
            .lanes
            .get_mut(lane)
            .and_then(|l| l.release(&self.scope));
        if let Some(admitted) = next {
            self.spawn_handler(lane, admitted);
        }
    }

    // =========================================================================
    // Fold
    // =========================================================================

    /// Apply one action. The only code path that writes state.
    async fn apply(&mut self, envelope: Envelope<M>) {
        let Envelope {
            lane,
            action,
            guard,
            ack,
        } = envelope;

        if guard.as_ref().is_some_and(|g| !g.is_current()) {
            // Dropping the ack tells the handler it was cancelled
            tracing::debug!(lane, "Discarding action from superseded handler");
            return;
        }

        match action {
            Action::State(mutation) => {
                self.state.apply(|state| M::reduce(state, mutation));
            }
            Action::Effect(effect) => {
                if !self.config.enable_effects {
                    tracing::debug!(lane, "Effects disabled, effect dropped");
                } else if self.effects.publish(effect) == 0 {
                    tracing::debug!(lane, "No effect observers, effect dropped");
                }
            }
            Action::Event(event) => {
                if self.config.enable_events {
                    tokio::select! {
                        biased;

                        _ = self.scope.cancelled() => {
                            // The run loop sees the ended scope next
                            tracing::debug!(lane, "Scope ended during event dispatch");
                            return;
                        }
                        _ = self.sink.dispatch(event) => {}
                    }
                } else {
                    tracing::debug!(lane, "Events disabled, event dropped");
                }
            }
        }

        let _ = ack.send(());
    }
}
