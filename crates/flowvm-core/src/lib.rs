//! Reactive state container for Model-View-Intent screens.
//!
//! This crate turns a stream of intents into a managed, observable state:
//! - `StateContainer` ingests intents and owns the single-writer state fold
//! - `Model` classifies intents into lanes and produces actions for them
//! - `Policy` decides how intents of one lane compose (latest, concat, merge)
//! - Effects fan out to attached observers without replay, events go to an
//!   `EventSink`
//!
//! ```text
//! submit(intent) ──→ route ──→ lane (policy) ──→ handler ──→ Action
//!                                                             │
//!               ┌───────────────┬─────────────────────────────┤
//!               ▼               ▼                             ▼
//!         State fold      Effect fan-out                EventSink
//!               │               │
//!        observe_state()  observe_effects()
//! ```

mod action;
mod config;
mod container;
mod effects;
mod emitter;
mod error;
mod model;
mod observable_state;
mod sink;
mod stream;

pub use action::{Action, Policy, Route, DEFAULT_MERGE_LIMIT};
pub use config::ContainerConfig;
pub use container::{ContainerBuilder, StateContainer};
pub use emitter::Emitter;
pub use error::{BoxError, ContainerError, HandlerError, HandlerResult};
pub use model::{Model, ModelAction};
pub use observable_state::ObservableState;
pub use sink::{ChannelSink, Deferred, DiscardEvents, EventSink, RunDeferred};
pub use stream::{distinct_until_changed, distinct_until_changed_by};
