//! Action and routing types.

/// Default number of concurrent handlers for a merge lane.
pub const DEFAULT_MERGE_LIMIT: usize = 16;

/// Unit of output produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<Mu, Ef, Ev> {
    /// Folded into the current state by `Model::reduce`.
    State(Mu),

    /// One-shot notification for attached effect observers. Never replayed.
    Effect(Ef),

    /// Imperative operation run once by the event sink.
    Event(Ev),
}

/// Composition policy for intents that share a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// A new intent cancels the in-flight handler of the lane.
    Latest,

    /// Intents run one at a time, in arrival order.
    Concat,

    /// Up to `limit` handlers run concurrently. A limit of `0` uses the
    /// container's `default_merge_limit`.
    Merge { limit: usize },
}

impl Policy {
    /// Merge policy with the given concurrency limit.
    pub fn merge(limit: usize) -> Self {
        Policy::Merge { limit }
    }

    /// Resolve a merge limit of `0` against the container default.
    pub(crate) fn resolve(self, default_merge_limit: usize) -> Self {
        match self {
            Policy::Merge { limit: 0 } => Policy::Merge {
                limit: default_merge_limit.max(1),
            },
            other => other,
        }
    }

    /// Maximum number of handlers in flight for a lane.
    pub(crate) fn max_in_flight(self) -> usize {
        match self {
            Policy::Latest => usize::MAX,
            Policy::Concat => 1,
            Policy::Merge { limit } => limit.max(1),
        }
    }
}

/// Lane and policy an intent is dispatched to.
///
/// Lanes are usually one per intent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub lane: &'static str,
    pub policy: Policy,
}

impl Route {
    pub const fn latest(lane: &'static str) -> Self {
        Self {
            lane,
            policy: Policy::Latest,
        }
    }

    pub const fn concat(lane: &'static str) -> Self {
        Self {
            lane,
            policy: Policy::Concat,
        }
    }

    pub const fn merge(lane: &'static str, limit: usize) -> Self {
        Self {
            lane,
            policy: Policy::Merge { limit },
        }
    }
}
