//! Event sinks.
//!
//! Event actions leave the reactive pipeline here. A sink decides where the
//! operation runs: inline on the driver (`RunDeferred`), on another context
//! through a channel (`ChannelSink`), or nowhere (`DiscardEvents`).

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// Consumer of event actions.
///
/// `dispatch` is awaited by the container before the next action is applied,
/// so events run exactly once and in the order they were produced.
#[async_trait]
pub trait EventSink<E>: Send + Sync
where
    E: Send + 'static,
{
    async fn dispatch(&self, event: E);
}

// =============================================================================
// DiscardEvents
// =============================================================================

/// Sink used when no sink is attached. Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardEvents;

#[async_trait]
impl<E> EventSink<E> for DiscardEvents
where
    E: Send + 'static,
{
    async fn dispatch(&self, _event: E) {
        tracing::debug!("No event sink attached, event dropped");
    }
}

// =============================================================================
// ChannelSink
// =============================================================================

/// Forwards events to a receiver owned by another execution context.
///
/// Use this when the operation must run on a specific thread (e.g. the one
/// owning the UI): that thread drains the receiver and performs the work.
pub struct ChannelSink<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> ChannelSink<E> {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl<E> EventSink<E> for ChannelSink<E>
where
    E: Send + 'static,
{
    async fn dispatch(&self, event: E) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Event receiver dropped, event discarded");
        }
    }
}

// =============================================================================
// Deferred
// =============================================================================

/// An event expressed as a deferred async operation.
pub struct Deferred(Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>);

impl Deferred {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Box::new(move || Box::pin(f())))
    }

    /// Run the operation. Consumes it, so it can only run once.
    pub async fn run(self) {
        (self.0)().await
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// Runs `Deferred` events inline on the container driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunDeferred;

#[async_trait]
impl EventSink<Deferred> for RunDeferred {
    async fn dispatch(&self, event: Deferred) {
        event.run().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.dispatch("first").await;
        sink.dispatch("second").await;

        assert_eq!(rx.recv().await, Some("first"));
        assert_eq!(rx.recv().await, Some("second"));
    }

    #[tokio::test]
    async fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        // Must not panic
        sink.dispatch(1u8).await;
    }

    #[tokio::test]
    async fn test_run_deferred_runs_once() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let event = Deferred::new(move || async move {
            *counter.lock() += 1;
        });

        RunDeferred.dispatch(event).await;
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_discard_events() {
        DiscardEvents.dispatch(42u32).await;
    }
}
