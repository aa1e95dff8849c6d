//! Error types for the state container.

use thiserror::Error;

/// Boxed error carried by failed handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Container errors - returned to callers of the public API.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The hosting scope ended; intents are no longer accepted.
    #[error("State container terminated")]
    Terminated,
}

/// Why a handler stopped producing actions early.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Superseded by a newer intent of the same lane, or the scope ended.
    /// Never surfaced to the user.
    #[error("Handler cancelled")]
    Cancelled,

    /// Recoverable failure inside the handler (service call, parsing, ...).
    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl HandlerError {
    /// Wrap any error as a recoverable handler failure.
    pub fn failed<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Failed(error.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type returned by handlers and emitters.
pub type HandlerResult = Result<(), HandlerError>;
