//! Error types for the album screen.

use std::time::Duration;
use thiserror::Error;

/// Data service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No album behind the given link.
    #[error("Album not found: {link}")]
    NotFound { link: String },

    /// Service could not answer.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Service did not answer in time.
    #[error("Service timeout after {duration:?}")]
    Timeout { duration: Duration },
}

/// Handler failures of the album screen - surfaced to the user as toasts.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("search failed for query: {query}")]
    Search {
        query: String,
        #[source]
        source: ServiceError,
    },

    #[error("album failed for link: {link}")]
    Album {
        link: String,
        #[source]
        source: ServiceError,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}
