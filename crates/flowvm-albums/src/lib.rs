//! Album search screen for the flowvm state container.
//!
//! This crate wires a music-album search screen onto `flowvm-core`:
//! - Album and search result entities
//! - The `AlbumService` data boundary and an in-memory catalog
//! - The screen contract (intents, state, effects, navigation events)
//! - `AlbumScreen`, the model plugged into the container
//! - Demo configuration

pub mod config;
pub mod contract;
pub mod entity;
pub mod error;
pub mod screen;
pub mod service;

// Re-export commonly used types
pub use config::DemoConfig;
pub use contract::{NavEvent, Screen, SearchIntent, SearchMutation, SearchState, ViewEffect};
pub use entity::{Album, AlbumSummary, Cover, SearchAlbums, SearchResults, Titles};
pub use error::{ConfigError, ScreenError, ServiceError};
pub use screen::{album_detail, album_results, query_intents, query_settled, AlbumScreen};
pub use service::{sample_catalog, AlbumService, CatalogEntry, CatalogService};
