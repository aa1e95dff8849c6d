//! Container configuration.

use serde::{Deserialize, Serialize};

use crate::action::DEFAULT_MERGE_LIMIT;

/// Runtime options for a state container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name used in log spans.
    pub name: String,

    /// Concurrency used by merge lanes declared with a limit of `0`.
    pub default_merge_limit: usize,

    /// Publish effect actions to observers.
    pub enable_effects: bool,

    /// Run event actions through the event sink.
    pub enable_events: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "container".to_string(),
            default_merge_limit: DEFAULT_MERGE_LIMIT,
            enable_effects: true,
            enable_events: true,
        }
    }
}

impl ContainerConfig {
    /// Config with a custom span name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
