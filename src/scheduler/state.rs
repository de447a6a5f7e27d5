//! Per-id lifecycle states and the events emitted on transitions.

use serde::Serialize;

use crate::node::ComponentId;

/// Lifecycle stage of one registered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LoadState {
    #[default]
    Registered,
    /// Waiting for the container to become visible.
    Observing,
    /// Creator in flight; exactly one attempt exists.
    Loading,
    Loaded,
    /// Last attempt failed; the next load is a fresh attempt.
    Failed,
    /// Explicitly detached; the next load reconstructs.
    Unloaded,
}

impl LoadState {
    /// Loaded or loading: no new construction may start.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Loaded)
    }
}

/// Lifecycle notification broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoadEvent {
    Started { id: ComponentId },
    Loaded { id: ComponentId, node: u64 },
    Failed { id: ComponentId, reason: String },
    Unloaded { id: ComponentId },
}

impl LoadEvent {
    pub fn id(&self) -> &ComponentId {
        match self {
            Self::Started { id }
            | Self::Loaded { id, .. }
            | Self::Failed { id, .. }
            | Self::Unloaded { id } => id,
        }
    }
}
