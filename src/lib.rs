//! lazymount
//!
//! A lazy-loading, visibility-driven component scheduler. Expensive units are
//! constructed only when their container is about to become visible, at most one
//! construction runs per unit, background preloading follows priority order, and
//! units that resolve very fast can be held back to avoid flicker.
//!
//! # Components
//!
//! - **Registry**: id -> [`ComponentEntry`]
//! - **Visibility tracker**: one-shot "became visible" per id over a [`VisibilitySource`]
//! - **Placeholder manager**: skeleton nodes tagged with their owner
//! - **Load coordinator**: lifecycle state, in-flight dedup, minimum display time
//! - **Preload scheduler**: priority queue pumped one id per tick
//!
//! The host supplies the collaborators: a [`MountTarget`] per entry, an optional
//! [`VisibilitySource`] and a [`Clock`]. Logging goes through `tracing`.

pub mod clock;
pub mod config;
pub mod error;
pub mod mount;
pub mod node;
pub mod placeholder;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod telemetry;
pub mod visibility;

mod virtualizer;

use std::time::Duration;

pub use clock::{Clock, TokioClock};
pub use error::VirtualizerError;
pub use mount::{MemoryMountTarget, MountTarget};
pub use node::{ComponentId, Node, NodeId, NodeKind};
pub use placeholder::{
    Dimension, PlaceholderElement, PlaceholderFactory, PlaceholderManager, PlaceholderShape,
    PlaceholderSpec,
};
pub use registry::{ComponentEntry, CreateError, Creator, Registry};
pub use scheduler::{LoadEvent, LoadState, TickOutcome};
pub use stats::SchedulerStats;
pub use virtualizer::Virtualizer;
pub use visibility::{
    IntersectionEntry, ManualVisibilitySource, ObserveOptions, VisibilityError, VisibilitySink,
    VisibilitySource,
};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct VirtualizerConfig {
    /// Coalescing window for viewport reports and preload pumps.
    pub debounce: Duration,
    pub observe: ObserveOptions,
    /// Height of the placeholder used when an entry has no factory.
    pub default_placeholder_height: u32,
    /// Buffer size of the lifecycle event channel.
    pub event_capacity: usize,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            observe: ObserveOptions::default(),
            default_placeholder_height: 200,
            event_capacity: 64,
        }
    }
}
