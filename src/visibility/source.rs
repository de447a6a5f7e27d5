//! Visibility source capability and its reporting channel.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::node::ComponentId;
use crate::scheduler::Coalescer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisibilityError {
    #[error("Intersection observation is not supported by this runtime")]
    Unsupported,

    #[error("Failed to observe {id}: {reason}")]
    ObserveFailed { id: String, reason: String },
}

/// Intersection policy handed to the source for each observed container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    /// Margin around the viewport so construction starts slightly early.
    pub root_margin_px: u32,
    /// Minimum visible fraction (0.0..=1.0) for an entry to qualify.
    pub threshold: f32,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            root_margin_px: 100,
            threshold: 0.1,
        }
    }
}

/// Raw intersection report for one observed container.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: ComponentId,
    pub is_intersecting: bool,
    pub ratio: f32,
}

impl IntersectionEntry {
    pub fn new(id: impl Into<ComponentId>, ratio: f32) -> Self {
        Self {
            id: id.into(),
            is_intersecting: ratio > 0.0,
            ratio,
        }
    }

    pub fn qualifies(&self, options: &ObserveOptions) -> bool {
        self.is_intersecting && self.ratio >= options.threshold
    }
}

pub(crate) struct SinkShared {
    reports: Mutex<Vec<IntersectionEntry>>,
    coalescer: Arc<Coalescer>,
}

/// Where a source delivers raw intersection reports.
///
/// Reporting never runs a check inline; it only arms the coalescer.
#[derive(Clone)]
pub struct VisibilitySink {
    shared: Arc<SinkShared>,
}

impl VisibilitySink {
    pub(crate) fn new(coalescer: Arc<Coalescer>) -> Self {
        Self {
            shared: Arc::new(SinkShared {
                reports: Mutex::new(Vec::new()),
                coalescer,
            }),
        }
    }

    pub fn report(&self, entry: IntersectionEntry) {
        self.shared.reports.lock().push(entry);
        self.shared.coalescer.arm();
    }

    pub(crate) fn drain(&self) -> Vec<IntersectionEntry> {
        std::mem::take(&mut *self.shared.reports.lock())
    }

    pub(crate) fn has_reports(&self) -> bool {
        !self.shared.reports.lock().is_empty()
    }
}

/// Host capability wrapping viewport-intersection observation.
pub trait VisibilitySource: Send + Sync {
    /// Whether the runtime can observe intersections at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Start observing the container of `id`, reporting through `sink`.
    fn observe(
        &self,
        id: &ComponentId,
        options: &ObserveOptions,
        sink: VisibilitySink,
    ) -> Result<(), VisibilityError>;

    /// Stop observing `id`. Must be a no-op if it is not observed.
    fn unobserve(&self, id: &ComponentId);
}
