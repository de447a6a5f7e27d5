//! Deterministic visibility source driven by explicit calls.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::source::{IntersectionEntry, ObserveOptions, VisibilityError, VisibilitySink, VisibilitySource};
use crate::node::ComponentId;

#[derive(Default)]
struct ManualState {
    observed: HashMap<ComponentId, (ObserveOptions, VisibilitySink)>,
    observe_calls: HashMap<ComponentId, usize>,
    unobserve_calls: HashMap<ComponentId, usize>,
}

/// Synthetic source: the host (or a test) decides when containers intersect.
pub struct ManualVisibilitySource {
    supported: bool,
    state: Mutex<ManualState>,
}

impl ManualVisibilitySource {
    pub fn new() -> Self {
        Self {
            supported: true,
            state: Mutex::new(ManualState::default()),
        }
    }

    /// A source reporting that the runtime has no intersection facility.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Report `id` as intersecting with the given visible fraction.
    ///
    /// Returns false if `id` is not observed.
    pub fn reveal(&self, id: &str, ratio: f32) -> bool {
        let sink = match self.state.lock().observed.get(id) {
            Some((_, sink)) => sink.clone(),
            None => return false,
        };
        sink.report(IntersectionEntry::new(id, ratio));
        true
    }

    /// Report `id` as scrolled out of view.
    pub fn hide(&self, id: &str) -> bool {
        self.reveal(id, 0.0)
    }

    pub fn is_observing(&self, id: &str) -> bool {
        self.state.lock().observed.contains_key(id)
    }

    pub fn options_for(&self, id: &str) -> Option<ObserveOptions> {
        self.state.lock().observed.get(id).map(|(options, _)| *options)
    }

    pub fn observed_ids(&self) -> Vec<ComponentId> {
        let mut ids: Vec<_> = self.state.lock().observed.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn observe_count(&self, id: &str) -> usize {
        self.state.lock().observe_calls.get(id).copied().unwrap_or(0)
    }

    pub fn unobserve_count(&self, id: &str) -> usize {
        self.state.lock().unobserve_calls.get(id).copied().unwrap_or(0)
    }
}

impl Default for ManualVisibilitySource {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilitySource for ManualVisibilitySource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn observe(
        &self,
        id: &ComponentId,
        options: &ObserveOptions,
        sink: VisibilitySink,
    ) -> Result<(), VisibilityError> {
        if !self.supported {
            return Err(VisibilityError::Unsupported);
        }
        let mut state = self.state.lock();
        *state.observe_calls.entry(id.clone()).or_insert(0) += 1;
        state.observed.insert(id.clone(), (*options, sink));
        Ok(())
    }

    fn unobserve(&self, id: &ComponentId) {
        let mut state = self.state.lock();
        if state.observed.remove(id).is_some() {
            *state.unobserve_calls.entry(id.clone()).or_insert(0) += 1;
        }
    }
}
