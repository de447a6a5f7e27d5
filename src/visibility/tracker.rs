//! One-shot visibility tracking per component id.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use super::source::{ObserveOptions, VisibilityError, VisibilitySink, VisibilitySource};
use crate::node::ComponentId;
use crate::scheduler::Coalescer;

/// Tracks active subscriptions and qualifying candidates.
///
/// A subscription is removed exactly once through [`VisibilityTracker::unobserve`];
/// reports for ids that are no longer observed are dropped.
pub struct VisibilityTracker {
    source: Option<Arc<dyn VisibilitySource>>,
    options: ObserveOptions,
    observed: Mutex<HashSet<ComponentId>>,
    candidates: Mutex<VecDeque<ComponentId>>,
    sink: VisibilitySink,
}

impl VisibilityTracker {
    pub fn new(
        source: Option<Arc<dyn VisibilitySource>>,
        options: ObserveOptions,
        coalescer: Arc<Coalescer>,
    ) -> Self {
        Self {
            source,
            options,
            observed: Mutex::new(HashSet::new()),
            candidates: Mutex::new(VecDeque::new()),
            sink: VisibilitySink::new(coalescer),
        }
    }

    /// False when there is no intersection facility to rely on.
    pub fn is_available(&self) -> bool {
        self.source.as_ref().map_or(false, |s| s.is_supported())
    }

    pub fn options(&self) -> &ObserveOptions {
        &self.options
    }

    /// Subscribe `id` to visibility reports.
    pub fn observe(&self, id: &ComponentId) -> Result<(), VisibilityError> {
        let source = match &self.source {
            Some(source) if source.is_supported() => Arc::clone(source),
            _ => return Err(VisibilityError::Unsupported),
        };

        if !self.observed.lock().insert(id.clone()) {
            return Ok(());
        }

        if let Err(e) = source.observe(id, &self.options, self.sink.clone()) {
            self.observed.lock().remove(id);
            return Err(e);
        }
        tracing::debug!(component_id = %id, "visibility subscription started");
        Ok(())
    }

    /// Remove the subscription for `id`. Returns false if there was none.
    pub fn unobserve(&self, id: &str) -> bool {
        let removed = self.observed.lock().take(id);
        let Some(id) = removed else {
            return false;
        };

        self.candidates.lock().retain(|c| c != &id);
        if let Some(source) = &self.source {
            source.unobserve(&id);
        }
        tracing::debug!(component_id = %id, "visibility subscription removed");
        true
    }

    pub fn is_observing(&self, id: &str) -> bool {
        self.observed.lock().contains(id)
    }

    pub fn subscriptions(&self) -> usize {
        self.observed.lock().len()
    }

    /// Fold pending reports into candidates and take at most one.
    ///
    /// The returned id stays subscribed until the load coordinator moves it to
    /// `Loading`.
    pub fn take_candidate(&self) -> Option<ComponentId> {
        let reports = self.sink.drain();
        let observed = self.observed.lock();
        let mut candidates = self.candidates.lock();

        for entry in reports {
            if entry.qualifies(&self.options)
                && observed.contains(&entry.id)
                && !candidates.contains(&entry.id)
            {
                candidates.push_back(entry.id);
            }
        }

        while let Some(id) = candidates.pop_front() {
            if observed.contains(&id) {
                return Some(id);
            }
        }
        None
    }

    /// Whether a later check has work left.
    pub fn has_pending(&self) -> bool {
        self.sink.has_reports() || !self.candidates.lock().is_empty()
    }

    /// Drop every subscription (used on dispose).
    pub fn unobserve_all(&self) -> usize {
        let ids: Vec<ComponentId> = self.observed.lock().iter().cloned().collect();
        ids.iter().filter(|id| self.unobserve(id.as_str())).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::{IntersectionEntry, ManualVisibilitySource};
    use std::time::Duration;

    fn tracker(source: Arc<ManualVisibilitySource>) -> VisibilityTracker {
        let coalescer = Arc::new(Coalescer::new(Duration::from_millis(10)));
        VisibilityTracker::new(Some(source), ObserveOptions::default(), coalescer)
    }

    #[test]
    fn test_no_source_is_unavailable() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_millis(10)));
        let tracker = VisibilityTracker::new(None, ObserveOptions::default(), coalescer);
        assert!(!tracker.is_available());
        assert_eq!(
            tracker.observe(&ComponentId::new("a")),
            Err(VisibilityError::Unsupported)
        );
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let source = Arc::new(ManualVisibilitySource::new());
        let tracker = tracker(source.clone());
        tracker.observe(&ComponentId::new("a")).unwrap();

        source.reveal("a", 0.05);
        assert_eq!(tracker.take_candidate(), None);

        source.reveal("a", 0.5);
        assert_eq!(tracker.take_candidate(), Some(ComponentId::new("a")));
    }

    #[test]
    fn test_one_candidate_per_check() {
        let source = Arc::new(ManualVisibilitySource::new());
        let tracker = tracker(source.clone());
        for id in ["a", "b", "c"] {
            tracker.observe(&ComponentId::new(id)).unwrap();
            source.reveal(id, 1.0);
        }

        assert_eq!(tracker.take_candidate(), Some(ComponentId::new("a")));
        assert!(tracker.unobserve("a"));
        assert!(tracker.has_pending());
        assert_eq!(tracker.take_candidate(), Some(ComponentId::new("b")));
    }

    #[test]
    fn test_duplicate_reports_queue_once() {
        let source = Arc::new(ManualVisibilitySource::new());
        let tracker = tracker(source.clone());
        tracker.observe(&ComponentId::new("a")).unwrap();
        source.reveal("a", 1.0);
        source.reveal("a", 1.0);

        assert_eq!(tracker.take_candidate(), Some(ComponentId::new("a")));
        tracker.unobserve("a");
        assert_eq!(tracker.take_candidate(), None);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_unobserve_happens_once() {
        let source = Arc::new(ManualVisibilitySource::new());
        let tracker = tracker(source.clone());
        tracker.observe(&ComponentId::new("a")).unwrap();

        assert!(tracker.unobserve("a"));
        assert!(!tracker.unobserve("a"));
        assert_eq!(source.unobserve_count("a"), 1);
        assert!(!source.is_observing("a"));
    }

    #[test]
    fn test_reports_for_unobserved_are_dropped() {
        let source = Arc::new(ManualVisibilitySource::new());
        let tracker = tracker(source);
        tracker.sink.report(IntersectionEntry::new("ghost", 1.0));
        assert_eq!(tracker.take_candidate(), None);
    }
}
