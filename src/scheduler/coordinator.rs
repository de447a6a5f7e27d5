//! Load coordinator: the per-id lifecycle state machine.
//!
//! All state and cache mutation goes through this type. A single mutex guards
//! the per-id slots and is never held across an await, so the transition into
//! `Loading` and the installation of the shared completion handle are atomic:
//! at most one construction per id can be in flight.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::Instrument;

use super::state::{LoadEvent, LoadState};
use crate::clock::Clock;
use crate::error::VirtualizerError;
use crate::mount::MountTarget;
use crate::node::{ComponentId, Node};
use crate::placeholder::PlaceholderManager;
use crate::registry::{ComponentEntry, CreateError, Registry};
use crate::telemetry::{self, LoadSpan, SpanExt};
use crate::visibility::VisibilityTracker;

/// Completion handle shared by every caller waiting on one attempt.
pub type LoadHandle = Shared<BoxFuture<'static, Option<Node>>>;

#[derive(Default)]
struct Slot {
    state: LoadState,
    node: Option<Node>,
    /// Container the node was appended to, which may differ from the current entry's.
    mounted_on: Option<Arc<dyn MountTarget>>,
    in_flight: Option<LoadHandle>,
}

/// Outcome of asking the coordinator to start a load.
pub enum Begin {
    /// No registry entry for the id.
    Unknown,
    /// Already loaded; the cached node.
    Ready(Node),
    /// A construction is in flight (possibly just started).
    Pending(LoadHandle),
    /// No tokio runtime to run the construction on; recorded as a failure.
    NoRuntime,
}

/// Number of ids in each state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub registered: usize,
    pub observing: usize,
    pub loading: usize,
    pub loaded: usize,
    pub failed: usize,
    pub unloaded: usize,
}

pub struct LoadCoordinator {
    registry: Arc<Registry>,
    tracker: Arc<VisibilityTracker>,
    placeholders: Arc<PlaceholderManager>,
    clock: Arc<dyn Clock>,
    runtime: Option<Handle>,
    slots: Mutex<HashMap<ComponentId, Slot>>,
    events: broadcast::Sender<LoadEvent>,
    started: AtomicU64,
    failed: AtomicU64,
}

impl LoadCoordinator {
    pub fn new(
        registry: Arc<Registry>,
        tracker: Arc<VisibilityTracker>,
        placeholders: Arc<PlaceholderManager>,
        clock: Arc<dyn Clock>,
        runtime: Option<Handle>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            registry,
            tracker,
            placeholders,
            clock,
            runtime,
            slots: Mutex::new(HashMap::new()),
            events,
            started: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoadEvent> {
        self.events.subscribe()
    }

    /// Obtain the realized node for `id`, constructing it if needed.
    pub async fn load(self: &Arc<Self>, id: &str) -> Option<Node> {
        match self.begin(id) {
            Begin::Unknown | Begin::NoRuntime => None,
            Begin::Ready(node) => Some(node),
            Begin::Pending(handle) => handle.await,
        }
    }

    /// Start (or join) a load without waiting for it.
    pub fn begin(self: &Arc<Self>, id: &str) -> Begin {
        let Some(entry) = self.registry.get(id) else {
            tracing::warn!(error = %VirtualizerError::UnknownId(id.to_string()), "load ignored");
            return Begin::Unknown;
        };
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            return self.refuse_without_runtime(&entry);
        };

        let handle = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(entry.id.clone()).or_default();
            match slot.state {
                LoadState::Loaded => {
                    if let Some(node) = &slot.node {
                        return Begin::Ready(node.clone());
                    }
                }
                LoadState::Loading => {
                    if let Some(handle) = &slot.in_flight {
                        return Begin::Pending(handle.clone());
                    }
                }
                LoadState::Failed => {
                    tracing::debug!(component_id = %entry.id, "retrying after failure");
                    slot.state = LoadState::Registered;
                }
                _ => {}
            }

            tracing::debug!(component_id = %entry.id, from = ?slot.state, "-> Loading");
            slot.state = LoadState::Loading;
            slot.node = None;
            let _ = self.events.send(LoadEvent::Started { id: entry.id.clone() });

            let task = runtime.spawn(Arc::clone(self).construct(Arc::clone(&entry)));
            let handle: LoadHandle = async move { task.await.unwrap_or(None) }.boxed().shared();
            slot.in_flight = Some(handle.clone());
            handle
        };

        self.started.fetch_add(1, Ordering::Relaxed);
        telemetry::record_construction_started(id);
        // Leaving Observing removes the subscription.
        self.tracker.unobserve(id);
        Begin::Pending(handle)
    }

    fn refuse_without_runtime(&self, entry: &ComponentEntry) -> Begin {
        {
            let slots = self.slots.lock();
            if let Some(slot) = slots.get(entry.id.as_str()) {
                match (&slot.state, &slot.node, &slot.in_flight) {
                    (LoadState::Loaded, Some(node), _) => return Begin::Ready(node.clone()),
                    (LoadState::Loading, _, Some(handle)) => return Begin::Pending(handle.clone()),
                    _ => {}
                }
            }
        }
        self.fail(entry, CreateError::failed(VirtualizerError::NoRuntime.to_string()));
        Begin::NoRuntime
    }

    async fn construct(self: Arc<Self>, entry: Arc<ComponentEntry>) -> Option<Node> {
        let span = LoadSpan::new(entry.id.as_str());
        let inner_span = span.clone();
        async move {
            let started = self.clock.now();
            let result = AssertUnwindSafe(entry.creator.create())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(CreateError::Panicked(panic_message(panic.as_ref()))));
            inner_span.record_result(&result);

            match result {
                Ok(node) => {
                    let delayed = self.hold_for_minimum_display(&entry, started).await;
                    let latency = self.clock.now().saturating_duration_since(started);
                    inner_span.record("latency_ms", latency.as_millis() as u64);
                    inner_span.record("delayed_ms", delayed.as_millis() as u64);
                    telemetry::record_construction_succeeded(latency, delayed);
                    Some(self.mount(&entry, node))
                }
                Err(source) => {
                    self.fail(&entry, source);
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Sleep the remainder of the entry's minimum display time, if any.
    async fn hold_for_minimum_display(
        &self,
        entry: &ComponentEntry,
        started: tokio::time::Instant,
    ) -> Duration {
        let Some(minimum) = entry.minimum_display else {
            return Duration::ZERO;
        };
        let elapsed = self.clock.now().saturating_duration_since(started);
        if elapsed >= minimum {
            return Duration::ZERO;
        }
        let remaining = minimum - elapsed;
        self.clock.sleep(remaining).await;
        remaining
    }

    fn mount(&self, entry: &ComponentEntry, node: Node) -> Node {
        self.placeholders
            .remove_for(entry.mount_target.as_ref(), entry.id.as_str());
        entry.mount_target.append(node.clone());

        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(entry.id.clone()).or_default();
            slot.state = LoadState::Loaded;
            slot.node = Some(node.clone());
            slot.mounted_on = Some(Arc::clone(&entry.mount_target));
            slot.in_flight = None;
        }

        self.tracker.unobserve(entry.id.as_str());
        tracing::info!(component_id = %entry.id, node = node.id().get(), "component mounted");
        let _ = self.events.send(LoadEvent::Loaded {
            id: entry.id.clone(),
            node: node.id().get(),
        });
        node
    }

    fn fail(&self, entry: &ComponentEntry, source: CreateError) {
        let reason = source.to_string();
        let error = VirtualizerError::Construction {
            id: entry.id.to_string(),
            source,
        };
        tracing::error!(component_id = %entry.id, %error, "component construction failed");

        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(entry.id.clone()).or_default();
            slot.state = LoadState::Failed;
            slot.node = None;
            slot.mounted_on = None;
            slot.in_flight = None;
        }

        self.tracker.unobserve(entry.id.as_str());
        self.failed.fetch_add(1, Ordering::Relaxed);
        telemetry::record_construction_failed();
        let _ = self.events.send(LoadEvent::Failed {
            id: entry.id.clone(),
            reason,
        });
    }

    /// Detach the cached node so the next load reconstructs.
    ///
    /// Refused while a construction is in flight, since it cannot be cancelled.
    pub fn unload(&self, id: &str) -> bool {
        let Some(entry) = self.registry.get(id) else {
            tracing::warn!(error = %VirtualizerError::UnknownId(id.to_string()), "unload ignored");
            return false;
        };

        let (node, mounted_on) = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(entry.id.clone()).or_default();
            if slot.state == LoadState::Loading {
                tracing::warn!(component_id = %entry.id, "unload refused while loading");
                return false;
            }
            slot.state = LoadState::Unloaded;
            slot.in_flight = None;
            (slot.node.take(), slot.mounted_on.take())
        };

        if let (Some(node), Some(target)) = (&node, &mounted_on) {
            target.remove(node);
        }
        self.tracker.unobserve(id);
        tracing::info!(component_id = %entry.id, detached = node.is_some(), "component unloaded");
        let _ = self.events.send(LoadEvent::Unloaded { id: entry.id.clone() });
        true
    }

    /// Prepare `id` for a (re-)registration.
    ///
    /// Returns the state to keep if an instance is loaded or in flight; the new
    /// configuration then applies on the next reload. Otherwise resets the id to
    /// `Registered`, dropping any subscription, and returns `None`.
    pub fn admit(&self, id: &ComponentId) -> Option<LoadState> {
        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id.clone()).or_default();
            if slot.state.is_busy() {
                return Some(slot.state);
            }
            slot.state = LoadState::Registered;
        }
        self.tracker.unobserve(id.as_str());
        None
    }

    /// Registered -> Observing. Returns false if the id is in another state.
    pub fn mark_observing(&self, id: &ComponentId) -> bool {
        let mut slots = self.slots.lock();
        match slots.get_mut(id.as_str()) {
            Some(slot) if slot.state == LoadState::Registered => {
                slot.state = LoadState::Observing;
                true
            }
            _ => false,
        }
    }

    /// Observing -> Registered, after a failed subscription.
    pub fn clear_observing(&self, id: &ComponentId) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(id.as_str()) {
            if slot.state == LoadState::Observing {
                slot.state = LoadState::Registered;
            }
        }
    }

    /// Observing -> Registered for every id, after all subscriptions were dropped.
    pub fn release_observing(&self) -> usize {
        let mut slots = self.slots.lock();
        let mut released = 0;
        for slot in slots.values_mut() {
            if slot.state == LoadState::Observing {
                slot.state = LoadState::Registered;
                released += 1;
            }
        }
        released
    }

    /// Drop all state for `id`. Refused while loading.
    pub fn forget(&self, id: &str) -> bool {
        let mut slots = self.slots.lock();
        if slots.get(id).map_or(false, |s| s.state == LoadState::Loading) {
            return false;
        }
        slots.remove(id);
        true
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.state(id) == Some(LoadState::Loaded)
    }

    /// Loaded or loading.
    pub fn is_busy(&self, id: &str) -> bool {
        self.state(id).map_or(false, LoadState::is_busy)
    }

    pub fn get(&self, id: &str) -> Option<Node> {
        self.slots.lock().get(id).and_then(|s| s.node.clone())
    }

    pub fn state(&self, id: &str) -> Option<LoadState> {
        self.slots.lock().get(id).map(|s| s.state)
    }

    pub fn state_counts(&self) -> StateCounts {
        let slots = self.slots.lock();
        let mut counts = StateCounts::default();
        for slot in slots.values() {
            match slot.state {
                LoadState::Registered => counts.registered += 1,
                LoadState::Observing => counts.observing += 1,
                LoadState::Loading => counts.loading += 1,
                LoadState::Loaded => counts.loaded += 1,
                LoadState::Failed => counts.failed += 1,
                LoadState::Unloaded => counts.unloaded += 1,
            }
        }
        counts
    }

    pub fn constructions_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub fn constructions_failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
