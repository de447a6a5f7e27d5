//! The scheduler service object.
//!
//! Constructed explicitly with its collaborators; the background driver only
//! runs between [`Virtualizer::init`] and [`Virtualizer::dispose`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, TokioClock};
use crate::error::VirtualizerError;
use crate::node::Node;
use crate::placeholder::PlaceholderManager;
use crate::registry::{ComponentEntry, Registry};
use crate::scheduler::{
    spawn_driver, Coalescer, LoadCoordinator, LoadEvent, LoadState, PreloadScheduler, Pump,
    TickOutcome,
};
use crate::stats::SchedulerStats;
use crate::visibility::{VisibilitySource, VisibilityTracker};
use crate::VirtualizerConfig;

struct DriverHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Lazy-loading, visibility-driven component scheduler.
pub struct Virtualizer {
    config: VirtualizerConfig,
    registry: Arc<Registry>,
    tracker: Arc<VisibilityTracker>,
    placeholders: Arc<PlaceholderManager>,
    coordinator: Arc<LoadCoordinator>,
    preloader: Arc<PreloadScheduler>,
    coalescer: Arc<Coalescer>,
    runtime: Option<Handle>,
    driver: Mutex<Option<DriverHandle>>,
}

impl Virtualizer {
    /// Create a scheduler using the tokio clock.
    ///
    /// `visibility` is `None` when the runtime has no intersection facility; lazy
    /// registrations then load immediately.
    ///
    /// Constructions and the driver run on tokio. The runtime current at
    /// construction time is captured; without one, each operation looks for a
    /// current runtime when it needs to spawn, and a load that finds none is
    /// recorded as failed.
    pub fn new(config: VirtualizerConfig, visibility: Option<Arc<dyn VisibilitySource>>) -> Self {
        Self::with_clock(config, visibility, Arc::new(TokioClock))
    }

    pub fn with_clock(
        config: VirtualizerConfig,
        visibility: Option<Arc<dyn VisibilitySource>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let coalescer = Arc::new(Coalescer::new(config.debounce));
        let registry = Arc::new(Registry::new());
        let tracker = Arc::new(VisibilityTracker::new(
            visibility,
            config.observe,
            Arc::clone(&coalescer),
        ));
        let placeholders = Arc::new(PlaceholderManager::new(config.default_placeholder_height));
        let runtime = Handle::try_current().ok();
        let coordinator = Arc::new(LoadCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&tracker),
            Arc::clone(&placeholders),
            clock,
            runtime.clone(),
            config.event_capacity,
        ));

        Self {
            config,
            registry,
            tracker,
            placeholders,
            coordinator,
            preloader: Arc::new(PreloadScheduler::new()),
            coalescer,
            runtime,
            driver: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &VirtualizerConfig {
        &self.config
    }

    /// Start the coalescing driver. Returns false if it is already running or
    /// there is no tokio runtime to run it on.
    pub fn init(&self) -> bool {
        let mut driver = self.driver.lock();
        if driver.is_some() {
            return false;
        }
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            tracing::error!(error = %VirtualizerError::NoRuntime, "driver not started");
            return false;
        };

        let shutdown = CancellationToken::new();
        let task = spawn_driver(
            &runtime,
            self.pump(),
            Arc::clone(&self.coalescer),
            shutdown.clone(),
        );
        *driver = Some(DriverHandle { shutdown, task });
        tracing::info!(
            debounce_ms = self.config.debounce.as_millis() as u64,
            visibility = self.tracker.is_available(),
            "virtualizer initialized"
        );
        // Work queued before init gets its first check now.
        if self.tracker.has_pending() || !self.preloader.is_empty() {
            self.coalescer.arm();
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.driver.lock().is_some()
    }

    /// Stop the driver, drop all subscriptions and pending preloads.
    ///
    /// In-flight constructions run to completion; mounted nodes stay mounted.
    pub async fn dispose(&self) {
        let handle = self.driver.lock().take();
        if let Some(handle) = handle {
            handle.shutdown.cancel();
            if let Err(e) = handle.task.await {
                tracing::warn!(error = %e, "driver task ended abnormally");
            }
        }

        let unobserved = self.tracker.unobserve_all();
        self.coordinator.release_observing();
        let dropped = self.preloader.clear();
        tracing::info!(unobserved, dropped, "virtualizer disposed");
    }

    /// Register (or re-register) a component.
    ///
    /// Re-registering an id that is loaded or loading keeps the live instance;
    /// the new configuration applies on the next reload.
    pub fn register(&self, entry: ComponentEntry) {
        let (entry, previous) = self.registry.register(entry);
        if previous.is_some() {
            tracing::debug!(component_id = %entry.id, "registration replaced");
        }

        if let Some(kept) = self.coordinator.admit(&entry.id) {
            tracing::info!(
                component_id = %entry.id,
                state = ?kept,
                "re-registered live component, new configuration applies on next reload"
            );
            return;
        }
        if let Some(previous) = previous {
            self.placeholders
                .remove_for(previous.mount_target.as_ref(), previous.id.as_str());
        }

        if !entry.lazy {
            self.coordinator.begin(entry.id.as_str());
            return;
        }

        self.placeholders.attach(&entry);

        if !self.tracker.is_available() {
            tracing::info!(
                component_id = %entry.id,
                error = %VirtualizerError::VisibilityUnavailable,
                "loading lazy component eagerly"
            );
            self.coordinator.begin(entry.id.as_str());
            return;
        }

        if self.coordinator.mark_observing(&entry.id) {
            if let Err(e) = self.tracker.observe(&entry.id) {
                tracing::warn!(component_id = %entry.id, error = %e, "loading lazy component eagerly");
                self.coordinator.clear_observing(&entry.id);
                self.coordinator.begin(entry.id.as_str());
            }
        }
    }

    /// Remove a component entirely: node, subscription, queue slot, placeholder
    /// and registration. Refused while it is loading.
    pub fn unregister(&self, id: &str) -> bool {
        let Some(entry) = self.registry.get(id) else {
            tracing::warn!(error = %VirtualizerError::UnknownId(id.to_string()), "unregister ignored");
            return false;
        };
        if self.coordinator.state(id) == Some(LoadState::Loading) {
            tracing::warn!(component_id = %entry.id, "unregister refused while loading");
            return false;
        }

        if self.coordinator.is_loaded(id) {
            self.coordinator.unload(id);
        }
        self.tracker.unobserve(id);
        self.preloader.remove(id);
        self.placeholders.remove_for(entry.mount_target.as_ref(), id);
        if !self.coordinator.forget(id) {
            return false;
        }
        self.registry.remove(id);
        tracing::info!(component_id = %entry.id, "component unregistered");
        true
    }

    /// Obtain the realized node for `id`; `None` for unknown ids and failures.
    pub async fn load(&self, id: &str) -> Option<Node> {
        self.coordinator.load(id).await
    }

    /// Queue `id` for background loading, or load it now if `immediate`.
    pub fn preload(&self, id: &str, immediate: bool) {
        let Some(entry) = self.registry.get(id) else {
            tracing::warn!(error = %VirtualizerError::UnknownId(id.to_string()), "preload ignored");
            return;
        };
        if self.coordinator.is_busy(id) {
            return;
        }
        if immediate {
            self.coordinator.begin(id);
            return;
        }
        if self.preloader.push(entry.id.clone(), entry.priority) {
            tracing::debug!(component_id = %entry.id, priority = entry.priority, "preload queued");
            self.coalescer.arm();
        }
    }

    /// Detach the node for `id`; the next load reconstructs it.
    pub fn unload(&self, id: &str) -> bool {
        self.coordinator.unload(id)
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.coordinator.is_loaded(id)
    }

    pub fn get(&self, id: &str) -> Option<Node> {
        self.coordinator.get(id)
    }

    pub fn state(&self, id: &str) -> Option<LoadState> {
        self.coordinator.state(id)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn is_queued(&self, id: &str) -> bool {
        self.preloader.contains(id)
    }

    pub fn is_observing(&self, id: &str) -> bool {
        self.tracker.is_observing(id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoadEvent> {
        self.coordinator.subscribe()
    }

    /// Run one coalesced check now, independent of the driver.
    pub fn tick(&self) -> TickOutcome {
        self.pump().tick()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            registered: self.registry.len(),
            states: self.coordinator.state_counts(),
            preload_queued: self.preloader.len(),
            subscriptions: self.tracker.subscriptions(),
            constructions_started: self.coordinator.constructions_started(),
            constructions_failed: self.coordinator.constructions_failed(),
            visibility_available: self.tracker.is_available(),
            driver_running: self.is_running(),
        }
    }

    fn pump(&self) -> Pump {
        Pump::new(
            Arc::clone(&self.coordinator),
            Arc::clone(&self.tracker),
            Arc::clone(&self.preloader),
        )
    }
}

impl Drop for Virtualizer {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.get_mut().take() {
            handle.shutdown.cancel();
        }
    }
}
