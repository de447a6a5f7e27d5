//! Coalesced background checks.
//!
//! The driver waits for the coalescer to be armed, sleeps one window, then runs
//! one tick: at most one visibility candidate and at most one preload.

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::coalesce::Coalescer;
use super::coordinator::LoadCoordinator;
use super::preload::PreloadScheduler;
use crate::node::ComponentId;
use crate::telemetry;
use crate::visibility::VisibilityTracker;

/// What one tick dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickOutcome {
    /// Id whose first qualifying visibility report triggered a load.
    pub visible: Option<ComponentId>,
    /// Id handed to the coordinator by the preload queue.
    pub preloaded: Option<ComponentId>,
    /// Work remains for a later tick.
    pub more_pending: bool,
}

/// The bounded unit of work run once per coalescing window.
#[derive(Clone)]
pub struct Pump {
    coordinator: Arc<LoadCoordinator>,
    tracker: Arc<VisibilityTracker>,
    preloader: Arc<PreloadScheduler>,
}

impl Pump {
    pub fn new(
        coordinator: Arc<LoadCoordinator>,
        tracker: Arc<VisibilityTracker>,
        preloader: Arc<PreloadScheduler>,
    ) -> Self {
        Self {
            coordinator,
            tracker,
            preloader,
        }
    }

    pub fn tick(&self) -> TickOutcome {
        let visible = self.tracker.take_candidate();
        if let Some(id) = &visible {
            tracing::debug!(component_id = %id, "became visible");
            telemetry::record_visibility_trigger();
            self.coordinator.begin(id.as_str());
        }

        let preloaded = self.preloader.pump(&self.coordinator);

        TickOutcome {
            visible,
            preloaded,
            more_pending: self.tracker.has_pending() || !self.preloader.is_empty(),
        }
    }
}

/// Spawn the driver loop on `runtime`. Cancel `shutdown` to stop it.
pub fn spawn_driver(
    runtime: &Handle,
    pump: Pump,
    coalescer: Arc<Coalescer>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        driver_loop(&pump, &coalescer, shutdown).await;
    })
}

async fn driver_loop(pump: &Pump, coalescer: &Coalescer, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            () = coalescer.armed() => {}
        }
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            () = tokio::time::sleep(coalescer.window()) => {}
        }

        coalescer.disarm();
        let outcome = pump.tick();
        if outcome.more_pending {
            coalescer.arm();
        }
    }
    tracing::info!("driver: shutdown signal received");
}
