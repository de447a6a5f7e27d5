//! Background preloading in priority order.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::coordinator::{Begin, LoadCoordinator};
use super::priority::PriorityQueue;
use crate::node::ComponentId;
use crate::telemetry;

#[derive(Default)]
struct PreloadQueue {
    items: PriorityQueue<ComponentId>,
    members: HashSet<ComponentId>,
}

/// Priority-ordered queue of ids awaiting background loading.
///
/// Each id is held at most once; it leaves the queue before its load begins.
pub struct PreloadScheduler {
    queue: Mutex<PreloadQueue>,
}

impl PreloadScheduler {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(PreloadQueue::default()),
        }
    }

    /// Queue `id` unless it is already queued. Returns true if inserted.
    pub fn push(&self, id: ComponentId, priority: i32) -> bool {
        let depth = {
            let mut queue = self.queue.lock();
            if !queue.members.insert(id.clone()) {
                return false;
            }
            queue.items.push(id, priority);
            queue.items.len()
        };
        telemetry::record_preload_depth(depth);
        true
    }

    /// Remove and return the highest-priority id.
    pub fn pop(&self) -> Option<ComponentId> {
        let (id, depth) = {
            let mut queue = self.queue.lock();
            let id = queue.items.pop()?;
            queue.members.remove(&id);
            (id, queue.items.len())
        };
        telemetry::record_preload_depth(depth);
        Some(id)
    }

    /// Drop `id` from the queue. Returns true if it was queued.
    pub fn remove(&self, id: &str) -> bool {
        let mut queue = self.queue.lock();
        if !queue.members.remove(id) {
            return false;
        }
        queue.items.retain(|queued| queued.as_str() != id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.queue.lock().members.contains(id)
    }

    pub fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.items.len();
        queue.items.clear();
        queue.members.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.queue.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().items.is_empty()
    }

    /// Hand at most one queued id to the coordinator.
    ///
    /// Ids that became loaded or loading through another path are skipped.
    pub fn pump(&self, coordinator: &Arc<LoadCoordinator>) -> Option<ComponentId> {
        while let Some(id) = self.pop() {
            if coordinator.is_busy(id.as_str()) {
                tracing::debug!(component_id = %id, "preload skipped, already loaded or loading");
                continue;
            }
            match coordinator.begin(id.as_str()) {
                Begin::Unknown => continue,
                Begin::Ready(_) | Begin::Pending(_) | Begin::NoRuntime => {
                    tracing::debug!(component_id = %id, "preload dispatched");
                    return Some(id);
                }
            }
        }
        None
    }
}

impl Default for PreloadScheduler {
    fn default() -> Self {
        Self::new()
    }
}
