//! Point-in-time scheduler statistics.

use serde::Serialize;

use crate::scheduler::StateCounts;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub registered: usize,
    pub states: StateCounts,
    pub preload_queued: usize,
    pub subscriptions: usize,
    pub constructions_started: u64,
    pub constructions_failed: u64,
    pub visibility_available: bool,
    pub driver_running: bool,
}

impl SchedulerStats {
    /// No construction is in flight and nothing waits in the preload queue.
    pub fn is_settled(&self) -> bool {
        self.states.loading == 0 && self.preload_queued == 0
    }
}
