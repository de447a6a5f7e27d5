//! Load scheduling: lifecycle coordination, preloading and coalesced checks.

mod coalesce;
mod coordinator;
mod driver;
mod preload;
mod priority;
mod state;

pub use coalesce::Coalescer;
pub use coordinator::{Begin, LoadCoordinator, LoadHandle, StateCounts};
pub use driver::{spawn_driver, Pump, TickOutcome};
pub use preload::PreloadScheduler;
pub use priority::{PrioritizedItem, PriorityQueue};
pub use state::{LoadEvent, LoadState};
