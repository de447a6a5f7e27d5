//! Telemetry for the scheduler.
//!
//! Structured logging, load spans and metrics. The crate only emits through
//! `tracing` and the `metrics` facade; the host installs subscribers/recorders.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    record_construction_failed, record_construction_started, record_construction_succeeded,
    record_preload_depth, record_visibility_trigger,
};
pub use spans::{LoadSpan, SpanExt};
