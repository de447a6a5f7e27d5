//! Metrics recorded through the `metrics` facade.

use std::time::Duration;

use ::metrics::{counter, gauge, histogram};

pub fn record_construction_started(component_id: &str) {
    counter!("lazymount_constructions_started_total").increment(1);
    tracing::trace!(component_id, "construction started");
}

pub fn record_construction_succeeded(latency: Duration, delayed: Duration) {
    counter!("lazymount_constructions_total", "outcome" => "ok").increment(1);
    histogram!("lazymount_construction_seconds").record(latency.as_secs_f64());
    if !delayed.is_zero() {
        histogram!("lazymount_minimum_display_delay_seconds").record(delayed.as_secs_f64());
    }
}

pub fn record_construction_failed() {
    counter!("lazymount_constructions_total", "outcome" => "error").increment(1);
}

pub fn record_visibility_trigger() {
    counter!("lazymount_visibility_triggers_total").increment(1);
}

pub fn record_preload_depth(depth: usize) {
    gauge!("lazymount_preload_queue_depth").set(depth as f64);
}
