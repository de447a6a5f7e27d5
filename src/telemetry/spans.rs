//! Span utilities for component loads.

use tracing::{info_span, Span};

/// Extension trait for recording outcomes into spans.
pub trait SpanExt {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for the span wrapping one construction attempt.
pub struct LoadSpan;

impl LoadSpan {
    /// Fields `status`, `error.message`, `latency_ms` and `delayed_ms` are
    /// filled in as the attempt progresses.
    pub fn new(component_id: &str) -> Span {
        info_span!(
            "component_load",
            component_id = %component_id,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
            delayed_ms = tracing::field::Empty,
        )
    }
}
