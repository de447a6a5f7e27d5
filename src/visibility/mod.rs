//! Visibility-driven triggering for lazily registered components.
//!
//! A [`VisibilitySource`] wraps the host's viewport-intersection facility and
//! reports raw entries through a [`VisibilitySink`]. The [`VisibilityTracker`]
//! turns those reports into one-shot "became visible" candidates, taken at most
//! one per coalesced check.

mod manual;
mod source;
mod tracker;

pub use manual::ManualVisibilitySource;
pub use source::{IntersectionEntry, ObserveOptions, VisibilityError, VisibilitySink, VisibilitySource};
pub use tracker::VisibilityTracker;
