//! Timer-armed pending-work flag.
//!
//! Viewport reports and preload requests arm the flag; the driver waits for it,
//! sleeps one window, disarms and runs a single check. Any number of arms within
//! a window collapse into that one check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

pub struct Coalescer {
    armed: AtomicBool,
    notify: Notify,
    window: Duration,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            armed: AtomicBool::new(false),
            notify: Notify::new(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Request a check. Returns true if this call armed the flag.
    pub fn arm(&self) -> bool {
        if self.armed.swap(true, Ordering::AcqRel) {
            return false;
        }
        // notify_one stores a permit when nobody is waiting yet.
        self.notify.notify_one();
        true
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub(crate) fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub(crate) async fn armed(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_collapses() {
        let coalescer = Coalescer::new(Duration::from_millis(50));
        assert!(coalescer.arm());
        assert!(!coalescer.arm());
        assert!(coalescer.is_armed());

        coalescer.disarm();
        assert!(!coalescer.is_armed());
        assert!(coalescer.arm());
    }

    #[tokio::test]
    async fn test_arm_before_wait_is_not_lost() {
        let coalescer = Coalescer::new(Duration::from_millis(50));
        coalescer.arm();
        tokio::time::timeout(Duration::from_secs(1), coalescer.armed())
            .await
            .expect("stored permit wakes the waiter");
    }

    #[test]
    fn test_waiter_pending_until_armed() {
        let coalescer = Coalescer::new(Duration::from_millis(50));
        let mut waiter = tokio_test::task::spawn(coalescer.armed());
        tokio_test::assert_pending!(waiter.poll());

        coalescer.arm();
        assert!(waiter.is_woken());
        tokio_test::assert_ready!(waiter.poll());
    }
}
