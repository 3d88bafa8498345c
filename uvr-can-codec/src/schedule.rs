//! Periodic send timers
//!
//! A timer holds at most one pending deadline. Arming it again replaces the
//! pending deadline, so a timer never fires twice for the same period.

use std::time::{Duration, Instant};

/// One re-armable periodic deadline
#[derive(Debug, Clone, Default)]
pub struct PeriodicTimer {
    deadline: Option<Instant>,
}

impl PeriodicTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next expiry `interval` after `now`, cancelling any
    /// pending one.
    pub fn arm(&mut self, now: Instant, interval: Duration) {
        self.deadline = Some(now + interval);
    }

    /// Drop the pending expiry, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True if armed and the deadline has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}
