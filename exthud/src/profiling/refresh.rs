//! Coalesced refresh trigger
//!
//! Status changes and new traces can arrive in bursts. Each one calls
//! [`CoalescedRefresh::trigger`]; the first trigger arms a deadline and the
//! rest are absorbed until the owning loop sees [`CoalescedRefresh::poll`]
//! return `true` once the deadline passes. At most one refresh is pending at
//! any time.

use std::time::{Duration, Instant};

/// Default coalescing window
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct CoalescedRefresh {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for CoalescedRefresh {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_DELAY)
    }
}

impl CoalescedRefresh {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Request a refresh. No-op if one is already pending.
    pub fn trigger(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending refresh is due, if any
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` exactly once per armed deadline, when it has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            Some(_) | None => false,
        }
    }
}
