//! # Periodic Timers
//!
//! The panel runs three periodic jobs on one cooperative loop: the clock tick,
//! the data refresh and page rotation. Each is a [`PeriodicTask`], a deadline
//! that re-arms itself every time it fires until it is stopped.
//!
//! Timers never read a clock themselves. Every call takes `now` as a
//! [`Duration`] since the loop started, so tests can drive time by hand and the
//! real loop can feed it from `tokio::time::Instant`.
//!
//! ## Guarantees
//! - **Single pending deadline**: `start` while armed replaces the old deadline
//! - **Self re-arming**: a fired task schedules its next deadline before returning
//! - **Idempotent stop**: stopping an unarmed task does nothing

use std::time::Duration;

/// A self re-arming deadline with a fixed interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodicTask {
    interval: Duration,
    deadline: Option<Duration>,
}

/// The page rotation timer is a plain periodic task.
pub type RotationTimer = PeriodicTask;

impl PeriodicTask {
    /// Create a stopped task. A zero interval is bumped to 1 ms so a fired
    /// task can never be due again in the same turn.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            deadline: None,
        }
    }

    /// Change the interval. Takes effect on the next `start`.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    /// Arm the task to fire one full interval after `now`, replacing any
    /// pending deadline.
    pub fn start(&mut self, now: Duration) {
        self.deadline = Some(now + self.interval);
    }

    /// Cancel the pending deadline, if any.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the task will next fire.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Fire at most once if due. Returns true when the task fired; the next
    /// deadline is then one interval after the one that just passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = Some(deadline + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Fire as many times as the task is overdue, returning the count.
    ///
    /// A loop that stalled for several intervals catches up one firing per
    /// missed deadline instead of skipping them.
    pub fn poll_all(&mut self, now: Duration) -> u32 {
        let mut fired = 0;
        while self.poll(now) {
            fired += 1;
        }
        fired
    }
}
