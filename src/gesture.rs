//! Swipe detection for the touchscreen.
//!
//! A horizontal drag further than [`DRAG_THRESHOLD`] becomes a navigation
//! intent: dragging right goes to the previous page, dragging left to the next.
//! After a trigger the origin moves to the current pointer position, so one long
//! drag can flip several pages.

use crate::pages::NavIntent;

/// Minimum horizontal travel, exclusive. A delta of exactly ±100 does not trigger.
pub const DRAG_THRESHOLD: i32 = 100;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GestureRouter {
    origin_x: Option<i32>,
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Origin of the drag in progress.
    pub fn origin_x(&self) -> Option<i32> {
        self.origin_x
    }

    pub fn on_drag_start(&mut self, x: i32) {
        self.origin_x = Some(x);
    }

    /// Returns an intent when the drag crossed the threshold since the origin.
    /// Moves without an active drag are ignored.
    pub fn on_drag_move(&mut self, x: i32) -> Option<NavIntent> {
        let origin = self.origin_x?;
        let delta = x - origin;

        let intent = if delta > DRAG_THRESHOLD {
            NavIntent::Previous
        } else if delta < -DRAG_THRESHOLD {
            NavIntent::Next
        } else {
            return None;
        };

        self.origin_x = Some(x);
        Some(intent)
    }

    pub fn on_drag_end(&mut self) {
        self.origin_x = None;
    }
}
