//! # Page Rotation Controller
//!
//! The panel shows one page at a time out of a fixed, ordered list. The
//! [`PageController`] owns that list, the visible index, the page-position
//! indicators (the dots along the bottom edge) and the auto-rotate timer.
//!
//! ## Navigation sources
//! - **Timer**: [`PageController::tick`] advances one page per expired interval
//! - **Buttons / keys / swipes**: [`PageController::navigate`] with a [`NavIntent`]
//!
//! Manual navigation never competes with the timer: it stops rotation, moves,
//! and restarts rotation with a fresh full interval. Pressing "next" 9 s into a
//! 10 s interval therefore schedules the following automatic advance 10 s later,
//! not 1 s later.
//!
//! ## Invariants
//! - At least one page exists (enforced by [`PageController::new`])
//! - Exactly one page is visible and exactly one indicator is active
//! - The visible index is always in `0..len()`

use crate::scheduler::RotationTimer;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default time each page stays on screen before auto-advance.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(10);

/// Errors raised by page navigation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The controller was built without pages
    #[error("page controller requires at least one page")]
    NoPages,

    /// `show_page` was asked for a page that does not exist
    #[error("page index {index} out of range (have {len} pages)")]
    OutOfRange { index: usize, len: usize },
}

/// Which series a chart page plots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Temperature,
    Humidity,
}

/// The typed render target a page owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    /// Big temperature, description and the detail grid
    Current,
    /// Five-day forecast row
    Forecast,
    /// Hourly line chart
    Chart(ChartKind),
}

/// One page of the rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    kind: PageKind,
    auto_refresh: bool,
    visible: bool,
}

impl Page {
    pub fn new(kind: PageKind, auto_refresh: bool) -> Self {
        Self {
            kind,
            auto_refresh,
            visible: false,
        }
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    /// Whether fresh data should redraw this page while it is visible.
    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// The standard page set: current conditions, forecast, temperature chart,
/// humidity chart.
pub fn default_pages() -> Vec<Page> {
    vec![
        Page::new(PageKind::Current, true),
        Page::new(PageKind::Forecast, true),
        Page::new(PageKind::Chart(ChartKind::Temperature), true),
        Page::new(PageKind::Chart(ChartKind::Humidity), true),
    ]
}

/// A discrete navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Previous,
    Show(usize),
}

/// The "show page K" side effect of a navigation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageChange {
    /// Page that was visible before the step
    pub previous: usize,
    /// Page that is visible now
    pub current: usize,
}

impl PageChange {
    /// False when the step re-showed the page that was already visible.
    pub fn moved(&self) -> bool {
        self.previous != self.current
    }
}

/// Owns the page list, the visible page and the auto-rotate timer.
#[derive(Debug)]
pub struct PageController {
    pages: Vec<Page>,
    current: usize,
    indicators: Vec<bool>,
    rotation: RotationTimer,
}

impl PageController {
    /// Build a controller showing page 0. Fails with [`PageError::NoPages`] for
    /// an empty list.
    pub fn new(pages: Vec<Page>) -> Result<Self, PageError> {
        if pages.is_empty() {
            return Err(PageError::NoPages);
        }
        let mut controller = Self {
            indicators: vec![false; pages.len()],
            pages,
            current: 0,
            rotation: RotationTimer::new(DEFAULT_ROTATION_INTERVAL),
        };
        controller.mark_visible(0);
        Ok(controller)
    }

    /// Append a page. The new page starts hidden and gets its own indicator.
    pub fn add_page(&mut self, mut page: Page) -> usize {
        page.visible = false;
        self.pages.push(page);
        self.indicators.push(false);
        self.pages.len() - 1
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> &Page {
        &self.pages[self.current]
    }

    /// Page-position indicators; exactly one entry is `true`.
    pub fn indicators(&self) -> &[bool] {
        &self.indicators
    }

    /// Show page `index`, hiding the previous one.
    ///
    /// Re-showing the visible page is allowed and still returns a change, so
    /// the caller redraws chart pages.
    pub fn show_page(&mut self, index: usize) -> Result<PageChange, PageError> {
        if index >= self.pages.len() {
            return Err(PageError::OutOfRange {
                index,
                len: self.pages.len(),
            });
        }
        let previous = self.current;
        self.pages[previous].visible = false;
        self.indicators[previous] = false;
        self.mark_visible(index);
        debug!("Showing page {} (was {})", index, previous);
        Ok(PageChange {
            previous,
            current: index,
        })
    }

    /// Advance one page, wrapping from the last page to page 0.
    pub fn next(&mut self) -> PageChange {
        let index = (self.current + 1) % self.pages.len();
        self.show_in_range(index)
    }

    /// Go back one page, wrapping from page 0 to the last page.
    pub fn previous(&mut self) -> PageChange {
        let len = self.pages.len();
        let index = (self.current + len - 1) % len;
        self.show_in_range(index)
    }

    /// Arm rotation to call [`next`](Self::next) every `interval` from `now`.
    /// Restarting while armed replaces the pending deadline.
    pub fn start_auto_rotate(&mut self, interval: Duration, now: Duration) {
        self.rotation.set_interval(interval);
        self.rotation.start(now);
    }

    /// Cancel rotation. Safe to call when rotation is not running.
    pub fn stop_auto_rotate(&mut self) {
        self.rotation.stop();
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.is_armed()
    }

    /// Deadline of the next automatic advance, if rotation is running.
    pub fn next_rotation(&self) -> Option<Duration> {
        self.rotation.deadline()
    }

    /// Advance once per expired rotation interval.
    ///
    /// Returns the combined change when at least one advance happened.
    pub fn tick(&mut self, now: Duration) -> Option<PageChange> {
        let fired = self.rotation.poll_all(now);
        if fired == 0 {
            return None;
        }
        let previous = self.current;
        for _ in 0..fired {
            self.next();
        }
        Some(PageChange {
            previous,
            current: self.current,
        })
    }

    /// Apply a user-initiated navigation.
    ///
    /// If rotation is running it is stopped before the move and restarted
    /// afterwards with a fresh full interval measured from `now`. A stopped
    /// rotation stays stopped.
    pub fn navigate(&mut self, intent: NavIntent, now: Duration) -> Result<PageChange, PageError> {
        let was_rotating = self.rotation.is_armed();
        self.rotation.stop();

        let result = match intent {
            NavIntent::Next => Ok(self.next()),
            NavIntent::Previous => Ok(self.previous()),
            NavIntent::Show(index) => self.show_page(index),
        };

        if was_rotating {
            self.rotation.start(now);
        }
        result
    }

    fn mark_visible(&mut self, index: usize) {
        self.current = index;
        self.pages[index].visible = true;
        self.indicators[index] = true;
    }

    fn show_in_range(&mut self, index: usize) -> PageChange {
        let previous = self.current;
        self.pages[previous].visible = false;
        self.indicators[previous] = false;
        self.mark_visible(index);
        PageChange {
            previous,
            current: index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn controller(n: usize) -> PageController {
        let pages = (0..n).map(|_| Page::new(PageKind::Current, false)).collect();
        PageController::new(pages).unwrap()
    }

    fn assert_single_visible(c: &PageController) {
        let visible = c.pages().iter().filter(|p| p.is_visible()).count();
        let active = c.indicators().iter().filter(|&&a| a).count();
        assert_eq!(visible, 1, "exactly one page should be visible");
        assert_eq!(active, 1, "exactly one indicator should be active");
        assert!(c.pages()[c.current_index()].is_visible());
        assert!(c.indicators()[c.current_index()]);
    }

    #[test]
    fn test_empty_page_list_is_rejected() {
        assert_eq!(PageController::new(vec![]).unwrap_err(), PageError::NoPages);
    }

    #[test]
    fn test_starts_on_first_page() {
        let c = controller(3);
        assert_eq!(c.current_index(), 0);
        assert_single_visible(&c);
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut c = controller(3);
        assert_eq!(c.previous().current, 2);
        assert_eq!(c.next().current, 0);
        assert_eq!(c.next().current, 1);
        assert_eq!(c.next().current, 2);
        assert_eq!(c.next().current, 0);
        assert_single_visible(&c);
    }

    #[test]
    fn test_index_stays_in_range_for_any_sequence() {
        for n in 1..=6 {
            let mut c = controller(n);
            let mut expected: i64 = 0;
            // Deterministic pseudo-random walk of next/previous calls
            let mut seed: u32 = 0x9E37_79B9 ^ n as u32;
            for _ in 0..200 {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                if seed >> 31 == 0 {
                    c.next();
                    expected += 1;
                } else {
                    c.previous();
                    expected -= 1;
                }
                assert!(c.current_index() < n);
                assert_eq!(c.current_index() as i64, expected.rem_euclid(n as i64));
                assert_single_visible(&c);
            }
        }
    }

    #[test]
    fn test_single_page_wraps_to_itself() {
        let mut c = controller(1);
        assert_eq!(c.next(), PageChange { previous: 0, current: 0 });
        assert_eq!(c.previous(), PageChange { previous: 0, current: 0 });
        assert_single_visible(&c);
    }

    #[test]
    fn test_show_page_out_of_range() {
        let mut c = controller(2);
        assert_eq!(
            c.show_page(2).unwrap_err(),
            PageError::OutOfRange { index: 2, len: 2 }
        );
        assert_eq!(c.current_index(), 0);
        assert_single_visible(&c);
    }

    #[test]
    fn test_show_same_page_is_idempotent() {
        let mut c = controller(3);
        c.show_page(1).unwrap();
        let change = c.show_page(1).unwrap();
        assert_eq!(change, PageChange { previous: 1, current: 1 });
        assert!(!change.moved());
        assert_single_visible(&c);
    }

    #[test]
    fn test_add_page_after_showing() {
        let mut c = controller(2);
        c.show_page(1).unwrap();
        let index = c.add_page(Page::new(PageKind::Forecast, true));
        assert_eq!(index, 2);
        assert_eq!(c.indicators().len(), 3);
        assert_single_visible(&c);
        assert_eq!(c.next().current, 2);
        assert_eq!(c.next().current, 0);
    }

    #[test]
    fn test_auto_rotate_advances_and_rearms() {
        let mut c = controller(3);
        c.start_auto_rotate(secs(10), secs(0));
        assert_eq!(c.tick(secs(9)), None);
        assert_eq!(c.tick(secs(10)).unwrap().current, 1);
        assert_eq!(c.tick(secs(20)).unwrap().current, 2);
        assert_eq!(c.tick(secs(30)).unwrap().current, 0);
        assert!(c.is_rotating());
    }

    #[test]
    fn test_double_start_leaves_one_pending_callback() {
        let mut c = controller(3);
        c.start_auto_rotate(secs(10), secs(0));
        c.start_auto_rotate(secs(10), secs(0));
        // Two pending callbacks would advance two pages here
        assert_eq!(c.tick(secs(10)).unwrap().current, 1);
        assert_eq!(c.tick(secs(19)), None);
    }

    #[test]
    fn test_double_stop_is_safe() {
        let mut c = controller(3);
        c.stop_auto_rotate();
        c.start_auto_rotate(secs(10), secs(0));
        c.stop_auto_rotate();
        c.stop_auto_rotate();
        assert!(!c.is_rotating());
        assert_eq!(c.tick(secs(100)), None);
    }

    #[test]
    fn test_manual_navigation_resets_countdown() {
        let mut c = controller(3);
        c.start_auto_rotate(secs(10), secs(0));

        let change = c.navigate(NavIntent::Next, secs(9)).unwrap();
        assert_eq!(change.current, 1);

        // The original t=10 deadline is gone
        assert_eq!(c.tick(secs(10)), None);
        assert_eq!(c.tick(secs(18)), None);
        assert_eq!(c.tick(secs(19)).unwrap().current, 2);
    }

    #[test]
    fn test_manual_navigation_keeps_stopped_rotation_stopped() {
        let mut c = controller(3);
        c.navigate(NavIntent::Previous, secs(5)).unwrap();
        assert_eq!(c.current_index(), 2);
        assert!(!c.is_rotating());
    }

    #[test]
    fn test_failed_show_still_restarts_rotation() {
        let mut c = controller(2);
        c.start_auto_rotate(secs(10), secs(0));
        assert!(c.navigate(NavIntent::Show(7), secs(4)).is_err());
        assert_eq!(c.next_rotation(), Some(secs(14)));
    }

    #[test]
    fn test_stalled_tick_catches_up() {
        let mut c = controller(4);
        c.start_auto_rotate(secs(10), secs(0));
        let change = c.tick(secs(31)).unwrap();
        assert_eq!(change, PageChange { previous: 0, current: 3 });
        assert_single_visible(&c);
    }
}
