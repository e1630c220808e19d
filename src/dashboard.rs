//! # Dashboard State
//!
//! Ties the page controller, the gesture router and the latest weather data
//! together. The interactive loop hands every event to the [`Dashboard`] and
//! redraws when told to. Each call applies its whole state change before
//! returning, so a data refresh landing between two input events can never
//! observe a half-finished page transition.
//!
//! ## Redraw rules
//! - The visible page changed (or was re-shown) → redraw the page
//! - New data arrived and the visible page is auto-refreshable → redraw the page
//! - A refresh failed → keep the last good data on screen; redraw only to show the
//!   stale marker the first time
//!
//! Chart pages are only ever drawn through these rules, so the chart renderer
//! runs when its page becomes visible or when data arrives while it is visible.

use crate::config::ScheduleConfig;
use crate::gesture::GestureRouter;
use crate::input::InputEvent;
use crate::pages::{NavIntent, Page, PageChange, PageController, PageError};
use crate::provider::DataUpdate;
use crate::WeatherSnapshot;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Freshness of the data on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataStatus {
    /// No refresh has completed yet
    Loading,
    /// The last refresh succeeded
    Fresh,
    /// The last refresh failed; older data (if any) is still shown
    Stale,
}

/// What the loop should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Redraw {
    Nothing,
    /// Redraw the visible page completely
    Page,
}

impl Redraw {
    pub fn needed(self) -> bool {
        self == Redraw::Page
    }
}

#[derive(Debug)]
pub struct Dashboard {
    controller: PageController,
    gestures: GestureRouter,
    snapshot: Option<WeatherSnapshot>,
    status: DataStatus,
    rotation_interval: Duration,
    auto_rotate: bool,
}

impl Dashboard {
    pub fn new(pages: Vec<Page>, schedule: &ScheduleConfig) -> Result<Self, PageError> {
        Ok(Self {
            controller: PageController::new(pages)?,
            gestures: GestureRouter::new(),
            snapshot: None,
            status: DataStatus::Loading,
            rotation_interval: schedule.rotation_interval(),
            auto_rotate: schedule.auto_rotate,
        })
    }

    /// Arm auto-rotation if enabled. Call once when the loop starts.
    pub fn start(&mut self, now: Duration) {
        if self.auto_rotate {
            self.controller.start_auto_rotate(self.rotation_interval, now);
        }
    }

    pub fn controller(&self) -> &PageController {
        &self.controller
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn status(&self) -> &DataStatus {
        &self.status
    }

    /// When the next automatic page change is due.
    pub fn next_rotation(&self) -> Option<Duration> {
        self.controller.next_rotation()
    }

    /// Advance rotation if its deadline passed.
    pub fn tick(&mut self, now: Duration) -> Redraw {
        match self.controller.tick(now) {
            Some(change) => {
                debug!("Auto-rotate to page {}", change.current);
                Redraw::Page
            }
            None => Redraw::Nothing,
        }
    }

    /// Apply a user input. Every page change goes through the manual navigation
    /// path, so swipes, keys and buttons all reset the rotation countdown.
    pub fn handle_input(&mut self, event: InputEvent, now: Duration) -> Redraw {
        let intent = match event {
            InputEvent::DragStart(x) => {
                self.gestures.on_drag_start(x);
                None
            }
            InputEvent::DragMove(x) => self.gestures.on_drag_move(x),
            InputEvent::DragEnd => {
                self.gestures.on_drag_end();
                None
            }
            InputEvent::Nav(intent) => Some(intent),
            InputEvent::ToggleRotation => {
                self.toggle_rotation(now);
                None
            }
            InputEvent::Quit => None,
        };

        match intent {
            Some(intent) => self.navigate(intent, now),
            None => Redraw::Nothing,
        }
    }

    /// Manual navigation: stop rotation, move, restart with a full interval.
    pub fn navigate(&mut self, intent: NavIntent, now: Duration) -> Redraw {
        match self.controller.navigate(intent, now) {
            Ok(PageChange { current, .. }) => {
                debug!("Manual navigation {:?} to page {}", intent, current);
                Redraw::Page
            }
            Err(e) => {
                warn!("Ignoring navigation: {}", e);
                Redraw::Nothing
            }
        }
    }

    /// Apply the result of a background refresh.
    pub fn apply_update(&mut self, update: DataUpdate) -> Redraw {
        match update {
            DataUpdate::Snapshot(snapshot) => {
                self.snapshot = Some(*snapshot);
                self.status = DataStatus::Fresh;
                if self.controller.current_page().auto_refresh() {
                    Redraw::Page
                } else {
                    Redraw::Nothing
                }
            }
            DataUpdate::Unavailable(reason) => {
                info!("Keeping last data on screen ({})", reason);
                if self.status == DataStatus::Stale {
                    return Redraw::Nothing;
                }
                self.status = DataStatus::Stale;
                Redraw::Page
            }
        }
    }

    fn toggle_rotation(&mut self, now: Duration) {
        if self.controller.is_rotating() {
            info!("Auto-rotate paused");
            self.controller.stop_auto_rotate();
        } else {
            info!("Auto-rotate resumed");
            self.controller.start_auto_rotate(self.rotation_interval, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{default_pages, ChartKind, PageKind};
    use crate::weather_data::{parse_forecast, tests::sample_body, tests::sample_location};
    use chrono::Local;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn dashboard() -> Dashboard {
        let mut d = Dashboard::new(default_pages(), &ScheduleConfig::default()).unwrap();
        d.start(secs(0));
        d
    }

    fn snapshot_update() -> DataUpdate {
        let snapshot = parse_forecast(&sample_body(), sample_location(), Local::now()).unwrap();
        DataUpdate::Snapshot(Box::new(snapshot))
    }

    #[test]
    fn test_swipe_left_goes_next_and_resets_rotation() {
        let mut d = dashboard();
        assert_eq!(d.handle_input(InputEvent::DragStart(400), secs(9)), Redraw::Nothing);
        assert_eq!(d.handle_input(InputEvent::DragMove(250), secs(9)), Redraw::Page);
        assert_eq!(d.controller().current_index(), 1);
        assert_eq!(d.next_rotation(), Some(secs(19)));
    }

    #[test]
    fn test_swipe_of_exactly_threshold_does_nothing() {
        let mut d = dashboard();
        d.handle_input(InputEvent::DragStart(200), secs(1));
        assert_eq!(d.handle_input(InputEvent::DragMove(300), secs(1)), Redraw::Nothing);
        assert_eq!(d.controller().current_index(), 0);
        assert_eq!(d.next_rotation(), Some(secs(10)));
    }

    #[test]
    fn test_snapshot_redraws_auto_refresh_page() {
        let mut d = dashboard();
        assert_eq!(d.status(), &DataStatus::Loading);
        assert_eq!(d.apply_update(snapshot_update()), Redraw::Page);
        assert_eq!(d.status(), &DataStatus::Fresh);
        assert!(d.snapshot().is_some());
    }

    #[test]
    fn test_snapshot_skips_static_page() {
        let pages = vec![Page::new(PageKind::Current, false)];
        let mut d = Dashboard::new(pages, &ScheduleConfig::default()).unwrap();
        assert_eq!(d.apply_update(snapshot_update()), Redraw::Nothing);
        assert!(d.snapshot().is_some());
    }

    #[test]
    fn test_failed_refresh_keeps_last_snapshot() {
        let mut d = dashboard();
        d.apply_update(snapshot_update());

        assert_eq!(d.apply_update(DataUpdate::Unavailable("timeout".into())), Redraw::Page);
        assert_eq!(d.apply_update(DataUpdate::Unavailable("timeout".into())), Redraw::Nothing);
        assert_eq!(d.status(), &DataStatus::Stale);
        assert_eq!(d.snapshot().unwrap().current.temperature, 21.4);
    }

    #[test]
    fn test_refresh_during_chart_page_keeps_single_visible_page() {
        let mut d = dashboard();
        d.navigate(NavIntent::Show(2), secs(1));
        assert_eq!(
            d.controller().current_page().kind(),
            PageKind::Chart(ChartKind::Temperature)
        );
        assert_eq!(d.apply_update(snapshot_update()), Redraw::Page);
        let visible = d.controller().pages().iter().filter(|p| p.is_visible()).count();
        assert_eq!(visible, 1);
        assert_eq!(d.controller().current_index(), 2);
    }

    #[test]
    fn test_toggle_rotation() {
        let mut d = dashboard();
        d.handle_input(InputEvent::ToggleRotation, secs(3));
        assert_eq!(d.next_rotation(), None);
        assert_eq!(d.tick(secs(50)), Redraw::Nothing);

        d.handle_input(InputEvent::ToggleRotation, secs(50));
        assert_eq!(d.next_rotation(), Some(secs(60)));
        assert_eq!(d.tick(secs(60)), Redraw::Page);
        assert_eq!(d.controller().current_index(), 1);
    }

    #[test]
    fn test_out_of_range_key_is_ignored() {
        let mut d = dashboard();
        assert_eq!(d.handle_input(InputEvent::Nav(NavIntent::Show(8)), secs(2)), Redraw::Nothing);
        assert_eq!(d.controller().current_index(), 0);
    }
}
