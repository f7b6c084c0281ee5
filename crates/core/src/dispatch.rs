//! Routes user input and asynchronous signals to the navigator and popup.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::{
    camera::{labels_visible, CameraPose, SceneCamera},
    navigation::{Navigator, Signal},
    popup::PopupPresenter,
};

/// Source of "today" for scoring.
pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Something the user did on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// A ticker card was clicked.
    SelectCard(usize),
    /// The globe was clicked; `Some` when an event marker was hit.
    SelectFeature(Option<usize>),
    /// Pointer pressed on the ticker at strip x.
    PointerDown {
        /// Strip coordinate.
        x: f64,
    },
    /// Pointer moved over the ticker.
    PointerMove {
        /// Strip coordinate.
        x: f64,
    },
    /// Pointer released.
    PointerUp,
    /// Auto-advance button.
    ToggleAuto,
    /// Global view button.
    Recenter,
    /// Escape key.
    Escape,
    /// Select the card left of the current one.
    Previous,
    /// Select the card right of the current one.
    Next,
    /// The ticker viewport changed width.
    Resize {
        /// New strip width.
        ticker_width: f64,
    },
}

/// Core dashboard state: navigation, detail panel and label visibility.
pub struct Dashboard<C> {
    navigator: Navigator<C>,
    popup: PopupPresenter,
    pose: CameraPose,
    labels_visible: bool,
    clock: Clock,
}

impl<C: SceneCamera> Dashboard<C> {
    /// Wrap a navigator, starting from the camera's current pose.
    pub fn new(navigator: Navigator<C>) -> Self {
        let pose = *navigator.camera().watch_pose().borrow();
        let labels = labels_visible(&pose, navigator.settings().label_altitude);
        Self {
            navigator,
            popup: PopupPresenter::default(),
            pose,
            labels_visible: labels,
            clock: local_today,
        }
    }

    /// Replace the clock used for scoring.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Navigation state and camera.
    pub fn navigator(&self) -> &Navigator<C> {
        &self.navigator
    }

    /// Mutable navigator, for starting auto-advance after the splash.
    pub fn navigator_mut(&mut self) -> &mut Navigator<C> {
        &mut self.navigator
    }

    /// Detail panel.
    pub fn popup(&self) -> &PopupPresenter {
        &self.popup
    }

    /// Last reported camera pose.
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Whether globe labels should be drawn.
    pub fn labels_visible(&self) -> bool {
        self.labels_visible
    }

    /// Apply one user interaction.
    pub fn handle(&mut self, interaction: Interaction) {
        debug!(?interaction, "Handling interaction");
        match interaction {
            Interaction::SelectCard(index) | Interaction::SelectFeature(Some(index)) => {
                self.select(index);
            }
            Interaction::SelectFeature(None) | Interaction::Escape => {
                self.popup.close(self.navigator.camera());
            }
            Interaction::PointerDown { x } => self.navigator.ticker_mut().begin_drag(x),
            Interaction::PointerMove { x } => {
                self.navigator.ticker_mut().drag_to(x);
            }
            Interaction::PointerUp => self.navigator.ticker_mut().end_drag(),
            Interaction::ToggleAuto => {
                let enabled = self.navigator.toggle_auto();
                info!(enabled, "Auto-advance toggled");
            }
            Interaction::Recenter => {
                self.navigator.go_global();
                self.popup.close(self.navigator.camera());
            }
            Interaction::Previous => {
                if let Some(index) = self.navigator.current().checked_sub(1) {
                    self.select(index);
                }
            }
            Interaction::Next => self.select(self.navigator.current() + 1),
            Interaction::Resize { ticker_width } => {
                self.navigator.ticker_mut().set_viewport_width(ticker_width);
            }
        }
    }

    /// Apply a timer tick, flight completion or pose update.
    pub fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::AutoTick { generation } => {
                if self.navigator.on_auto_tick(generation) && self.popup.is_open() {
                    let current = self.navigator.current();
                    self.popup
                        .open(self.navigator.repository(), current, (self.clock)());
                }
            }
            Signal::FlightSettled { token, result } => {
                self.navigator.settle_flight(token, result);
            }
            Signal::CameraMoved(pose) => {
                self.pose = pose;
                self.labels_visible =
                    labels_visible(&pose, self.navigator.settings().label_altitude);
            }
        }
    }

    /// Close-up on `index` and show its detail panel.
    fn select(&mut self, index: usize) {
        if !self.navigator.go_to_close(index) {
            return;
        }
        self.popup
            .open(self.navigator.repository(), index, (self.clock)());
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc, time::Duration};

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        camera::{testing::RecordingCamera, Zoom},
        config::NavigationSettings,
        models::{EventRecord, GeoPoint},
        repository::EventRepository,
        ticker::CardLayout,
    };

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn event(title: &str, lat: f64, lon: f64) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            sport: "Athletics".to_string(),
            venue_name: None,
            city: None,
            country: None,
            start_date: Some("2026-09-20".to_string()),
            end_date: None,
            lat,
            lon,
            attendance: 30_000,
            rank: 70.0,
            athletes: Vec::new(),
            description: None,
        }
    }

    fn dashboard() -> (
        Dashboard<RecordingCamera>,
        RecordingCamera,
        mpsc::UnboundedReceiver<Signal>,
    ) {
        let events = vec![
            event("Berlin Marathon", 52.51, 13.38),
            event("Road Relay Series", 0.0, 0.0),
            event("Chicago Marathon", 41.88, -87.62),
        ];
        let repository = Arc::new(EventRepository::new(events, HashMap::new()).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        let camera = RecordingCamera::new();
        let navigator = Navigator::new(
            repository,
            camera.clone(),
            NavigationSettings::default(),
            CardLayout {
                card_width: 100.0,
                gap: 10.0,
            },
            150.0,
            tx,
        );
        (Dashboard::new(navigator).with_clock(fixed_today), camera, rx)
    }

    fn pose(altitude: f64) -> CameraPose {
        CameraPose {
            center: GeoPoint::new(0.0, 0.0),
            altitude,
            tilt: 0.0,
            heading: 0.0,
        }
    }

    #[tokio::test]
    async fn card_click_opens_close_up_and_escape_closes() {
        let (mut dashboard, camera, _rx) = dashboard();
        dashboard.handle(Interaction::SelectCard(2));

        assert_eq!(dashboard.navigator().current(), 2);
        assert_eq!(dashboard.popup().view().map(|v| v.index), Some(2));
        assert!(!camera.padding().is_empty());
        assert_eq!(camera.moves()[0].zoom, Zoom::Scale(3_000.0));

        dashboard.handle(Interaction::Escape);
        assert!(!dashboard.popup().is_open());
        assert!(camera.padding().is_empty());
    }

    #[tokio::test]
    async fn feature_miss_closes_and_hit_opens() {
        let (mut dashboard, camera, _rx) = dashboard();
        dashboard.handle(Interaction::SelectFeature(Some(0)));
        assert!(dashboard.popup().is_open());

        dashboard.handle(Interaction::SelectFeature(None));
        assert!(!dashboard.popup().is_open());
        assert!(camera.padding().is_empty());
        assert_eq!(dashboard.navigator().current(), 0);
    }

    #[tokio::test]
    async fn unlocated_card_still_opens_panel() {
        let (mut dashboard, camera, _rx) = dashboard();
        dashboard.handle(Interaction::SelectCard(1));
        assert_eq!(dashboard.popup().view().map(|v| v.index), Some(1));
        assert!(camera.moves().is_empty());
        assert_eq!(dashboard.navigator().state().ticker().active(), Some(1));
    }

    #[tokio::test]
    async fn recenter_flies_home_and_closes() {
        let (mut dashboard, camera, _rx) = dashboard();
        dashboard.handle(Interaction::SelectCard(0));
        dashboard.handle(Interaction::Recenter);

        assert!(!dashboard.popup().is_open());
        assert!(camera.padding().is_empty());
        let home = camera.moves()[1];
        assert_eq!(home.zoom, Zoom::Altitude(19_500_000.0));
    }

    #[tokio::test]
    async fn invalid_selection_changes_nothing() {
        let (mut dashboard, camera, _rx) = dashboard();
        dashboard.handle(Interaction::SelectCard(9));
        dashboard.handle(Interaction::Previous);
        assert_eq!(dashboard.navigator().current(), 0);
        assert!(!dashboard.popup().is_open());
        assert!(camera.moves().is_empty());

        dashboard.handle(Interaction::SelectCard(2));
        dashboard.handle(Interaction::Next);
        assert_eq!(dashboard.navigator().current(), 2);
        assert_eq!(camera.moves().len(), 1);
    }

    #[tokio::test]
    async fn previous_and_next_step_through_cards() {
        let (mut dashboard, _camera, _rx) = dashboard();
        dashboard.handle(Interaction::Next);
        dashboard.handle(Interaction::Next);
        assert_eq!(dashboard.navigator().current(), 2);
        dashboard.handle(Interaction::Previous);
        assert_eq!(dashboard.popup().view().map(|v| v.index), Some(1));
    }

    #[tokio::test]
    async fn dragging_scrolls_without_changing_index() {
        let (mut dashboard, _camera, _rx) = dashboard();
        dashboard.handle(Interaction::PointerDown { x: 120.0 });
        dashboard.handle(Interaction::PointerMove { x: 20.0 });
        dashboard.handle(Interaction::PointerUp);
        dashboard.handle(Interaction::PointerMove { x: 500.0 });

        let ticker = dashboard.navigator().state().ticker();
        assert_eq!(ticker.offset(), -100.0);
        assert!(!ticker.is_dragging());
        assert_eq!(dashboard.navigator().current(), 0);
    }

    #[tokio::test]
    async fn drag_keeps_tracking_left_of_the_strip() {
        let (mut dashboard, _camera, _rx) = dashboard();
        dashboard.handle(Interaction::PointerDown { x: 20.0 });
        dashboard.handle(Interaction::PointerMove { x: -30.0 });
        assert_eq!(dashboard.navigator().state().ticker().offset(), -50.0);

        dashboard.handle(Interaction::PointerMove { x: -100.0 });
        assert_eq!(dashboard.navigator().state().ticker().offset(), -120.0);

        dashboard.handle(Interaction::PointerMove { x: -400.0 });
        assert_eq!(dashboard.navigator().state().ticker().offset(), -170.0);
    }

    #[tokio::test]
    async fn labels_follow_camera_altitude() {
        let (mut dashboard, _camera, _rx) = dashboard();
        assert!(!dashboard.labels_visible());

        dashboard.handle_signal(Signal::CameraMoved(pose(900_000.0)));
        assert!(dashboard.labels_visible());
        assert_eq!(dashboard.pose().altitude, 900_000.0);

        dashboard.handle_signal(Signal::CameraMoved(pose(1_200_000.0)));
        assert!(!dashboard.labels_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_tick_refreshes_open_panel() {
        let (mut dashboard, _camera, mut rx) = dashboard();
        dashboard.handle(Interaction::SelectCard(0));
        dashboard.handle(Interaction::ToggleAuto);
        assert!(dashboard.navigator().state().auto_enabled());

        let deadline = tokio::time::Instant::now() + Duration::from_millis(6_000);
        while dashboard.navigator().current() == 0 {
            let signal = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .ok()
                .flatten()
                .unwrap();
            dashboard.handle_signal(signal);
        }
        assert_eq!(dashboard.navigator().current(), 1);
        assert_eq!(dashboard.popup().view().map(|v| v.index), Some(1));

        dashboard.handle(Interaction::ToggleAuto);
        assert!(!dashboard.navigator().state().auto_enabled());
    }
}
