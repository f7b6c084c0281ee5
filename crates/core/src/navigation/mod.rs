//! Current-event tracking, camera flights and auto-advance.

pub mod auto;
pub mod flight;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    camera::{CameraError, CameraMove, CameraPose, Padding, SceneCamera, Zoom},
    config::NavigationSettings,
    repository::EventRepository,
    ticker::{CardLayout, TickerStrip},
};

pub use auto::AutoAdvance;
pub use flight::{FlightStatus, FlightToken, FlightTracker};

/// `(minimum rank, altitude)`; higher-ranked events get a closer camera.
const ALTITUDE_TIERS: &[(f64, f64)] = &[(88.0, 1_800_000.0), (75.0, 2_800_000.0)];
const FALLBACK_ALTITUDE: f64 = 4_200_000.0;

/// Camera altitude for an overview flight to an event of `rank`.
pub fn altitude_for_rank(rank: f64) -> f64 {
    ALTITUDE_TIERS
        .iter()
        .find(|(floor, _)| rank >= *floor)
        .map(|(_, altitude)| *altitude)
        .unwrap_or(FALLBACK_ALTITUDE)
}

/// Asynchronous notifications fed back into the dashboard loop.
#[derive(Debug)]
pub enum Signal {
    /// The auto-advance timer armed with `generation` fired.
    AutoTick {
        /// Generation of the timer that fired.
        generation: u64,
    },
    /// A camera flight finished or failed.
    FlightSettled {
        /// Request the completion belongs to.
        token: FlightToken,
        /// Outcome reported by the scene.
        result: Result<(), CameraError>,
    },
    /// The scene reported a new camera pose.
    CameraMoved(CameraPose),
}

/// How the camera frames a selected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Rank-based altitude, slight tilt.
    Overview,
    /// Ground-level framing with space reserved for the detail panel.
    CloseUp,
}

/// The mutable view state shared by navigation and the ticker.
#[derive(Debug, Clone)]
pub struct NavigationState {
    current: usize,
    auto_enabled: bool,
    ticker: TickerStrip,
}

impl NavigationState {
    /// Index of the active event.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Whether auto-advance is switched on.
    pub fn auto_enabled(&self) -> bool {
        self.auto_enabled
    }

    /// Ticker scroll state.
    pub fn ticker(&self) -> &TickerStrip {
        &self.ticker
    }
}

/// Owns the navigation state and drives the camera.
pub struct Navigator<C> {
    repository: Arc<EventRepository>,
    camera: C,
    settings: NavigationSettings,
    state: NavigationState,
    timer: Option<AutoAdvance>,
    timer_generation: u64,
    flights: FlightTracker,
    signals: mpsc::UnboundedSender<Signal>,
}

impl<C: SceneCamera> Navigator<C> {
    /// Start at event 0 with auto-advance off. Flight completions and timer
    /// ticks are delivered through `signals`.
    pub fn new(
        repository: Arc<EventRepository>,
        camera: C,
        settings: NavigationSettings,
        layout: CardLayout,
        viewport_width: f64,
        signals: mpsc::UnboundedSender<Signal>,
    ) -> Self {
        let ticker = TickerStrip::new(layout, repository.len(), viewport_width);
        Self {
            repository,
            camera,
            settings,
            state: NavigationState {
                current: 0,
                auto_enabled: false,
                ticker,
            },
            timer: None,
            timer_generation: 0,
            flights: FlightTracker::default(),
            signals,
        }
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Index of the active event.
    pub fn current(&self) -> usize {
        self.state.current
    }

    /// Ticker scroll state for drags and resizes.
    pub fn ticker_mut(&mut self) -> &mut TickerStrip {
        &mut self.state.ticker
    }

    /// The camera being driven.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Settings in effect.
    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Events being navigated.
    pub fn repository(&self) -> &Arc<EventRepository> {
        &self.repository
    }

    /// Whether the latest flight is still travelling.
    pub fn is_flying(&self) -> bool {
        self.flights.is_flying()
    }

    /// Make `index` active and fly an overview to it. Returns `false` (and
    /// changes nothing) for out-of-range indices.
    pub fn go_to(&mut self, index: usize) -> bool {
        self.navigate(index, Framing::Overview)
    }

    /// Like [`go_to`](Self::go_to) but with the close-up framing.
    pub fn go_to_close(&mut self, index: usize) -> bool {
        self.navigate(index, Framing::CloseUp)
    }

    fn navigate(&mut self, index: usize, framing: Framing) -> bool {
        let repository = Arc::clone(&self.repository);
        let Some(event) = repository.event(index) else {
            debug!(index, count = repository.len(), "Ignoring out-of-range navigation");
            return false;
        };

        self.state.current = index;
        self.state.ticker.focus(index);

        let Some(target) = event.location() else {
            debug!(index, title = %event.title, "Event has no location; camera stays put");
            return true;
        };

        let request = match framing {
            Framing::Overview => CameraMove {
                target,
                zoom: Zoom::Altitude(altitude_for_rank(event.rank)),
                tilt: self.settings.overview_tilt,
                heading: 0.0,
                duration: self.settings.flight_duration(),
                easing: self.settings.easing,
            },
            Framing::CloseUp => {
                self.camera.set_padding(self.settings.panel_padding);
                CameraMove {
                    target,
                    zoom: Zoom::Scale(self.settings.close_up_scale),
                    tilt: self.settings.close_up_tilt,
                    heading: 0.0,
                    duration: self.settings.flight_duration(),
                    easing: self.settings.easing,
                }
            }
        };
        info!(index, title = %event.title, ?framing, "Flying to event");
        self.fly(request);
        true
    }

    /// Release reserved padding and fly back to the full-globe view.
    pub fn go_global(&mut self) {
        self.camera.set_padding(Padding::NONE);
        let home = self.settings.home;
        info!("Returning to global view");
        self.fly(CameraMove {
            target: home.point(),
            zoom: Zoom::Altitude(home.altitude),
            tilt: 0.0,
            heading: 0.0,
            duration: self.settings.flight_duration(),
            easing: self.settings.easing,
        });
    }

    fn fly(&mut self, request: CameraMove) -> FlightToken {
        let token = self.flights.issue();
        let flight = self.camera.move_to(request);
        let signals = self.signals.clone();
        tokio::spawn(async move {
            let result = flight.await;
            // The dashboard may already be gone; nothing to report to then.
            let _ = signals.send(Signal::FlightSettled { token, result });
        });
        token
    }

    /// Classify a flight completion. Failures and stale results are logged
    /// and otherwise dropped.
    pub fn settle_flight(
        &mut self,
        token: FlightToken,
        result: Result<(), CameraError>,
    ) -> FlightStatus {
        let status = self.flights.settle(token, result);
        match &status {
            FlightStatus::Arrived => debug!(?token, "Camera flight arrived"),
            FlightStatus::Failed(err) => debug!(?token, %err, "Camera flight failed; ignoring"),
            FlightStatus::Stale => debug!(?token, "Discarding superseded camera flight"),
        }
        status
    }

    /// Arm auto-advance, replacing any running timer.
    pub fn start_auto(&mut self) {
        self.cancel_timer();
        self.timer_generation += 1;
        let period = self.settings.auto_interval();
        self.timer = Some(AutoAdvance::spawn(
            self.timer_generation,
            period,
            self.signals.clone(),
        ));
        self.state.auto_enabled = true;
        info!(
            generation = self.timer_generation,
            period_ms = period.as_millis() as u64,
            "Auto-advance started"
        );
    }

    /// Disarm auto-advance. Safe to call when it is not running.
    pub fn stop_auto(&mut self) {
        if self.timer.is_some() {
            info!("Auto-advance stopped");
        }
        self.cancel_timer();
        self.state.auto_enabled = false;
    }

    /// Flip auto-advance, returning the new setting.
    pub fn toggle_auto(&mut self) -> bool {
        if self.state.auto_enabled {
            self.stop_auto();
        } else {
            self.start_auto();
        }
        self.state.auto_enabled
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Handle a timer tick. Ticks from cancelled timers are ignored; returns
    /// whether the index advanced.
    pub fn on_auto_tick(&mut self, generation: u64) -> bool {
        let armed = self.timer.as_ref().map(AutoAdvance::generation);
        if armed != Some(generation) {
            debug!(generation, ?armed, "Ignoring tick from a cancelled timer");
            return false;
        }
        let next = (self.state.current + 1) % self.repository.len();
        self.go_to(next)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use anyhow::Result;
    use tokio::time::{self, timeout};

    use super::*;
    use crate::{
        camera::testing::RecordingCamera,
        models::{EventRecord, GeoPoint},
    };

    fn event(title: &str, lat: f64, lon: f64, rank: f64) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            sport: "Tennis".to_string(),
            venue_name: None,
            city: None,
            country: None,
            start_date: Some("2027-01-18".to_string()),
            end_date: None,
            lat,
            lon,
            attendance: 10_000,
            rank,
            athletes: Vec::new(),
            description: None,
        }
    }

    fn repository() -> Arc<EventRepository> {
        let events = vec![
            event("Melbourne", -37.82, 144.98, 93.0),
            event("Touring Series", 0.0, 0.0, 62.0),
            event("Madrid", 40.44, -3.6, 80.0),
            event("Gwangju", 35.13, 126.88, 40.0),
        ];
        Arc::new(EventRepository::new(events, HashMap::new()).unwrap())
    }

    fn navigator() -> (
        Navigator<RecordingCamera>,
        RecordingCamera,
        mpsc::UnboundedReceiver<Signal>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let camera = RecordingCamera::new();
        let layout = CardLayout {
            card_width: 100.0,
            gap: 10.0,
        };
        let navigator = Navigator::new(
            repository(),
            camera.clone(),
            NavigationSettings::default(),
            layout,
            250.0,
            tx,
        );
        (navigator, camera, rx)
    }

    #[test]
    fn altitude_tiers_follow_rank() {
        assert_eq!(altitude_for_rank(100.0), 1_800_000.0);
        assert_eq!(altitude_for_rank(88.0), 1_800_000.0);
        assert_eq!(altitude_for_rank(87.9), 2_800_000.0);
        assert_eq!(altitude_for_rank(75.0), 2_800_000.0);
        assert_eq!(altitude_for_rank(74.9), 4_200_000.0);
    }

    #[tokio::test]
    async fn initial_card_matches_current_event() {
        let (navigator, camera, _rx) = navigator();
        assert_eq!(navigator.current(), 0);
        assert_eq!(navigator.state().ticker().active(), Some(0));
        assert!(camera.moves().is_empty());
    }

    #[tokio::test]
    async fn go_to_flies_overview() {
        let (mut navigator, camera, _rx) = navigator();
        assert!(navigator.go_to(2));
        assert_eq!(navigator.current(), 2);
        assert_eq!(navigator.state().ticker().active(), Some(2));

        let moves = camera.moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].target, GeoPoint::new(-3.6, 40.44));
        assert_eq!(moves[0].zoom, Zoom::Altitude(2_800_000.0));
        assert_eq!(moves[0].tilt, 18.0);
        assert_eq!(moves[0].duration, Duration::from_millis(3_000));
        assert!(camera.padding().is_empty());
    }

    #[tokio::test]
    async fn unlocated_event_updates_state_without_camera_move() {
        let (mut navigator, camera, _rx) = navigator();
        assert!(navigator.go_to(1));
        assert_eq!(navigator.current(), 1);
        assert_eq!(navigator.state().ticker().active(), Some(1));
        assert!(camera.moves().is_empty());

        assert!(navigator.go_to_close(1));
        assert!(camera.moves().is_empty());
        assert!(camera.padding().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_is_a_no_op() {
        let (mut navigator, camera, _rx) = navigator();
        navigator.go_to(2);
        let offset = navigator.state().ticker().offset();

        assert!(!navigator.go_to(4));
        assert!(!navigator.go_to(usize::MAX));
        assert_eq!(navigator.current(), 2);
        assert_eq!(navigator.state().ticker().offset(), offset);
        assert_eq!(camera.moves().len(), 1);
    }

    #[tokio::test]
    async fn ticker_offset_stays_in_bounds() {
        let (mut navigator, _camera, _rx) = navigator();
        for index in 0..4 {
            navigator.go_to(index);
            let ticker = navigator.state().ticker();
            assert!(ticker.offset() <= 0.0);
            assert!(ticker.offset() >= ticker.max_scroll());
        }
    }

    #[tokio::test]
    async fn close_up_reserves_padding_and_global_clears_it() {
        let (mut navigator, camera, _rx) = navigator();
        navigator.go_to_close(0);
        assert_eq!(camera.padding(), NavigationSettings::default().panel_padding);
        let close = camera.moves()[0];
        assert_eq!(close.zoom, Zoom::Scale(3_000.0));
        assert_eq!(close.tilt, 60.0);

        navigator.go_global();
        assert!(camera.padding().is_empty());
        let home = camera.moves()[1];
        assert_eq!(home.target, GeoPoint::new(-30.0, 22.0));
        assert_eq!(home.zoom, Zoom::Altitude(19_500_000.0));
        assert_eq!(home.tilt, 0.0);
    }

    #[tokio::test]
    async fn only_latest_flight_is_current() -> Result<()> {
        let (mut navigator, camera, mut rx) = navigator();
        camera.fail_next(CameraError::Superseded);
        navigator.go_to(0);
        navigator.go_to(2);

        let mut statuses = Vec::new();
        for _ in 0..2 {
            match rx.recv().await {
                Some(Signal::FlightSettled { token, result }) => {
                    statuses.push(navigator.settle_flight(token, result));
                }
                other => anyhow::bail!("unexpected signal {other:?}"),
            }
        }
        assert!(statuses.contains(&FlightStatus::Stale));
        assert!(statuses.contains(&FlightStatus::Arrived));
        assert!(!navigator.is_flying());
        assert_eq!(navigator.current(), 2);
        Ok(())
    }

    /// Feed signals back until none arrive for `window`.
    async fn drain(
        navigator: &mut Navigator<RecordingCamera>,
        rx: &mut mpsc::UnboundedReceiver<Signal>,
        window: Duration,
    ) {
        while let Ok(Some(signal)) = timeout(window, rx.recv()).await {
            match signal {
                Signal::AutoTick { generation } => {
                    navigator.on_auto_tick(generation);
                }
                Signal::FlightSettled { token, result } => {
                    navigator.settle_flight(token, result);
                }
                Signal::CameraMoved(_) => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advance_wraps_around() {
        let (mut navigator, _camera, mut rx) = navigator();
        navigator.go_to(3);
        navigator.start_auto();
        assert!(navigator.state().auto_enabled());

        loop {
            match rx.recv().await {
                Some(Signal::AutoTick { generation }) => {
                    assert!(navigator.on_auto_tick(generation));
                    break;
                }
                Some(Signal::FlightSettled { token, result }) => {
                    navigator.settle_flight(token, result);
                }
                _ => {}
            }
        }
        assert_eq!(navigator.current(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn no_index_change_after_stop() {
        let (mut navigator, _camera, mut rx) = navigator();
        navigator.start_auto();
        time::sleep(Duration::from_millis(5_001)).await;
        navigator.stop_auto();
        assert!(!navigator.state().auto_enabled());

        // A tick queued before the stop must not move the index either.
        let before = navigator.current();
        drain(&mut navigator, &mut rx, Duration::from_millis(20_000)).await;
        assert_eq!(navigator.current(), before);
        assert_eq!(before, 0);

        navigator.stop_auto();
        assert_eq!(navigator.current(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_rearms_a_single_timer() {
        let (mut navigator, _camera, mut rx) = navigator();
        navigator.start_auto();
        time::sleep(Duration::from_millis(4_000)).await;
        navigator.start_auto();

        // The first timer would have fired at 5s; the restarted one fires at 9s.
        drain(&mut navigator, &mut rx, Duration::from_millis(4_500)).await;
        assert_eq!(navigator.current(), 0);

        drain(&mut navigator, &mut rx, Duration::from_millis(1_000)).await;
        assert_eq!(navigator.current(), 1);
        assert!(!navigator.on_auto_tick(1));
    }

    #[tokio::test]
    async fn toggle_flips_state() {
        let (mut navigator, _camera, _rx) = navigator();
        assert!(navigator.toggle_auto());
        assert!(!navigator.toggle_auto());
        assert!(!navigator.state().auto_enabled());
    }
}
