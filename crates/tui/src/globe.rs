//! Terminal stand-in for a 3D scene: an animated camera and the map
//! projection used to draw and hit-test the globe canvas.

use std::{sync::Arc, time::Duration};

use eventglobe_core::{
    camera::FlightFuture, CameraError, CameraMove, CameraPose, EventRecord, GeoPoint, Padding,
    SceneCamera,
};
use parking_lot::Mutex;
use ratatui::layout::Rect;
use tokio::{
    sync::watch,
    time::{self, Instant, MissedTickBehavior},
};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
const MIN_LON_SPAN: f64 = 0.02;
const PICK_RADIUS: i32 = 1;

struct Shared {
    generation: Mutex<u64>,
    padding: Mutex<Padding>,
    pose: watch::Sender<CameraPose>,
}

/// Camera that animates its pose on the tokio clock.
///
/// Each flight publishes interpolated poses at roughly 30 fps. Starting a
/// new flight makes the previous one resolve with
/// [`CameraError::Superseded`] on its next frame.
#[derive(Clone)]
pub struct SimulatedCamera {
    shared: Arc<Shared>,
}

impl SimulatedCamera {
    pub fn new(initial: CameraPose) -> Self {
        let (pose, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                generation: Mutex::new(0),
                padding: Mutex::new(Padding::NONE),
                pose,
            }),
        }
    }

    pub fn pose(&self) -> CameraPose {
        *self.shared.pose.borrow()
    }
}

impl SceneCamera for SimulatedCamera {
    fn move_to(&self, request: CameraMove) -> FlightFuture {
        let generation = {
            let mut current = self.shared.generation.lock();
            *current += 1;
            *current
        };
        let shared = Arc::clone(&self.shared);
        let from = self.pose();
        let to = CameraPose::settled(&request);

        Box::pin(async move {
            let started = Instant::now();
            let mut frames = time::interval(FRAME_INTERVAL);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                frames.tick().await;
                if *shared.generation.lock() != generation {
                    return Err(CameraError::Superseded);
                }
                let progress = if request.duration.is_zero() {
                    1.0
                } else {
                    started.elapsed().as_secs_f64() / request.duration.as_secs_f64()
                };
                let eased = request.easing.apply(progress);
                shared.pose.send_replace(interpolate(&from, &to, eased));
                if progress >= 1.0 {
                    return Ok(());
                }
            }
        })
    }

    fn set_padding(&self, padding: Padding) {
        *self.shared.padding.lock() = padding;
    }

    fn padding(&self) -> Padding {
        *self.shared.padding.lock()
    }

    fn watch_pose(&self) -> watch::Receiver<CameraPose> {
        self.shared.pose.subscribe()
    }
}

/// Signed longitude difference folded into `[-180, 180)`.
fn wrap_lon(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Pose at eased progress `t` between two poses. Longitude takes the short
/// way round; altitude is interpolated geometrically so zooms feel even.
fn interpolate(from: &CameraPose, to: &CameraPose, t: f64) -> CameraPose {
    if t >= 1.0 {
        return *to;
    }
    let lerp = |a: f64, b: f64| a + (b - a) * t;
    let lon = wrap_lon(from.center.lon + wrap_lon(to.center.lon - from.center.lon) * t);
    let altitude = from.altitude.max(1.0).powf(1.0 - t) * to.altitude.max(1.0).powf(t);
    CameraPose {
        center: GeoPoint::new(lon, lerp(from.center.lat, to.center.lat)),
        altitude,
        tilt: lerp(from.tilt, to.tilt),
        heading: lerp(from.heading, to.heading),
    }
}

/// Flat projection of the camera's view onto a block of terminal cells.
///
/// The visible longitude span scales with altitude, reaching the whole
/// world at `full_altitude`. Tilt and heading are not drawn.
#[derive(Debug, Clone, Copy)]
pub struct MapViewport {
    area: Rect,
    center: GeoPoint,
    lon_span: f64,
}

impl MapViewport {
    pub fn new(area: Rect, pose: &CameraPose, full_altitude: f64) -> Self {
        let lon_span =
            (pose.altitude / full_altitude.max(1.0) * 360.0).clamp(MIN_LON_SPAN, 360.0);
        Self {
            area,
            center: pose.center,
            lon_span,
        }
    }

    pub fn lon_per_col(&self) -> f64 {
        self.lon_span / f64::from(self.area.width.max(1))
    }

    fn lat_per_row(&self) -> f64 {
        self.lon_per_col() * CELL_ASPECT
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [
            self.center.lon - self.lon_span / 2.0,
            self.center.lon + self.lon_span / 2.0,
        ]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.lat_per_row() * f64::from(self.area.height) / 2.0;
        [self.center.lat - half, self.center.lat + half]
    }

    /// Canvas x for `lon`, unwrapped to the side of the antimeridian the
    /// camera is looking at.
    pub fn canvas_x(&self, lon: f64) -> f64 {
        self.center.lon + wrap_lon(lon - self.center.lon)
    }

    /// Terminal cell showing `point`, if it is inside the area.
    pub fn project(&self, point: GeoPoint) -> Option<(u16, u16)> {
        let [west, _] = self.x_bounds();
        let [_, north] = self.y_bounds();
        let col = ((self.canvas_x(point.lon) - west) / self.lon_per_col()).floor();
        let row = ((north - point.lat) / self.lat_per_row()).floor();
        let inside = col >= 0.0
            && row >= 0.0
            && col < f64::from(self.area.width)
            && row < f64::from(self.area.height);
        inside.then(|| (self.area.x + col as u16, self.area.y + row as u16))
    }

    /// Geographic point at the centre of terminal cell `(column, row)`.
    pub fn unproject(&self, column: u16, row: u16) -> Option<GeoPoint> {
        if !contains(self.area, column, row) {
            return None;
        }
        let [west, _] = self.x_bounds();
        let [_, north] = self.y_bounds();
        let lon = west + (f64::from(column - self.area.x) + 0.5) * self.lon_per_col();
        let lat = north - (f64::from(row - self.area.y) + 0.5) * self.lat_per_row();
        Some(GeoPoint::new(wrap_lon(lon), lat))
    }

    /// Event marker closest to `(column, row)` within one cell.
    pub fn pick<'a>(
        &self,
        events: impl Iterator<Item = (usize, &'a EventRecord)>,
        column: u16,
        row: u16,
    ) -> Option<usize> {
        events
            .filter_map(|(index, event)| {
                let (x, y) = self.project(event.location()?)?;
                let dx = (i32::from(x) - i32::from(column)).abs();
                let dy = (i32::from(y) - i32::from(row)).abs();
                (dx <= PICK_RADIUS && dy <= PICK_RADIUS).then_some((dx + dy, index))
            })
            .min()
            .map(|(_, index)| index)
    }
}

pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}
