//! Contract between the navigation core and whatever draws the globe.
//!
//! The core never inspects scene internals. It asks for flights, reserves
//! screen-space padding for side panels, and listens to pose updates.

use std::{future::Future, pin::Pin, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::models::GeoPoint;

/// Ground scale to altitude ratio used when a scale-framed move is reported
/// back as a camera altitude.
const SCALE_TO_ALTITUDE: f64 = 0.35;

/// Named easing curves understood by camera implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Fast start, long quintic settle.
    #[default]
    OutQuint,
    /// Symmetric cubic acceleration and deceleration.
    InOutCubic,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::OutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// How close the camera should get to its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Zoom {
    /// Camera altitude above the surface.
    Altitude(f64),
    /// Ground-level map scale, used for close-up framing.
    Scale(f64),
}

impl Zoom {
    /// Altitude equivalent of the zoom, in the same units as camera altitude.
    pub fn altitude(self) -> f64 {
        match self {
            Zoom::Altitude(altitude) => altitude,
            Zoom::Scale(scale) => scale * SCALE_TO_ALTITUDE,
        }
    }
}

/// A single camera flight request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMove {
    /// Point to look at.
    pub target: GeoPoint,
    /// Altitude or ground scale.
    pub zoom: Zoom,
    /// Tilt in degrees; 0 looks straight down.
    pub tilt: f64,
    /// Heading in degrees; 0 is north up.
    pub heading: f64,
    /// Animation length.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Animation curve.
    pub easing: Easing,
}

/// Camera state as last reported by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Point under the camera.
    pub center: GeoPoint,
    /// Altitude above the surface.
    pub altitude: f64,
    /// Tilt in degrees.
    pub tilt: f64,
    /// Heading in degrees.
    pub heading: f64,
}

impl CameraPose {
    /// Pose a completed move settles on.
    pub fn settled(request: &CameraMove) -> Self {
        Self {
            center: request.target,
            altitude: request.zoom.altitude(),
            tilt: request.tilt,
            heading: request.heading,
        }
    }
}

/// Screen-space insets that the camera should treat as covered by UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Padding {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Padding {
    /// No reserved space.
    pub const NONE: Padding = Padding {
        top: 0,
        right: 0,
        bottom: 0,
        left: 0,
    };

    /// True when nothing is reserved.
    pub fn is_empty(&self) -> bool {
        *self == Padding::NONE
    }
}

/// Reasons a flight did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// A newer move replaced this one before it finished.
    #[error("camera flight superseded by a newer request")]
    Superseded,
    /// The scene stopped animating, for example during shutdown.
    #[error("camera flight interrupted: {0}")]
    Interrupted(String),
}

/// Future returned by [`SceneCamera::move_to`].
pub type FlightFuture = Pin<Box<dyn Future<Output = Result<(), CameraError>> + Send + 'static>>;

/// The rendering engine as seen by the navigation core.
pub trait SceneCamera {
    /// Begin a flight. The returned future resolves when the flight finishes
    /// or fails; it must be polled for the flight to progress.
    fn move_to(&self, request: CameraMove) -> FlightFuture;

    /// Reserve (or with [`Padding::NONE`], release) covered screen space.
    fn set_padding(&self, padding: Padding);

    /// Currently reserved screen space.
    fn padding(&self) -> Padding;

    /// Subscribe to pose changes.
    fn watch_pose(&self) -> watch::Receiver<CameraPose>;
}

/// Labels are drawn only while the camera is below `threshold`.
pub fn labels_visible(pose: &CameraPose, threshold: f64) -> bool {
    pose.altitude < threshold
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Linear, Easing::OutQuint, Easing::InOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12);
            assert_eq!(easing.apply(2.0), easing.apply(1.0));
        }
        assert!(Easing::OutQuint.apply(0.25) > Easing::Linear.apply(0.25));
    }

    #[test]
    fn label_threshold_is_exclusive() {
        let pose = |altitude| CameraPose {
            center: GeoPoint::new(0.0, 0.0),
            altitude,
            tilt: 0.0,
            heading: 0.0,
        };
        assert!(labels_visible(&pose(1_199_999.0), 1_200_000.0));
        assert!(!labels_visible(&pose(1_200_000.0), 1_200_000.0));
        assert!(!labels_visible(&pose(19_500_000.0), 1_200_000.0));
    }

    #[test]
    fn easing_names_parse_from_kebab_case() -> anyhow::Result<()> {
        let parsed: Easing = serde_json::from_str("\"out-quint\"")?;
        assert_eq!(parsed, Easing::OutQuint);
        Ok(())
    }
}
