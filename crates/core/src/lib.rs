#![warn(clippy::all, missing_docs)]

//! Core logic for the event globe dashboard.
//!
//! This crate hosts the event data models, opportunity scoring, the
//! navigation state machine that keeps camera, ticker and detail panel in
//! step, and configuration handling. Rendering lives in frontends that
//! implement [`camera::SceneCamera`].

pub mod camera;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod models;
pub mod navigation;
pub mod popup;
pub mod repository;
pub mod scoring;
pub mod ticker;

pub use camera::{CameraError, CameraMove, CameraPose, Easing, Padding, SceneCamera, Zoom};
pub use config::AppConfig;
pub use dispatch::{Dashboard, Interaction};
pub use models::{AthleteRecord, EventRecord, GeoPoint};
pub use navigation::{NavigationState, Navigator, Signal};
pub use popup::{PopupPresenter, PopupView};
pub use repository::{DatasetError, EventRepository};
pub use scoring::{FactorKind, OpportunityFactor};
pub use ticker::{CardLayout, TickerStrip};
