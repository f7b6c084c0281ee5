//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.json` in the user's
//! config directory, then `EVENTGLOBE_*` environment variables (nested keys
//! joined with `__`, e.g. `EVENTGLOBE_NAVIGATION__AUTO_INTERVAL_MS=8000`).

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{camera::Easing, camera::Padding, models::GeoPoint, ticker::CardLayout};

const APP_DIR: &str = "eventglobe";
const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "EVENTGLOBE";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset file; the bundled sample is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    /// Start auto-advance as soon as the scene is ready. Off by default; the
    /// dashboard opens in manual mode.
    pub auto_start: bool,
    /// Hard limit on how long the splash may stay up.
    pub splash_timeout_ms: u64,
    /// Camera and timer behaviour.
    pub navigation: NavigationSettings,
    /// Ticker card geometry in surface units.
    pub ticker: CardLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            auto_start: false,
            splash_timeout_ms: 12_000,
            navigation: NavigationSettings::default(),
            ticker: CardLayout::default(),
        }
    }
}

/// Where the global view parks the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    /// Longitude of the point under the camera.
    pub lon: f64,
    /// Latitude of the point under the camera.
    pub lat: f64,
    /// Altitude of the full-globe view.
    pub altitude: f64,
}

impl HomeView {
    /// Point under the camera.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lon, self.lat)
    }
}

/// Settings consumed by the navigation controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Delay between auto-advance steps.
    pub auto_interval_ms: u64,
    /// Length of every camera flight.
    pub flight_ms: u64,
    /// Easing curve for flights.
    pub easing: Easing,
    /// Tilt used when flying to an event from the ticker or timer.
    pub overview_tilt: f64,
    /// Ground scale of the close-up framing.
    pub close_up_scale: f64,
    /// Tilt of the close-up framing.
    pub close_up_tilt: f64,
    /// Global view pose.
    pub home: HomeView,
    /// Labels show below this altitude.
    pub label_altitude: f64,
    /// Space reserved for the detail panel during close-ups.
    pub panel_padding: Padding,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            auto_interval_ms: 5_000,
            flight_ms: 3_000,
            easing: Easing::OutQuint,
            overview_tilt: 18.0,
            close_up_scale: 3_000.0,
            close_up_tilt: 60.0,
            home: HomeView {
                lon: -30.0,
                lat: 22.0,
                altitude: 19_500_000.0,
            },
            label_altitude: 1_200_000.0,
            panel_padding: Padding {
                top: 0,
                right: 46,
                bottom: 0,
                left: 0,
            },
        }
    }
}

impl NavigationSettings {
    /// Auto-advance period.
    pub fn auto_interval(&self) -> Duration {
        Duration::from_millis(self.auto_interval_ms.max(1))
    }

    /// Camera flight length.
    pub fn flight_duration(&self) -> Duration {
        Duration::from_millis(self.flight_ms)
    }
}

/// Directory holding `config.json`.
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| anyhow!("unable to determine the user config directory"))
}

/// Default location of the config file.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Write the default config file if none exists yet, returning its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default config")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}

impl AppConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path()?)
    }

    /// Load with `path` as the file layer. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(
                Config::try_from(&AppConfig::default())
                    .context("failed to build default config layer")?,
            )
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }
}
