//! Shared domain models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::display;

/// Coordinates closer than this to the origin on both axes mark an event
/// without a usable point location.
pub const UNLOCATED_EPSILON: f64 = 0.01;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees, east positive.
    pub lon: f64,
    /// Latitude in degrees, north positive.
    pub lat: f64,
}

impl GeoPoint {
    /// Build a point from longitude and latitude.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A single sporting event as supplied by the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Display title.
    pub title: String,
    /// Sport category; may be a comma-joined list where the first entry is canonical.
    #[serde(default)]
    pub sport: String,
    /// Venue name, if known.
    #[serde(default)]
    pub venue_name: Option<String>,
    /// Host city.
    #[serde(default)]
    pub city: Option<String>,
    /// Host country.
    #[serde(default)]
    pub country: Option<String>,
    /// Raw `YYYY-MM-DD` start date.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Raw `YYYY-MM-DD` end date, possibly equal to the start date.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Latitude in degrees; `0.0` for multi-city entries.
    #[serde(default)]
    pub lat: f64,
    /// Longitude in degrees; `0.0` for multi-city entries.
    #[serde(default)]
    pub lon: f64,
    /// Estimated attendance across the whole event.
    #[serde(default)]
    pub attendance: u64,
    /// Popularity rank on a 0-100 scale.
    #[serde(default)]
    pub rank: f64,
    /// Names of associated athletes, used as keys into the athlete table.
    #[serde(default)]
    pub athletes: Vec<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

impl EventRecord {
    /// Lower-cased first segment of the sport list, used for table lookups.
    pub fn sport_key(&self) -> String {
        canonical_sport_key(&self.sport)
    }

    /// Point location of the event, or `None` for unlocated entries.
    ///
    /// Detection relies on the dataset placing multi-city events at (0, 0);
    /// a real venue within a hundredth of a degree of the origin on both axes
    /// would be misread as unlocated.
    pub fn location(&self) -> Option<GeoPoint> {
        if self.lat.abs() > UNLOCATED_EPSILON || self.lon.abs() > UNLOCATED_EPSILON {
            Some(GeoPoint::new(self.lon, self.lat))
        } else {
            None
        }
    }

    /// Parsed start date, `None` when missing or malformed.
    pub fn start(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(display::parse_date)
    }

    /// Parsed end date, `None` when missing or malformed.
    pub fn end(&self) -> Option<NaiveDate> {
        self.end_date.as_deref().and_then(display::parse_date)
    }

    /// Comma-joined `venue, city, country`, skipping empty parts.
    pub fn location_label(&self) -> String {
        [&self.venue_name, &self.city, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Athlete metadata keyed by name in the repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteRecord {
    /// Sport the athlete competes in.
    #[serde(default)]
    pub sport: Option<String>,
    /// Nationality as displayed.
    #[serde(default)]
    pub nationality: Option<String>,
    /// Portrait reference, if one exists.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Lower-case, trimmed first comma segment of a sport label.
pub fn canonical_sport_key(sport: &str) -> String {
    sport
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}
