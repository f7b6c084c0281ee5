//! Detail panel view model.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::{
    camera::{Padding, SceneCamera},
    display::{self, SportColor},
    models::AthleteRecord,
    repository::EventRepository,
    scoring::{self, OpportunityFactor},
};

/// Portrait shown on an athlete badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Portrait {
    /// Image reference from the athlete table.
    Image(String),
    /// Upper-cased first letter of the name.
    Initial(char),
}

/// One athlete row in the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AthleteBadge {
    /// Athlete name as listed on the event.
    pub name: String,
    /// Portrait or placeholder.
    pub portrait: Portrait,
    /// `sport · nationality`, empty parts skipped.
    pub detail: String,
}

impl AthleteBadge {
    fn resolve(name: &str, record: Option<&AthleteRecord>) -> Self {
        let portrait = record
            .and_then(|athlete| athlete.image_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| Portrait::Image(url.to_string()))
            .unwrap_or_else(|| Portrait::Initial(initial(name)));
        let detail = record
            .map(|athlete| {
                [&athlete.sport, &athlete.nationality]
                    .into_iter()
                    .filter_map(|part| part.as_deref())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" · ")
            })
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            portrait,
            detail,
        }
    }
}

fn initial(name: &str) -> char {
    name.trim()
        .chars()
        .next()
        .and_then(|ch| ch.to_uppercase().next())
        .unwrap_or('?')
}

/// Everything the panel shows for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupView {
    /// Event index the view was built from.
    pub index: usize,
    /// Upper-cased sport label.
    pub sport: String,
    /// Sport accent color.
    pub color: SportColor,
    /// Event title.
    pub title: String,
    /// Formatted date range.
    pub dates: String,
    /// `venue, city, country`.
    pub location: String,
    /// Attendance line.
    pub attendance: String,
    /// Free-text description, if any.
    pub description: Option<String>,
    /// Associated athletes in dataset order.
    pub athletes: Vec<AthleteBadge>,
    /// Top opportunity factors, strongest first.
    pub factors: Vec<OpportunityFactor>,
}

impl PopupView {
    /// Compose the view for event `index`, or `None` when out of range.
    pub fn build(repository: &EventRepository, index: usize, today: NaiveDate) -> Option<Self> {
        let event = repository.event(index)?;
        let athletes = event
            .athletes
            .iter()
            .map(|name| AthleteBadge::resolve(name, repository.athlete(name)))
            .collect();
        Some(Self {
            index,
            sport: event.sport.to_uppercase(),
            color: display::sport_color(&event.sport),
            title: event.title.clone(),
            dates: display::format_range(event.start(), event.end()),
            location: event.location_label(),
            attendance: format!("{} est. attendance", display::thousands(event.attendance)),
            description: event
                .description
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            athletes,
            factors: scoring::score(event, today),
        })
    }
}

/// Open/closed state of the detail panel.
#[derive(Debug, Default)]
pub struct PopupPresenter {
    view: Option<PopupView>,
}

impl PopupPresenter {
    /// Currently shown view.
    pub fn view(&self) -> Option<&PopupView> {
        self.view.as_ref()
    }

    /// Whether the panel is showing.
    pub fn is_open(&self) -> bool {
        self.view.is_some()
    }

    /// Show event `index`, replacing whatever was shown. Returns `false` and
    /// leaves the panel untouched for out-of-range indices.
    pub fn open(&mut self, repository: &EventRepository, index: usize, today: NaiveDate) -> bool {
        match PopupView::build(repository, index, today) {
            Some(view) => {
                debug!(index, title = %view.title, "Opening detail panel");
                self.view = Some(view);
                true
            }
            None => false,
        }
    }

    /// Hide the panel and release reserved padding. Padding is cleared even
    /// when the panel was already closed.
    pub fn close(&mut self, camera: &impl SceneCamera) {
        if self.view.take().is_some() {
            debug!("Closing detail panel");
        }
        camera.set_padding(Padding::NONE);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{camera::testing::RecordingCamera, models::EventRecord, scoring::TOP_FACTORS};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn repository() -> EventRepository {
        let event = EventRecord {
            title: "Harbour Open".to_string(),
            sport: "Tennis".to_string(),
            venue_name: Some("Harbour Park".to_string()),
            city: Some("Auckland".to_string()),
            country: Some("New Zealand".to_string()),
            start_date: Some("2026-06-05".to_string()),
            end_date: Some("2026-06-09".to_string()),
            lat: -36.85,
            lon: 174.76,
            attendance: 120_000,
            rank: 81.0,
            athletes: vec!["Ana Lopes".to_string(), "kai Roa".to_string()],
            description: Some("  ".to_string()),
        };
        let untitled = EventRecord {
            title: "Regional Qualifier".to_string(),
            sport: "Fencing".to_string(),
            start_date: Some("2026".to_string()),
            athletes: Vec::new(),
            ..event.clone()
        };
        let athletes = HashMap::from([(
            "Ana Lopes".to_string(),
            AthleteRecord {
                sport: Some("Tennis".to_string()),
                nationality: Some("Brazil".to_string()),
                image_url: Some("https://img.test/ana.jpg".to_string()),
            },
        )]);
        EventRepository::new(vec![event, untitled], athletes).unwrap()
    }

    #[test]
    fn builds_full_view() {
        let repository = repository();
        let view = PopupView::build(&repository, 0, today()).unwrap();
        assert_eq!(view.sport, "TENNIS");
        assert_eq!(view.color, display::sport_color("tennis"));
        assert_eq!(view.dates, "June 5–9, 2026");
        assert_eq!(view.location, "Harbour Park, Auckland, New Zealand");
        assert_eq!(view.attendance, "120,000 est. attendance");
        assert_eq!(view.description, None);
        assert_eq!(view.factors.len(), TOP_FACTORS);

        assert_eq!(
            view.athletes[0].portrait,
            Portrait::Image("https://img.test/ana.jpg".to_string())
        );
        assert_eq!(view.athletes[0].detail, "Tennis · Brazil");
        // Not in the athlete table.
        assert_eq!(view.athletes[1].portrait, Portrait::Initial('K'));
        assert_eq!(view.athletes[1].detail, "");
    }

    #[test]
    fn short_date_shows_placeholder() {
        let view = PopupView::build(&repository(), 1, today()).unwrap();
        assert_eq!(view.dates, display::DATE_UNKNOWN);
        assert!(view.athletes.is_empty());
    }

    #[test]
    fn open_replaces_and_rejects_out_of_range() {
        let repository = repository();
        let mut popup = PopupPresenter::default();
        assert!(popup.open(&repository, 0, today()));
        assert!(popup.open(&repository, 1, today()));
        assert_eq!(popup.view().map(|view| view.index), Some(1));

        assert!(!popup.open(&repository, 7, today()));
        assert_eq!(popup.view().map(|view| view.index), Some(1));
    }

    #[test]
    fn closing_twice_leaves_no_padding() {
        let repository = repository();
        let camera = RecordingCamera::new();
        let mut popup = PopupPresenter::default();

        for _ in 0..2 {
            camera.set_padding(Padding {
                top: 0,
                right: 46,
                bottom: 0,
                left: 0,
            });
            popup.open(&repository, 0, today());
            popup.close(&camera);
            assert!(!popup.is_open());
            assert!(camera.padding().is_empty());
        }

        camera.set_padding(Padding {
            top: 1,
            right: 1,
            bottom: 1,
            left: 1,
        });
        popup.close(&camera);
        assert!(camera.padding().is_empty());
    }
}
