//! Formatting helpers shared by the ticker, popup and globe labels.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::canonical_sport_key;

/// Placeholder shown when an event has no usable start date.
pub const DATE_UNKNOWN: &str = "Date TBD";

/// Globe labels longer than this are shortened.
const LABEL_MAX_CHARS: usize = 30;
const LABEL_KEEP_CHARS: usize = 28;

/// 24-bit sport accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SportColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl SportColor {
    const fn hex(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    /// Neutral grey used for sports without an assigned color.
    pub const FALLBACK: SportColor = SportColor::hex(0x888888);
}

static SPORT_COLORS: Lazy<HashMap<&'static str, SportColor>> = Lazy::new(|| {
    HashMap::from([
        ("tennis", SportColor::hex(0x4CAF50)),
        ("athletics", SportColor::hex(0xFF6B35)),
        ("golf", SportColor::hex(0xA07840)),
        ("basketball", SportColor::hex(0xFF9800)),
        ("soccer", SportColor::hex(0x2196F3)),
        ("swimming", SportColor::hex(0x00BCD4)),
        ("skateboarding", SportColor::hex(0xAB47BC)),
        ("gymnastics", SportColor::hex(0xEC407A)),
        ("breaking", SportColor::hex(0xFFC107)),
        ("boxing", SportColor::hex(0xEF5350)),
        ("fencing", SportColor::hex(0x78909C)),
        ("paralympic", SportColor::hex(0x26A69A)),
        ("cycling", SportColor::hex(0xC6D837)),
        ("triathlon", SportColor::hex(0x5C6BC0)),
    ])
});

/// Accent color for a sport label; unknown sports fall back to grey.
pub fn sport_color(sport: &str) -> SportColor {
    SPORT_COLORS
        .get(canonical_sport_key(sport).as_str())
        .copied()
        .unwrap_or(SportColor::FALLBACK)
}

/// Parse a `YYYY-MM-DD` prefix. Anything shorter than ten characters is unknown.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Human readable date range used in the detail panel.
pub fn format_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let Some(start) = start else {
        return DATE_UNKNOWN.to_string();
    };
    match end {
        None => start.format("%B %-d, %Y").to_string(),
        Some(end) if end == start => start.format("%B %-d, %Y").to_string(),
        Some(end) if end.year() == start.year() && end.month() == start.month() => format!(
            "{} {}–{}, {}",
            start.format("%B"),
            start.day(),
            end.day(),
            start.year()
        ),
        Some(end) => format!("{} – {}", start.format("%b %-d"), end.format("%b %-d, %Y")),
    }
}

/// Month, day and year columns printed on a ticker card.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CardDate {
    pub month: String,
    pub day: String,
    pub year: String,
}

impl CardDate {
    /// Split an event's dates into card columns, using dashes when unknown.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let Some(start) = start else {
            return Self {
                month: "---".to_string(),
                day: "--".to_string(),
                year: "----".to_string(),
            };
        };
        let day = match end {
            Some(end) if end.day() != start.day() => format!("{}–{}", start.day(), end.day()),
            _ => start.day().to_string(),
        };
        Self {
            month: start.format("%b").to_string().to_uppercase(),
            day,
            year: start.year().to_string(),
        }
    }
}

/// Integer with `,` thousands separators.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Globe label text, shortened with an ellipsis past thirty characters.
pub fn label_text(title: &str) -> String {
    if title.chars().count() > LABEL_MAX_CHARS {
        let mut short: String = title.chars().take(LABEL_KEEP_CHARS).collect();
        short.push('…');
        short
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn short_or_missing_dates_are_unknown() {
        assert_eq!(parse_date("2026-6-1"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2026-13-01"), None);
        assert_eq!(parse_date("2026-06-01T10:00:00"), date(2026, 6, 1));
        assert_eq!(format_range(None, date(2026, 6, 1)), DATE_UNKNOWN);
    }

    #[test]
    fn formats_ranges() {
        assert_eq!(format_range(date(2026, 6, 5), None), "June 5, 2026");
        assert_eq!(
            format_range(date(2026, 6, 5), date(2026, 6, 5)),
            "June 5, 2026"
        );
        assert_eq!(
            format_range(date(2026, 6, 5), date(2026, 6, 9)),
            "June 5–9, 2026"
        );
        assert_eq!(
            format_range(date(2026, 6, 28), date(2026, 7, 2)),
            "Jun 28 – Jul 2, 2026"
        );
    }

    #[test]
    fn card_dates() {
        let card = CardDate::new(date(2026, 8, 31), date(2026, 9, 13));
        assert_eq!(card.month, "AUG");
        assert_eq!(card.day, "31–13");
        assert_eq!(card.year, "2026");

        let unknown = CardDate::new(None, None);
        assert_eq!(unknown.month, "---");
        assert_eq!(unknown.year, "----");
    }

    #[test]
    fn separates_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(600_000), "600,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn colors_by_canonical_sport() {
        assert_eq!(sport_color("Tennis, Padel"), SportColor::hex(0x4CAF50));
        assert_eq!(sport_color("Curling"), SportColor::FALLBACK);
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(label_text("Short Title"), "Short Title");
        let long = "International Championship of Everything";
        let label = label_text(long);
        assert_eq!(label.chars().count(), 29);
        assert!(label.ends_with('…'));
    }
}
