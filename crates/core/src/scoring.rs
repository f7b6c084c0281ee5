//! Opportunity scoring for the detail panel.
//!
//! Five factors are derived from an event and the current date, then the
//! three strongest are shown. Each factor keeps its score tiers and its
//! rationale wording in a single table so the two can never disagree about
//! where a boundary sits.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{display::thousands, models::EventRecord};

/// Number of factors kept after ranking.
pub const TOP_FACTORS: usize = 3;

/// Highest score any factor may report.
pub const MAX_SCORE: u8 = 99;

/// Days assumed when an event has no usable start date.
const UNKNOWN_DAYS_OUT: i64 = 60;

/// Score for sports missing from the priority table.
const DEFAULT_MARKET_FIT: u8 = 65;

/// The fixed scoring dimensions, in computation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FactorKind {
    /// Broadcast and media reach, taken from the popularity rank.
    MediaExposure,
    /// Number of associated athletes attending.
    AthletePresence,
    /// Estimated attendance.
    FanEngagement,
    /// Lead time before the event starts.
    SupplyChainReadiness,
    /// Priority of the sport category.
    StrategicMarketFit,
}

impl FactorKind {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            FactorKind::MediaExposure => "Media Exposure",
            FactorKind::AthletePresence => "Athlete Presence",
            FactorKind::FanEngagement => "Fan Engagement",
            FactorKind::SupplyChainReadiness => "Supply Chain Readiness",
            FactorKind::StrategicMarketFit => "Strategic Market Fit",
        }
    }
}

/// One scored dimension with its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpportunityFactor {
    /// Which dimension this is.
    pub kind: FactorKind,
    /// Score in `0..=99`.
    pub score: u8,
    /// Human readable justification.
    pub rationale: String,
}

impl OpportunityFactor {
    /// Display label of the factor.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Top three factors for `event`, strongest first.
///
/// Ties keep computation order. The result depends only on the arguments.
pub fn score(event: &EventRecord, today: NaiveDate) -> Vec<OpportunityFactor> {
    let mut factors = factors(event, today).to_vec();
    factors.sort_by(|a, b| b.score.cmp(&a.score));
    factors.truncate(TOP_FACTORS);
    factors
}

/// All five factors in computation order.
pub fn factors(event: &EventRecord, today: NaiveDate) -> [OpportunityFactor; 5] {
    [
        media_exposure(event),
        athlete_presence(event),
        fan_engagement(event),
        supply_chain_readiness(event, today),
        strategic_market_fit(event),
    ]
}

#[derive(Clone, Copy)]
enum MediaReach {
    Global,
    Major,
    Growing,
}

/// Rationale tiers keyed on the minimum rank.
const MEDIA_TIERS: &[(u8, MediaReach)] = &[
    (90, MediaReach::Global),
    (75, MediaReach::Major),
    (0, MediaReach::Growing),
];

fn media_exposure(event: &EventRecord) -> OpportunityFactor {
    let score = event.rank.round().clamp(0.0, f64::from(MAX_SCORE)) as u8;
    let reach = MEDIA_TIERS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, reach)| *reach)
        .unwrap_or(MediaReach::Growing);
    let rationale = match reach {
        MediaReach::Global => {
            "Global broadcast reaching 100M+ viewers; maximum apparel and logo visibility window"
        }
        MediaReach::Major => {
            "Major event with broad media coverage and high digital and streaming engagement"
        }
        MediaReach::Growing => {
            "Growing event with strong community reach and social media amplification potential"
        }
    };
    OpportunityFactor {
        kind: FactorKind::MediaExposure,
        score,
        rationale: rationale.to_string(),
    }
}

fn athlete_presence(event: &EventRecord) -> OpportunityFactor {
    let count = event.athletes.len();
    let score = (12 + 20 * count).min(usize::from(MAX_SCORE)) as u8;
    let rationale = if count == 0 {
        "No current designees; prime opportunity to scout and activate emerging talent on-site"
            .to_string()
    } else {
        let mut names = event
            .athletes
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if count > 2 {
            names.push_str(&format!(" +{} more", count - 2));
        }
        let (noun, verb) = if count == 1 {
            ("athlete", "guarantees")
        } else {
            ("athletes", "guarantee")
        };
        format!("{names} · {count} partner {noun} {verb} on-event brand visibility")
    };
    OpportunityFactor {
        kind: FactorKind::AthletePresence,
        score,
        rationale,
    }
}

#[derive(Clone, Copy)]
enum CrowdScale {
    Stadium,
    InVenue,
    Community,
}

/// `(minimum attendance, score, rationale tier)`, highest first.
const ATTENDANCE_TIERS: &[(u64, u8, CrowdScale)] = &[
    (500_000, 95, CrowdScale::Stadium),
    (200_000, 85, CrowdScale::Stadium),
    (100_000, 74, CrowdScale::InVenue),
    (50_000, 62, CrowdScale::InVenue),
    (20_000, 50, CrowdScale::Community),
    (0, 35, CrowdScale::Community),
];

fn fan_engagement(event: &EventRecord) -> OpportunityFactor {
    let attendance = event.attendance;
    let (score, scale) = ATTENDANCE_TIERS
        .iter()
        .find(|(floor, _, _)| attendance >= *floor)
        .map(|(_, score, scale)| (*score, *scale))
        .unwrap_or((35, CrowdScale::Community));
    let pitch = match scale {
        CrowdScale::Stadium => "stadium-scale retail activation and experiential marketing",
        CrowdScale::InVenue => "strong in-venue brand presence and direct consumer touchpoints",
        CrowdScale::Community => "targeted community engagement and grassroots brand building",
    };
    OpportunityFactor {
        kind: FactorKind::FanEngagement,
        score,
        rationale: format!("{} est. attendees · {pitch}", thousands(attendance)),
    }
}

#[derive(Clone, Copy)]
enum LeadTime {
    Full,
    Adequate,
    Expedited,
    Critical,
}

/// `(days strictly greater than, score, rationale tier)`, longest lead first.
const LEAD_TIME_TIERS: &[(i64, u8, LeadTime)] = &[
    (120, 92, LeadTime::Full),
    (90, 80, LeadTime::Adequate),
    (60, 65, LeadTime::Adequate),
    (30, 48, LeadTime::Expedited),
    (14, 32, LeadTime::Critical),
    (i64::MIN, 18, LeadTime::Critical),
];

/// Whole days from `today` until the event starts, 60 when unknown.
pub fn days_out(event: &EventRecord, today: NaiveDate) -> i64 {
    event
        .start()
        .map(|start| (start - today).num_days())
        .unwrap_or(UNKNOWN_DAYS_OUT)
}

fn supply_chain_readiness(event: &EventRecord, today: NaiveDate) -> OpportunityFactor {
    let days = days_out(event, today);
    let (score, lead) = LEAD_TIME_TIERS
        .iter()
        .find(|(above, _, _)| days > *above)
        .map(|(_, score, lead)| (*score, *lead))
        .unwrap_or((18, LeadTime::Critical));
    let plan = match lead {
        LeadTime::Full => {
            "full lead time available for complete assortment and regional distribution"
        }
        LeadTime::Adequate => "adequate window for priority SKU allocation and logistics coordination",
        LeadTime::Expedited => "expedited fulfillment needed; focus on hero product lines",
        LeadTime::Critical => "critical timeline; execute on in-stock inventory only",
    };
    OpportunityFactor {
        kind: FactorKind::SupplyChainReadiness,
        score,
        rationale: format!("{days} days out · {plan}"),
    }
}

static SPORT_PRIORITY: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        ("basketball", 94),
        ("tennis", 90),
        ("athletics", 87),
        ("soccer", 85),
        ("skateboarding", 82),
        ("breaking", 80),
        ("paralympic", 78),
        ("gymnastics", 74),
        ("swimming", 72),
        ("golf", 70),
        ("boxing", 66),
        ("cycling", 63),
        ("triathlon", 61),
        ("fencing", 55),
    ])
});

#[derive(Clone, Copy)]
enum MarketRole {
    Priority,
    Adjacency,
    Specialist,
}

const MARKET_TIERS: &[(u8, MarketRole)] = &[
    (85, MarketRole::Priority),
    (70, MarketRole::Adjacency),
    (0, MarketRole::Specialist),
];

fn strategic_market_fit(event: &EventRecord) -> OpportunityFactor {
    let score = SPORT_PRIORITY
        .get(event.sport_key().as_str())
        .copied()
        .unwrap_or(DEFAULT_MARKET_FIT);
    let role = MARKET_TIERS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, role)| *role)
        .unwrap_or(MarketRole::Specialist);
    let sport = event.sport.trim();
    let rationale = match role {
        MarketRole::Priority => format!(
            "{sport} is a priority growth category aligned with the global performance and culture narrative"
        ),
        MarketRole::Adjacency => format!(
            "{sport} is a strategic adjacency with lifestyle crossover and youth audience appeal"
        ),
        MarketRole::Specialist => format!(
            "{sport} offers specialist community depth and authentic brand affinity opportunities"
        ),
    };
    OpportunityFactor {
        kind: FactorKind::StrategicMarketFit,
        score,
        rationale,
    }
}
