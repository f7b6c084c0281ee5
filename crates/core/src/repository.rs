//! Read-only event and athlete tables.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{AthleteRecord, EventRecord};

const BUNDLED_DATASET: &str = include_str!("../data/events.json");

/// Failures while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The dataset was not valid JSON of the expected shape.
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    /// The dataset contained no events.
    #[error("dataset contains no events")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    events: Vec<EventRecord>,
    #[serde(default)]
    athletes: HashMap<String, AthleteRecord>,
}

/// Events in a fixed order plus the athlete lookup table.
///
/// Indices are stable for the life of the repository.
#[derive(Debug, Clone)]
pub struct EventRepository {
    events: Vec<EventRecord>,
    athletes: HashMap<String, AthleteRecord>,
}

impl EventRepository {
    /// Build a repository from already-parsed records.
    pub fn new(
        events: Vec<EventRecord>,
        athletes: HashMap<String, AthleteRecord>,
    ) -> Result<Self, DatasetError> {
        if events.is_empty() {
            return Err(DatasetError::Empty);
        }
        let unlocated = events
            .iter()
            .filter(|event| event.location().is_none())
            .count();
        if unlocated > 0 {
            warn!(unlocated, "Dataset contains events without a point location");
        }
        Ok(Self { events, athletes })
    }

    /// Parse a `{ "events": [...], "athletes": {...} }` document.
    pub fn from_json(contents: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_str(contents)?;
        Self::new(raw.events, raw.athletes)
    }

    /// Load a dataset file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let repository = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            events = repository.len(),
            athletes = repository.athletes.len(),
            "Dataset loaded"
        );
        Ok(repository)
    }

    /// The sample dataset compiled into the crate.
    pub fn bundled() -> Result<Self, DatasetError> {
        Self::from_json(BUNDLED_DATASET)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; empty datasets are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`.
    pub fn event(&self, index: usize) -> Option<&EventRecord> {
        self.events.get(index)
    }

    /// All events in index order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Athlete by exact name.
    pub fn athlete(&self, name: &str) -> Option<&AthleteRecord> {
        self.athletes.get(name)
    }

    /// Indices of events that have a point location.
    pub fn located(&self) -> impl Iterator<Item = (usize, &EventRecord)> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.location().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "events": [
            {
                "title": "Harbour Marathon",
                "sport": "Athletics",
                "city": "Sydney",
                "country": "Australia",
                "startDate": "2026-08-30",
                "lat": -33.86,
                "lon": 151.21,
                "attendance": 40000,
                "rank": 71,
                "athletes": ["Mia Tan", "Unknown Runner"]
            },
            {
                "title": "World Breaking Tour",
                "sport": "Breaking",
                "lat": 0,
                "lon": 0,
                "attendance": 8000,
                "rank": 60
            }
        ],
        "athletes": {
            "Mia Tan": { "sport": "Athletics", "nationality": "Australia" }
        }
    }"#;

    #[test]
    fn loads_dataset_from_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("events.json");
        fs::write(&path, SAMPLE)?;

        let repository = EventRepository::load(&path)?;
        assert_eq!(repository.len(), 2);
        assert_eq!(repository.event(0).map(|e| e.title.as_str()), Some("Harbour Marathon"));
        assert!(repository.event(2).is_none());
        assert_eq!(
            repository
                .athlete("Mia Tan")
                .and_then(|a| a.nationality.as_deref()),
            Some("Australia")
        );
        assert!(repository.athlete("Unknown Runner").is_none());
        let located: Vec<usize> = repository.located().map(|(index, _)| index).collect();
        assert_eq!(located, vec![0]);
        Ok(())
    }

    #[test]
    fn rejects_empty_and_missing_datasets() {
        assert!(matches!(
            EventRepository::from_json(r#"{ "events": [] }"#),
            Err(DatasetError::Empty)
        ));
        assert!(matches!(
            EventRepository::from_json("not json"),
            Err(DatasetError::Parse(_))
        ));
        assert!(matches!(
            EventRepository::load("/definitely/not/here.json"),
            Err(DatasetError::Read { .. })
        ));
    }

    #[test]
    fn bundled_dataset_is_usable() -> Result<()> {
        let repository = EventRepository::bundled()?;
        assert!(repository.len() >= 10);
        assert!(repository.events().iter().any(|e| e.location().is_none()));
        for event in repository.events() {
            for name in &event.athletes {
                assert!(repository.athlete(name).is_some(), "missing athlete {name}");
            }
        }
        Ok(())
    }
}
