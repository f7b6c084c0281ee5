//! Latest-wins bookkeeping for camera flights.

use crate::camera::CameraError;

/// Identifies one camera move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlightToken(u64);

/// What the controller should make of a settled flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightStatus {
    /// The latest flight arrived.
    Arrived,
    /// The latest flight failed; nothing is retried.
    Failed(CameraError),
    /// A newer request exists, so this completion is irrelevant.
    Stale,
}

/// Issues tokens and recognises which completion is still current.
#[derive(Debug, Default)]
pub struct FlightTracker {
    issued: u64,
    in_flight: Option<FlightToken>,
}

impl FlightTracker {
    /// Token for a new request, superseding any earlier one.
    pub fn issue(&mut self) -> FlightToken {
        self.issued += 1;
        let token = FlightToken(self.issued);
        self.in_flight = Some(token);
        token
    }

    /// Record a completion and classify it.
    pub fn settle(&mut self, token: FlightToken, result: Result<(), CameraError>) -> FlightStatus {
        if self.in_flight != Some(token) {
            return FlightStatus::Stale;
        }
        self.in_flight = None;
        match result {
            Ok(()) => FlightStatus::Arrived,
            Err(err) => FlightStatus::Failed(err),
        }
    }

    /// Whether the most recent request is still travelling.
    pub fn is_flying(&self) -> bool {
        self.in_flight.is_some()
    }
}
