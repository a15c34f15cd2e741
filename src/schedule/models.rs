//! Station and round time plan data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::heat::models::SegmentCode;
use crate::tournament::models::TournamentId;

/// Station ID type
pub type StationId = i64;

/// Station availability state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationStatus {
    /// Free to take scheduled heats
    Available,
    /// Mid-heat or otherwise occupied
    Busy,
    /// Out of the rotation (broken machine, no lead)
    Offline,
}

/// A physical espresso station heats are played on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station ID
    pub id: StationId,
    /// Display name, "A" / "B" / "C" in the canonical rotation
    pub name: String,
    /// Availability state
    pub status: StationStatus,
    /// Earliest time the next heat may be scheduled here
    pub next_available_at: DateTime<Utc>,
    /// Station lead on duty, if one is assigned
    pub lead_id: Option<Uuid>,
}

impl Station {
    /// Whether the scheduler may place heats on this station
    pub fn is_available(&self) -> bool {
        self.status == StationStatus::Available
    }
}

/// Per-round segment durations in minutes.
///
/// Looked up by `(tournament, round)`; when a round has no stored plan
/// the standard 10/3/2 split is created on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimePlan {
    /// Tournament this plan belongs to
    pub tournament_id: TournamentId,
    /// Round number (1-indexed)
    pub round: u32,
    /// Dial-in minutes
    pub dial_in_minutes: u32,
    /// Cappuccino minutes
    pub cappuccino_minutes: u32,
    /// Espresso minutes
    pub espresso_minutes: u32,
}

impl RoundTimePlan {
    /// Minutes of dial-in in the standard plan
    pub const STANDARD_DIAL_IN: u32 = 10;
    /// Minutes of cappuccino build in the standard plan
    pub const STANDARD_CAPPUCCINO: u32 = 3;
    /// Minutes of espresso build in the standard plan
    pub const STANDARD_ESPRESSO: u32 = 2;

    /// Create the standard 10/3/2 plan for a round
    pub fn standard(tournament_id: TournamentId, round: u32) -> Self {
        Self {
            tournament_id,
            round,
            dial_in_minutes: Self::STANDARD_DIAL_IN,
            cappuccino_minutes: Self::STANDARD_CAPPUCCINO,
            espresso_minutes: Self::STANDARD_ESPRESSO,
        }
    }

    /// Planned minutes for one segment
    pub fn minutes_for(&self, code: SegmentCode) -> u32 {
        match code {
            SegmentCode::DialIn => self.dial_in_minutes,
            SegmentCode::Cappuccino => self.cappuccino_minutes,
            SegmentCode::Espresso => self.espresso_minutes,
        }
    }

    /// Total planned minutes across the segment triple
    pub fn total_minutes(&self) -> u32 {
        self.dial_in_minutes + self.cappuccino_minutes + self.espresso_minutes
    }
}
