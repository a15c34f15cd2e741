//! Heat and segment data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::heat::errors::HeatError;
use crate::schedule::models::StationId;
use crate::tournament::models::{ParticipantId, TournamentId};

/// Heat ID type
pub type HeatId = i64;

/// Segment ID type
pub type SegmentId = i64;

/// Heat lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeatStatus {
    /// Created but not yet staged at a station
    Pending,
    /// Staged and waiting for the first segment
    Ready,
    /// At least one segment has started
    Running,
    /// Winner decided (or bye)
    Done,
}

/// The three timed segments every heat runs, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentCode {
    /// Untimed-score warmup where competitors dial in their grinders
    DialIn,
    /// Cappuccino build, the only segment judged for latte art
    Cappuccino,
    /// Espresso build
    Espresso,
}

impl SegmentCode {
    /// All segments in running order
    pub const ALL: [SegmentCode; 3] = [
        SegmentCode::DialIn,
        SegmentCode::Cappuccino,
        SegmentCode::Espresso,
    ];

    /// The segment that must end before this one may start
    pub fn predecessor(self) -> Option<SegmentCode> {
        match self {
            SegmentCode::DialIn => None,
            SegmentCode::Cappuccino => Some(SegmentCode::DialIn),
            SegmentCode::Espresso => Some(SegmentCode::Cappuccino),
        }
    }

    /// Canonical wire name
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentCode::DialIn => "DIAL_IN",
            SegmentCode::Cappuccino => "CAPPUCCINO",
            SegmentCode::Espresso => "ESPRESSO",
        }
    }
}

impl fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SegmentCode {
    type Err = HeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DIAL_IN" => Ok(SegmentCode::DialIn),
            "CAPPUCCINO" => Ok(SegmentCode::Cappuccino),
            "ESPRESSO" => Ok(SegmentCode::Espresso),
            _ => Err(HeatError::InvalidSegment(s.to_string())),
        }
    }
}

/// Segment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentStatus {
    /// Not yet started
    Idle,
    /// Clock running
    Running,
    /// Stopped, may never restart
    Ended,
}

/// A single head-to-head heat in the bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heat {
    /// Heat ID
    pub id: HeatId,
    /// Tournament this heat belongs to
    pub tournament_id: TournamentId,
    /// Round number (1-indexed)
    pub round: u32,
    /// Position within the tournament, unique and ascending
    pub heat_number: u32,
    /// Station the heat is scheduled on, none for byes
    pub station_id: Option<StationId>,
    /// First competitor
    pub competitor1_id: ParticipantId,
    /// Second competitor, none for byes
    pub competitor2_id: Option<ParticipantId>,
    /// Lifecycle state
    pub status: HeatStatus,
    /// Winner, set when the heat completes
    pub winner_id: Option<ParticipantId>,
    /// Slot the scheduler reserved on the station
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the first segment actually started
    pub started_at: Option<DateTime<Utc>>,
    /// When the heat completed
    pub ended_at: Option<DateTime<Utc>>,
}

impl Heat {
    /// Whether this heat is a bye (single competitor, auto-advanced)
    pub fn is_bye(&self) -> bool {
        self.competitor2_id.is_none()
    }

    /// Both competitors of a contested heat, if it has two
    pub fn competitors(&self) -> Option<(ParticipantId, ParticipantId)> {
        self.competitor2_id.map(|c2| (self.competitor1_id, c2))
    }

    /// The competitor who lost, once a contested heat has a winner
    pub fn loser_id(&self) -> Option<ParticipantId> {
        let (c1, c2) = self.competitors()?;
        match self.winner_id {
            Some(winner) if winner == c1 => Some(c2),
            Some(winner) if winner == c2 => Some(c1),
            _ => None,
        }
    }
}

/// Heat creation payload, ID assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHeat {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub heat_number: u32,
    pub station_id: Option<StationId>,
    pub competitor1_id: ParticipantId,
    pub competitor2_id: Option<ParticipantId>,
    pub status: HeatStatus,
    pub winner_id: Option<ParticipantId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl NewHeat {
    /// Create a contested heat scheduled on a station
    pub fn pairing(
        tournament_id: TournamentId,
        round: u32,
        heat_number: u32,
        competitor1_id: ParticipantId,
        competitor2_id: ParticipantId,
        station_id: StationId,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tournament_id,
            round,
            heat_number,
            station_id: Some(station_id),
            competitor1_id,
            competitor2_id: Some(competitor2_id),
            status: HeatStatus::Pending,
            winner_id: None,
            scheduled_at: Some(scheduled_at),
            started_at: None,
            ended_at: None,
        }
    }

    /// Create a bye heat, born complete with its sole competitor as winner
    pub fn bye(
        tournament_id: TournamentId,
        round: u32,
        heat_number: u32,
        competitor_id: ParticipantId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tournament_id,
            round,
            heat_number,
            station_id: None,
            competitor1_id: competitor_id,
            competitor2_id: None,
            status: HeatStatus::Done,
            winner_id: Some(competitor_id),
            scheduled_at: None,
            started_at: Some(now),
            ended_at: Some(now),
        }
    }
}

/// One timed segment of a heat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatSegment {
    /// Segment ID
    pub id: SegmentId,
    /// Heat this segment belongs to
    pub heat_id: HeatId,
    /// Which of the fixed triple this is
    pub code: SegmentCode,
    /// Lifecycle state
    pub status: SegmentStatus,
    /// Minutes allotted by the round time plan
    pub planned_minutes: u32,
    /// When the clock started
    pub started_at: Option<DateTime<Utc>>,
    /// When the clock stopped
    pub ended_at: Option<DateTime<Utc>>,
}

/// Segment creation payload, ID assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHeatSegment {
    pub heat_id: HeatId,
    pub code: SegmentCode,
    pub planned_minutes: u32,
}

impl NewHeatSegment {
    /// Create an idle segment with its planned duration
    pub fn new(heat_id: HeatId, code: SegmentCode, planned_minutes: u32) -> Self {
        Self {
            heat_id,
            code,
            planned_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_code_order() {
        assert_eq!(SegmentCode::DialIn.predecessor(), None);
        assert_eq!(
            SegmentCode::Cappuccino.predecessor(),
            Some(SegmentCode::DialIn)
        );
        assert_eq!(
            SegmentCode::Espresso.predecessor(),
            Some(SegmentCode::Cappuccino)
        );
    }

    #[test]
    fn test_segment_code_parse() {
        assert_eq!(
            "CAPPUCCINO".parse::<SegmentCode>().unwrap(),
            SegmentCode::Cappuccino
        );
        assert_eq!(
            "dial_in".parse::<SegmentCode>().unwrap(),
            SegmentCode::DialIn
        );
        assert!(matches!(
            "LATTE".parse::<SegmentCode>(),
            Err(HeatError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_segment_code_round_trips_display() {
        for code in SegmentCode::ALL {
            assert_eq!(code.as_str().parse::<SegmentCode>().unwrap(), code);
        }
    }

    #[test]
    fn test_bye_heat_is_born_complete() {
        let now = Utc::now();
        let bye = NewHeat::bye(1, 1, 1, 42, now);
        assert_eq!(bye.status, HeatStatus::Done);
        assert_eq!(bye.winner_id, Some(42));
        assert_eq!(bye.competitor2_id, None);
        assert_eq!(bye.station_id, None);
        assert_eq!(bye.started_at, Some(now));
        assert_eq!(bye.ended_at, Some(now));
    }

    #[test]
    fn test_loser_of_decided_heat() {
        let heat = Heat {
            id: 1,
            tournament_id: 1,
            round: 1,
            heat_number: 2,
            station_id: Some(1),
            competitor1_id: 10,
            competitor2_id: Some(20),
            status: HeatStatus::Done,
            winner_id: Some(20),
            scheduled_at: None,
            started_at: None,
            ended_at: None,
        };
        assert_eq!(heat.loser_id(), Some(10));
        assert!(!heat.is_bye());
    }
}
