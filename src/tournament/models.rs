//! Tournament and participant data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = i64;

/// Participant ID type
pub type ParticipantId = i64;

/// Tournament lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    /// Accepting registrations, no bracket yet
    Registration,
    /// Bracket generated, heats being played
    InProgress,
    /// Champion decided
    Completed,
    /// Abandoned before a champion was decided
    Cancelled,
}

/// How judge roles map onto beverages for a tournament.
///
/// Pooled panels treat every judge as an interchangeable sensory judge.
/// Specialized panels bind cappuccino and espresso judges to their own
/// beverage while sensory judges may score either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgingModel {
    /// Any judge may submit a ballot for any beverage
    #[default]
    Pooled,
    /// Cappuccino and espresso judges are restricted to their beverage
    Specialized,
}

/// Per-tournament configuration, stored alongside the tournament row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Judge panel model for this tournament
    pub judging_model: JudgingModel,
}

impl TournamentConfig {
    /// Create a pooled-panel configuration
    pub fn pooled() -> Self {
        Self {
            judging_model: JudgingModel::Pooled,
        }
    }

    /// Create a specialized-panel configuration
    pub fn specialized() -> Self {
        Self {
            judging_model: JudgingModel::Specialized,
        }
    }
}

/// Tournament information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    /// Tournament ID
    pub id: TournamentId,
    /// Display name
    pub name: String,
    /// Current state
    pub status: TournamentStatus,
    /// Judging configuration
    pub config: TournamentConfig,
    /// Live round number (1-indexed, 0 before the bracket exists)
    pub current_round: u32,
    /// Total rounds the bracket will run, fixed at generation time
    pub total_rounds: u32,
    /// Champion, set when the final heat is decided
    pub winner_id: Option<ParticipantId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// When the bracket was generated
    pub started_at: Option<DateTime<Utc>>,
    /// When the champion was decided or the tournament was cancelled
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Whether the live round is the bracket's last
    pub fn in_final_round(&self) -> bool {
        self.total_rounds > 0 && self.current_round == self.total_rounds
    }

    /// The kind of round currently being played
    pub fn current_round_type(&self) -> RoundType {
        RoundType::for_round(self.current_round, self.total_rounds)
    }
}

/// Kind of a round, derived from its position in the bracket.
///
/// Never stored; recomputed from `(round, total_rounds)` wherever a
/// label is needed so re-seeded brackets cannot carry stale names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundType {
    /// Any round before the last two
    Qualifying,
    /// Second-to-last round
    Semifinal,
    /// Last round
    Final,
}

impl RoundType {
    /// Derive the round kind from a round number and the bracket length
    pub fn for_round(round: u32, total_rounds: u32) -> Self {
        if total_rounds > 0 && round >= total_rounds {
            RoundType::Final
        } else if total_rounds > 1 && round == total_rounds - 1 {
            RoundType::Semifinal
        } else {
            RoundType::Qualifying
        }
    }
}

impl std::fmt::Display for RoundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RoundType::Qualifying => "QUALIFYING",
            RoundType::Semifinal => "SEMIFINAL",
            RoundType::Final => "FINAL",
        };
        write!(f, "{label}")
    }
}

/// A competitor registered in a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID
    pub id: ParticipantId,
    /// Tournament this participant belongs to
    pub tournament_id: TournamentId,
    /// Display name
    pub display_name: String,
    /// Bracket seed (1 is the strongest)
    pub seed: u32,
    /// Points accumulated across completed rounds
    pub cumulative_score: i64,
    /// Round in which this participant was knocked out, if any
    pub eliminated_round: Option<u32>,
    /// Final placement (1 for the champion)
    pub final_rank: Option<u32>,
}

impl Participant {
    /// Whether this participant is still alive in the bracket
    pub fn is_active(&self) -> bool {
        self.eliminated_round.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_type_derivation() {
        // Three-round bracket: qualifying, semifinal, final.
        assert_eq!(RoundType::for_round(1, 3), RoundType::Qualifying);
        assert_eq!(RoundType::for_round(2, 3), RoundType::Semifinal);
        assert_eq!(RoundType::for_round(3, 3), RoundType::Final);
    }

    #[test]
    fn test_round_type_two_round_bracket() {
        assert_eq!(RoundType::for_round(1, 2), RoundType::Semifinal);
        assert_eq!(RoundType::for_round(2, 2), RoundType::Final);
    }

    #[test]
    fn test_round_type_single_round_bracket() {
        // Two competitors play a single heat that is both the first
        // round and the final.
        assert_eq!(RoundType::for_round(1, 1), RoundType::Final);
    }

    #[test]
    fn test_round_type_display() {
        assert_eq!(RoundType::Final.to_string(), "FINAL");
        assert_eq!(RoundType::Semifinal.to_string(), "SEMIFINAL");
        assert_eq!(RoundType::Qualifying.to_string(), "QUALIFYING");
    }

    #[test]
    fn test_config_constructors() {
        assert_eq!(
            TournamentConfig::pooled().judging_model,
            JudgingModel::Pooled
        );
        assert_eq!(
            TournamentConfig::specialized().judging_model,
            JudgingModel::Specialized
        );
        assert_eq!(TournamentConfig::default().judging_model, JudgingModel::Pooled);
    }

    #[test]
    fn test_final_round_detection() {
        let tournament = Tournament {
            id: 1,
            name: "Latte Open".to_string(),
            status: TournamentStatus::InProgress,
            config: TournamentConfig::default(),
            current_round: 3,
            total_rounds: 3,
            winner_id: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            finished_at: None,
        };
        assert!(tournament.in_final_round());
        assert_eq!(tournament.current_round_type(), RoundType::Final);
    }
}
