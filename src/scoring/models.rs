//! Ballot, cup position, and score data models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::heat::models::HeatId;
use crate::tournament::models::{JudgingModel, ParticipantId};

/// Ballot ID type
pub type BallotId = i64;

/// Judge ID type
pub type JudgeId = Uuid;

/// Which physical cup a verdict points at.
///
/// Judges only ever see left and right; the mapping from side to
/// competitor is held by the admin cup positions and never shown to
/// the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CupSide {
    Left,
    Right,
}

impl CupSide {
    /// The other side
    pub fn opposite(self) -> CupSide {
        match self {
            CupSide::Left => CupSide::Right,
            CupSide::Right => CupSide::Left,
        }
    }
}

impl fmt::Display for CupSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CupSide::Left => write!(f, "LEFT"),
            CupSide::Right => write!(f, "RIGHT"),
        }
    }
}

/// Beverage a ballot scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Beverage {
    Cappuccino,
    Espresso,
}

/// Role a judge holds on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgeRole {
    /// General sensory judge
    Sensory,
    /// Cappuccino specialist
    Cappuccino,
    /// Espresso specialist
    Espresso,
}

impl JudgeRole {
    /// Whether a judge with this role may score the given beverage
    /// under a tournament's judging model
    pub fn permits(self, beverage: Beverage, model: JudgingModel) -> bool {
        match model {
            JudgingModel::Pooled => true,
            JudgingModel::Specialized => match self {
                JudgeRole::Sensory => true,
                JudgeRole::Cappuccino => beverage == Beverage::Cappuccino,
                JudgeRole::Espresso => beverage == Beverage::Espresso,
            },
        }
    }
}

/// One judge's blind verdicts for one heat and beverage.
///
/// The cup codes are what the judge physically saw on the cups. They
/// are kept for audit only; scoring always resolves sides through the
/// admin cup positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeBallot {
    /// Ballot ID
    pub id: BallotId,
    /// Heat being judged
    pub heat_id: HeatId,
    /// Judge who submitted this ballot
    pub judge_id: JudgeId,
    /// Role the judge held when submitting
    pub judge_role: JudgeRole,
    /// Beverage this ballot scores
    pub beverage: Beverage,
    /// Code written on the left cup
    pub left_cup_code: String,
    /// Code written on the right cup
    pub right_cup_code: String,
    /// Latte art verdict, cappuccino ballots only
    pub visual_latte_art: Option<CupSide>,
    /// Taste verdict
    pub taste: Option<CupSide>,
    /// Tactile (body and texture) verdict
    pub tactile: Option<CupSide>,
    /// Flavour verdict
    pub flavour: Option<CupSide>,
    /// Overall verdict as entered by the judge; scoring ignores this
    /// in favour of the derived overall
    pub overall: Option<CupSide>,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

impl JudgeBallot {
    /// The three sensory verdicts of this ballot
    pub fn sensory_verdicts(&self) -> [Option<CupSide>; 3] {
        [self.taste, self.tactile, self.flavour]
    }

    /// Count sensory verdicts leaning to each side, `(left, right)`
    pub fn sensory_leans(&self) -> (u32, u32) {
        let mut left = 0;
        let mut right = 0;
        for verdict in self.sensory_verdicts() {
            match verdict {
                Some(CupSide::Left) => left += 1,
                Some(CupSide::Right) => right += 1,
                None => {}
            }
        }
        (left, right)
    }

    /// Overall winner of this ballot, derived as a strict majority of
    /// the taste/tactile/flavour leans. A split panel derives neither
    /// side.
    pub fn derived_overall(&self) -> Option<CupSide> {
        let (left, right) = self.sensory_leans();
        if left > right {
            Some(CupSide::Left)
        } else if right > left {
            Some(CupSide::Right)
        } else {
            None
        }
    }
}

/// Ballot submission payload, ID and timestamp assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJudgeBallot {
    pub heat_id: HeatId,
    pub judge_id: JudgeId,
    pub judge_role: JudgeRole,
    pub beverage: Beverage,
    pub left_cup_code: String,
    pub right_cup_code: String,
    pub visual_latte_art: Option<CupSide>,
    pub taste: Option<CupSide>,
    pub tactile: Option<CupSide>,
    pub flavour: Option<CupSide>,
    pub overall: Option<CupSide>,
}

/// Admin-held mapping from a competitor to a cup side and code.
///
/// Exactly two rows exist per contested heat, one per side. This is
/// the only place the blind is lifted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CupPosition {
    /// Heat the mapping belongs to
    pub heat_id: HeatId,
    /// Competitor whose cups these are
    pub participant_id: ParticipantId,
    /// Code written on this competitor's cups
    pub cup_code: String,
    /// Side this competitor's cups sit on
    pub side: CupSide,
}

/// Cached per-competitor total for a heat, recomputed from ballots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatScore {
    /// Heat the total belongs to
    pub heat_id: HeatId,
    /// Competitor scored
    pub participant_id: ParticipantId,
    /// Total points across all ballots
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot(taste: Option<CupSide>, tactile: Option<CupSide>, flavour: Option<CupSide>) -> JudgeBallot {
        JudgeBallot {
            id: 1,
            heat_id: 1,
            judge_id: Uuid::new_v4(),
            judge_role: JudgeRole::Sensory,
            beverage: Beverage::Espresso,
            left_cup_code: "K7".to_string(),
            right_cup_code: "M2".to_string(),
            visual_latte_art: None,
            taste,
            tactile,
            flavour,
            overall: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_derived_overall_majority() {
        let b = ballot(
            Some(CupSide::Left),
            Some(CupSide::Left),
            Some(CupSide::Right),
        );
        assert_eq!(b.sensory_leans(), (2, 1));
        assert_eq!(b.derived_overall(), Some(CupSide::Left));
    }

    #[test]
    fn test_derived_overall_split_is_neither() {
        // One verdict each way plus one unset: no strict majority.
        let b = ballot(Some(CupSide::Left), Some(CupSide::Right), None);
        assert_eq!(b.derived_overall(), None);
    }

    #[test]
    fn test_derived_overall_empty_ballot() {
        let b = ballot(None, None, None);
        assert_eq!(b.derived_overall(), None);
    }

    #[test]
    fn test_derived_overall_single_verdict() {
        // 1-0 is a strict majority of the cast verdicts.
        let b = ballot(None, Some(CupSide::Right), None);
        assert_eq!(b.derived_overall(), Some(CupSide::Right));
    }

    #[test]
    fn test_role_permits_pooled() {
        for role in [JudgeRole::Sensory, JudgeRole::Cappuccino, JudgeRole::Espresso] {
            assert!(role.permits(Beverage::Cappuccino, JudgingModel::Pooled));
            assert!(role.permits(Beverage::Espresso, JudgingModel::Pooled));
        }
    }

    #[test]
    fn test_role_permits_specialized() {
        let model = JudgingModel::Specialized;
        assert!(JudgeRole::Sensory.permits(Beverage::Cappuccino, model));
        assert!(JudgeRole::Sensory.permits(Beverage::Espresso, model));
        assert!(JudgeRole::Cappuccino.permits(Beverage::Cappuccino, model));
        assert!(!JudgeRole::Cappuccino.permits(Beverage::Espresso, model));
        assert!(JudgeRole::Espresso.permits(Beverage::Espresso, model));
        assert!(!JudgeRole::Espresso.permits(Beverage::Cappuccino, model));
    }

    #[test]
    fn test_cup_side_opposite() {
        assert_eq!(CupSide::Left.opposite(), CupSide::Right);
        assert_eq!(CupSide::Right.opposite(), CupSide::Left);
    }
}
