//! Blind score aggregation.
//!
//! Pure point math over persisted ballots and the admin cup mapping.
//! Recomputing from the same inputs always reproduces the same
//! totals, so score rows can be thrown away and rebuilt at any time.

use crate::heat::models::Heat;
use crate::scoring::models::{Beverage, CupPosition, CupSide, HeatScore, JudgeBallot};
use crate::tournament::models::ParticipantId;

/// Points for winning the latte art verdict, cappuccino ballots only
pub const LATTE_ART_POINTS: u32 = 3;

/// Points per sensory category verdict (taste, tactile, flavour)
pub const SENSORY_CATEGORY_POINTS: u32 = 1;

/// Points for winning a ballot's derived overall
pub const OVERALL_POINTS: u32 = 5;

/// The side a competitor's cups sit on, resolved through the admin
/// mapping. `None` while cup positions are unassigned.
pub fn side_of(positions: &[CupPosition], participant_id: ParticipantId) -> Option<CupSide> {
    positions
        .iter()
        .find(|p| p.participant_id == participant_id)
        .map(|p| p.side)
}

/// Points one ballot awards to the given side.
///
/// Latte art only pays out on cappuccino ballots. The overall award
/// uses the derived overall, never the judge's own overall field.
pub fn ballot_points(ballot: &JudgeBallot, side: CupSide) -> u32 {
    let mut points = 0;

    if ballot.beverage == Beverage::Cappuccino && ballot.visual_latte_art == Some(side) {
        points += LATTE_ART_POINTS;
    }

    for verdict in ballot.sensory_verdicts() {
        if verdict == Some(side) {
            points += SENSORY_CATEGORY_POINTS;
        }
    }

    if ballot.derived_overall() == Some(side) {
        points += OVERALL_POINTS;
    }

    points
}

/// A competitor's total for a heat across all ballots.
///
/// Missing cup positions or an empty ballot list mean "not yet
/// scored" and produce 0, never an error.
pub fn competitor_total(
    ballots: &[JudgeBallot],
    positions: &[CupPosition],
    participant_id: ParticipantId,
) -> u32 {
    let Some(side) = side_of(positions, participant_id) else {
        return 0;
    };
    ballots.iter().map(|ballot| ballot_points(ballot, side)).sum()
}

/// Score rows for every competitor of a heat
pub fn heat_scores(heat: &Heat, ballots: &[JudgeBallot], positions: &[CupPosition]) -> Vec<HeatScore> {
    let mut scores = vec![HeatScore {
        heat_id: heat.id,
        participant_id: heat.competitor1_id,
        total: competitor_total(ballots, positions, heat.competitor1_id),
    }];
    if let Some(competitor2_id) = heat.competitor2_id {
        scores.push(HeatScore {
            heat_id: heat.id,
            participant_id: competitor2_id,
            total: competitor_total(ballots, positions, competitor2_id),
        });
    }
    scores
}
