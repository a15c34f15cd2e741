//! Winner resolution with the tie-break cascade.
//!
//! A heat is decided by total points; exact ties fall through derived
//! overall wins, then latte art wins, then combined sensory wins. A
//! heat still tied after all three comes back as
//! [`WinnerResolution::ManualResolutionRequired`] instead of an error,
//! and is never auto-completed.

use serde::Serialize;

use crate::heat::models::Heat;
use crate::scoring::aggregator;
use crate::scoring::errors::{ScoringError, ScoringResult};
use crate::scoring::models::{Beverage, CupPosition, CupSide, JudgeBallot};
use crate::tournament::models::ParticipantId;

/// Outcome of resolving a heat's winner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WinnerResolution {
    /// The heat has a winner
    Decided {
        winner_id: ParticipantId,
        loser_id: ParticipantId,
        winner_total: u32,
        loser_total: u32,
        /// How the winner was picked, for the audit trail
        reason: String,
    },
    /// Dead heat after every tie-breaker; an organizer must decide
    ManualResolutionRequired {
        total: u32,
        /// The exhausted tie-break counts, for the audit trail
        reason: String,
    },
}

impl WinnerResolution {
    /// The winner, when one was decided
    pub fn winner_id(&self) -> Option<ParticipantId> {
        match self {
            WinnerResolution::Decided { winner_id, .. } => Some(*winner_id),
            WinnerResolution::ManualResolutionRequired { .. } => None,
        }
    }

    /// The recorded reason string
    pub fn reason(&self) -> &str {
        match self {
            WinnerResolution::Decided { reason, .. } => reason,
            WinnerResolution::ManualResolutionRequired { reason, .. } => reason,
        }
    }
}

fn overall_wins(ballots: &[JudgeBallot], side: CupSide) -> u32 {
    ballots
        .iter()
        .filter(|b| b.derived_overall() == Some(side))
        .count() as u32
}

fn latte_art_wins(ballots: &[JudgeBallot], side: CupSide) -> u32 {
    ballots
        .iter()
        .filter(|b| b.beverage == Beverage::Cappuccino && b.visual_latte_art == Some(side))
        .count() as u32
}

fn sensory_wins(ballots: &[JudgeBallot], side: CupSide) -> u32 {
    ballots
        .iter()
        .map(|b| {
            b.sensory_verdicts()
                .iter()
                .filter(|verdict| **verdict == Some(side))
                .count() as u32
        })
        .sum()
}

/// Resolve the winner of a contested heat.
///
/// Fails with [`ScoringError::MissingCompetitor`] on bye heats and
/// [`ScoringError::MissingCupPositions`] until the admin mapping
/// covers both competitors. Both are recoverable preconditions, not
/// judging faults.
pub fn resolve_winner(
    heat: &Heat,
    ballots: &[JudgeBallot],
    positions: &[CupPosition],
) -> ScoringResult<WinnerResolution> {
    let (competitor1, competitor2) = heat
        .competitors()
        .ok_or(ScoringError::MissingCompetitor(heat.id))?;

    let side1 = aggregator::side_of(positions, competitor1)
        .ok_or(ScoringError::MissingCupPositions(heat.id))?;
    let side2 = aggregator::side_of(positions, competitor2)
        .ok_or(ScoringError::MissingCupPositions(heat.id))?;

    let total1 = aggregator::competitor_total(ballots, positions, competitor1);
    let total2 = aggregator::competitor_total(ballots, positions, competitor2);

    if total1 != total2 {
        let (winner_id, loser_id, winner_total, loser_total) = if total1 > total2 {
            (competitor1, competitor2, total1, total2)
        } else {
            (competitor2, competitor1, total2, total1)
        };
        return Ok(WinnerResolution::Decided {
            winner_id,
            loser_id,
            winner_total,
            loser_total,
            reason: format!("higher total: {winner_total} vs {loser_total}"),
        });
    }

    let total = total1;
    let decided = |winner_side: CupSide, reason: String| {
        let (winner_id, loser_id) = if winner_side == side1 {
            (competitor1, competitor2)
        } else {
            (competitor2, competitor1)
        };
        WinnerResolution::Decided {
            winner_id,
            loser_id,
            winner_total: total,
            loser_total: total,
            reason,
        }
    };

    let tie_break = [
        ("overall wins", overall_wins(ballots, side1), overall_wins(ballots, side2)),
        ("latte art wins", latte_art_wins(ballots, side1), latte_art_wins(ballots, side2)),
        ("sensory wins", sensory_wins(ballots, side1), sensory_wins(ballots, side2)),
    ];

    for (label, wins1, wins2) in tie_break.iter().copied() {
        if wins1 != wins2 {
            let (side, wins, losses) = if wins1 > wins2 {
                (side1, wins1, wins2)
            } else {
                (side2, wins2, wins1)
            };
            return Ok(decided(
                side,
                format!("tied at {total}; {label}: {wins} vs {losses}"),
            ));
        }
    }

    let (overall, art, sensory) = (tie_break[0].1, tie_break[1].1, tie_break[2].1);
    Ok(WinnerResolution::ManualResolutionRequired {
        total,
        reason: format!(
            "tied at {total}; overall {overall} vs {overall}, latte art {art} vs {art}, \
             sensory {sensory} vs {sensory}"
        ),
    })
}
