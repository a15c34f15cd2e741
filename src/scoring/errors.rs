//! Scoring error types.

use thiserror::Error;

use crate::heat::models::{HeatId, HeatStatus};
use crate::scoring::models::{Beverage, JudgeId, JudgeRole};
use crate::store::StoreError;
use crate::tournament::models::TournamentId;

/// Scoring errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Heat not found
    #[error("Heat {0} not found")]
    HeatNotFound(HeatId),

    /// Tournament not found
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),

    /// Bye heats take no judging input
    #[error("Heat {0} is a bye and cannot be judged")]
    ByeHeat(HeatId),

    /// Winner resolution needs both competitors
    #[error("Heat {0} does not have two competitors")]
    MissingCompetitor(HeatId),

    /// Winner resolution needs the admin cup mapping.
    ///
    /// Recoverable: assign cup positions and call again.
    #[error("Heat {0} has no cup positions assigned for both competitors")]
    MissingCupPositions(HeatId),

    /// Judge role does not cover the ballot's beverage under the
    /// tournament's judging model
    #[error("Judge {judge_id} holds the {role:?} role and cannot score a {beverage:?} ballot")]
    RoleBeverageMismatch {
        judge_id: JudgeId,
        role: JudgeRole,
        beverage: Beverage,
    },

    /// Cup assignment payload is inconsistent with the heat
    #[error("Invalid cup assignment for heat {heat_id}: {reason}")]
    InvalidCupAssignment { heat_id: HeatId, reason: String },

    /// Ballots and finalization only apply to a running heat
    #[error("Heat {heat_id} is not running (status {status:?})")]
    HeatNotRunning { heat_id: HeatId, status: HeatStatus },

    /// The heat already has a recorded result
    #[error("Heat {0} is already complete")]
    HeatAlreadyComplete(HeatId),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for scoring operations
pub type ScoringResult<T> = Result<T, ScoringError>;
