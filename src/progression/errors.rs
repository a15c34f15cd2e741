//! Round progression error types.

use thiserror::Error;

use crate::progression::gate::RoundGateReport;
use crate::schedule::errors::ScheduleError;
use crate::store::StoreError;
use crate::tournament::models::{TournamentId, TournamentStatus};

/// Round progression errors
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Tournament not found
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),

    /// Tournament is not in progress
    #[error("Tournament {tournament_id} is {status:?} and cannot advance")]
    TournamentNotRunning {
        tournament_id: TournamentId,
        status: TournamentStatus,
    },

    /// Only the live round can be completed
    #[error("Round {requested} is not the current round ({current})")]
    InvalidRound { current: u32, requested: u32 },

    /// The round gate has not passed; the report names the offending
    /// heats and stations
    #[error(
        "Round {} of tournament {} is not complete: \
         {} heats unfinished, {} missing winners",
        .report.round,
        .report.tournament_id,
        .report.pending_heats.len(),
        .report.missing_winners.len()
    )]
    RoundNotComplete { report: RoundGateReport },

    /// Another advance is mid-flight for this tournament
    #[error("Tournament {0} is already advancing, try again")]
    RoundAdvanceInProgress(TournamentId),

    /// The next round's heats already exist
    #[error("Round {round} of tournament {tournament_id} is already populated")]
    RoundAlreadyPopulated {
        tournament_id: TournamentId,
        round: u32,
    },

    /// The round left nothing to advance
    #[error("Round {round} of tournament {tournament_id} produced no advancing winners")]
    NoWinnersFound {
        tournament_id: TournamentId,
        round: u32,
    },

    /// Scheduling error
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for progression operations
pub type ProgressionResult<T> = Result<T, ProgressionError>;
