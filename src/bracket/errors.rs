//! Bracket generation error types.

use thiserror::Error;

use crate::schedule::errors::ScheduleError;
use crate::store::StoreError;
use crate::tournament::models::{TournamentId, TournamentStatus};

/// Bracket generation errors
#[derive(Debug, Error)]
pub enum BracketError {
    /// Tournament not found
    #[error("Tournament {0} not found")]
    TournamentNotFound(TournamentId),

    /// A bracket needs at least two competitors
    #[error("Cannot seed a bracket with {0} participants, at least 2 required")]
    InvalidFieldSize(usize),

    /// Tournament is not in the right lifecycle state
    #[error("Tournament not in correct state: expected {expected:?}, got {actual:?}")]
    InvalidStatus {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    /// Roster seeds do not form the unbroken run 1..N
    #[error("No participant holds seed {0}")]
    MissingSeed(u32),

    /// Scheduling error
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
