//! Scheduling error types.

use thiserror::Error;

use crate::schedule::models::StationId;
use crate::store::StoreError;

/// Scheduling errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Station not found
    #[error("Station {0} not found")]
    StationNotFound(StationId),

    /// No station is available to take the heat
    #[error("No station is available for scheduling")]
    NoAvailableStation,

    /// Fewer stations are available than the operation needs
    #[error("Only {available} stations are available, {required} required")]
    InsufficientStations { available: usize, required: usize },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for scheduling operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;
