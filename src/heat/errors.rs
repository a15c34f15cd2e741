//! Heat and segment error types.

use thiserror::Error;

use crate::heat::models::{HeatId, HeatStatus, SegmentCode};
use crate::store::StoreError;

/// Heat lifecycle errors
#[derive(Debug, Error)]
pub enum HeatError {
    /// Heat not found
    #[error("Heat {0} not found")]
    HeatNotFound(HeatId),

    /// Segment code outside the dial-in/cappuccino/espresso triple
    #[error("Unknown segment code: {0}")]
    InvalidSegment(String),

    /// Heat does not carry the full segment triple
    #[error("Heat {heat_id} has {found} segments where the DIAL_IN/CAPPUCCINO/ESPRESSO triple is required")]
    IncompleteSegmentSet { heat_id: HeatId, found: usize },

    /// Segment started out of order
    #[error("Segment {code} of heat {heat_id} cannot start before {predecessor} has ended")]
    SegmentOrderViolation {
        heat_id: HeatId,
        code: SegmentCode,
        predecessor: SegmentCode,
    },

    /// Segment already started once
    #[error("Segment {code} of heat {heat_id} has already started")]
    SegmentAlreadyStarted { heat_id: HeatId, code: SegmentCode },

    /// Segment is not currently running
    #[error("Segment {code} of heat {heat_id} is not running")]
    SegmentNotRunning { heat_id: HeatId, code: SegmentCode },

    /// Heat has not been marked ready
    #[error("Heat {heat_id} is {status:?} and must be marked ready before segments can run")]
    HeatNotReady { heat_id: HeatId, status: HeatStatus },

    /// Heat already reached DONE
    #[error("Heat {0} is already complete")]
    HeatAlreadyComplete(HeatId),

    /// Heat is in an unexpected state for the requested transition
    #[error("Heat {heat_id} is {actual:?}, expected {expected:?}")]
    UnexpectedStatus {
        heat_id: HeatId,
        expected: HeatStatus,
        actual: HeatStatus,
    },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for heat operations
pub type HeatResult<T> = Result<T, HeatError>;
