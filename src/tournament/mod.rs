//! Shared tournament and participant models.
//!
//! This module holds:
//! - Tournament lifecycle state and per-tournament judging configuration
//! - Participant rows with seed, cumulative score, and elimination tracking
//! - Round labeling derived from bracket position (never stored)
//!
//! ## Example
//!
//! ```
//! use barista_throwdown::tournament::{JudgingModel, RoundType, TournamentConfig};
//!
//! let config = TournamentConfig::specialized();
//! assert_eq!(config.judging_model, JudgingModel::Specialized);
//!
//! // Labels derive from bracket position.
//! assert_eq!(RoundType::for_round(2, 3), RoundType::Semifinal);
//! assert_eq!(RoundType::for_round(3, 3), RoundType::Final);
//! ```

pub mod models;

pub use models::{
    JudgingModel, Participant, ParticipantId, RoundType, Tournament, TournamentConfig,
    TournamentId, TournamentStatus,
};
