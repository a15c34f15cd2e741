//! Storage trait definition for testability and dependency injection.
//!
//! Every engine operation talks to storage through [`TournamentStore`],
//! so the whole bracket lifecycle can run against PostgreSQL in
//! production and against the in-memory store in tests and demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::heat::models::{Heat, HeatId, HeatSegment, NewHeat, NewHeatSegment};
use crate::schedule::models::{RoundTimePlan, Station, StationId};
use crate::scoring::models::{CupPosition, HeatScore, JudgeBallot, NewJudgeBallot};
use crate::tournament::models::{Participant, ParticipantId, Tournament, TournamentId, TournamentStatus};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend rejected or failed the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// Operation did not finish within its deadline
    #[error("Storage operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Stored row could not be decoded into a model
    #[error("Stored row could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// A stored row holds a value outside the known enum variants
    #[error("Unrecognized {column} value {value:?} in storage")]
    UnknownValue { column: &'static str, value: String },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for tournament storage operations.
///
/// Implementations must be safe to share across tasks. List methods
/// return rows in their natural order: participants by seed, heats by
/// heat number, segments in running order, stations by name.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    // -- tournaments --

    /// Find a tournament by ID
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Set a tournament's lifecycle status.
    ///
    /// Moving to `InProgress` stamps `started_at`; moving to
    /// `Completed` or `Cancelled` stamps `finished_at`.
    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()>;

    /// Set both round counters, used once at bracket generation
    async fn set_tournament_rounds(
        &self,
        id: TournamentId,
        current_round: u32,
        total_rounds: u32,
    ) -> StoreResult<()>;

    /// Advance the live round pointer
    async fn set_tournament_current_round(&self, id: TournamentId, round: u32) -> StoreResult<()>;

    /// Record the champion
    async fn set_tournament_winner(
        &self,
        id: TournamentId,
        winner_id: ParticipantId,
    ) -> StoreResult<()>;

    // -- participants --

    /// All participants of a tournament, ordered by seed
    async fn list_participants(&self, tournament_id: TournamentId) -> StoreResult<Vec<Participant>>;

    /// Add points to a participant's cumulative score
    async fn add_to_participant_score(&self, id: ParticipantId, delta: i64) -> StoreResult<()>;

    /// Record the round a participant was knocked out in.
    ///
    /// Idempotent: once set, later calls leave the original round
    /// untouched.
    async fn set_participant_elimination(&self, id: ParticipantId, round: u32) -> StoreResult<()>;

    /// Record a participant's final placement
    async fn set_participant_final_rank(&self, id: ParticipantId, rank: u32) -> StoreResult<()>;

    // -- stations --

    /// All stations, ordered by name
    async fn list_stations(&self) -> StoreResult<Vec<Station>>;

    /// Find a station by ID
    async fn get_station(&self, id: StationId) -> StoreResult<Option<Station>>;

    /// Persist a station's status, availability time, and lead
    async fn update_station(&self, station: &Station) -> StoreResult<()>;

    // -- heats --

    /// Create a heat and return it with its assigned ID
    async fn create_heat(&self, heat: &NewHeat) -> StoreResult<Heat>;

    /// Find a heat by ID
    async fn get_heat(&self, id: HeatId) -> StoreResult<Option<Heat>>;

    /// Persist a heat's mutable fields
    async fn update_heat(&self, heat: &Heat) -> StoreResult<()>;

    /// All heats of a tournament, ordered by heat number
    async fn list_heats(&self, tournament_id: TournamentId) -> StoreResult<Vec<Heat>>;

    /// Heats of one round, ordered by heat number
    async fn list_round_heats(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Vec<Heat>>;

    /// Complete a heat if and only if it is not already done.
    ///
    /// Returns `true` when this call performed the completion and
    /// `false` when the heat had already reached `Done`, so concurrent
    /// finalizers cannot double-complete a heat.
    async fn complete_heat(
        &self,
        id: HeatId,
        winner_id: ParticipantId,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    // -- segments --

    /// Create a segment and return it with its assigned ID
    async fn create_segment(&self, segment: &NewHeatSegment) -> StoreResult<HeatSegment>;

    /// Persist a segment's status and timestamps
    async fn update_segment(&self, segment: &HeatSegment) -> StoreResult<()>;

    /// Segments of a heat in running order
    async fn list_segments(&self, heat_id: HeatId) -> StoreResult<Vec<HeatSegment>>;

    // -- ballots --

    /// Insert a ballot, replacing any earlier ballot from the same
    /// judge for the same heat and beverage
    async fn upsert_ballot(&self, ballot: &NewJudgeBallot) -> StoreResult<JudgeBallot>;

    /// All ballots submitted for a heat
    async fn list_ballots(&self, heat_id: HeatId) -> StoreResult<Vec<JudgeBallot>>;

    // -- cup positions --

    /// Replace the cup position rows of a heat wholesale
    async fn replace_cup_positions(
        &self,
        heat_id: HeatId,
        positions: &[CupPosition],
    ) -> StoreResult<()>;

    /// Admin cup mapping for a heat
    async fn list_cup_positions(&self, heat_id: HeatId) -> StoreResult<Vec<CupPosition>>;

    // -- heat scores --

    /// Replace the cached score rows of a heat wholesale
    async fn replace_heat_scores(&self, heat_id: HeatId, scores: &[HeatScore]) -> StoreResult<()>;

    /// Cached score rows of a heat
    async fn list_heat_scores(&self, heat_id: HeatId) -> StoreResult<Vec<HeatScore>>;

    // -- round time plans --

    /// Find the time plan for a round
    async fn get_round_plan(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Option<RoundTimePlan>>;

    /// Persist a round time plan
    async fn insert_round_plan(&self, plan: &RoundTimePlan) -> StoreResult<()>;
}
