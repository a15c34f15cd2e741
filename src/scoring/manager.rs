//! Ballot intake, cup assignment, and heat finalization.

use std::sync::Arc;

use chrono::Utc;

use crate::events::{EngineEvent, EventBus};
use crate::heat::models::{Heat, HeatId, HeatStatus};
use crate::scoring::aggregator;
use crate::scoring::errors::{ScoringError, ScoringResult};
use crate::scoring::models::{CupPosition, HeatScore, JudgeBallot, NewJudgeBallot};
use crate::scoring::resolver::{self, WinnerResolution};
use crate::store::TournamentStore;

/// Scoring manager
#[derive(Clone)]
pub struct ScoringManager {
    store: Arc<dyn TournamentStore>,
    events: EventBus,
}

impl ScoringManager {
    /// Create a new scoring manager
    pub fn new(store: Arc<dyn TournamentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    async fn heat(&self, heat_id: HeatId) -> ScoringResult<Heat> {
        self.store
            .get_heat(heat_id)
            .await?
            .ok_or(ScoringError::HeatNotFound(heat_id))
    }

    /// Record the admin mapping from competitors to cup sides.
    ///
    /// The panel never sees this mapping; it is what lets blind
    /// left/right verdicts be attributed to competitors. Rows replace
    /// any earlier assignment wholesale. Fails with
    /// `InvalidCupAssignment` unless exactly the heat's two
    /// competitors are mapped, one per side, with distinct cup codes.
    pub async fn assign_cup_positions(
        &self,
        heat_id: HeatId,
        positions: Vec<CupPosition>,
    ) -> ScoringResult<()> {
        let heat = self.heat(heat_id).await?;
        let (competitor1, competitor2) = heat
            .competitors()
            .ok_or(ScoringError::ByeHeat(heat_id))?;
        if heat.status == HeatStatus::Done {
            return Err(ScoringError::HeatAlreadyComplete(heat_id));
        }

        let invalid = |reason: &str| ScoringError::InvalidCupAssignment {
            heat_id,
            reason: reason.to_string(),
        };

        let [first, second] = positions.as_slice() else {
            return Err(invalid("exactly two cup positions are required"));
        };
        if first.heat_id != heat_id || second.heat_id != heat_id {
            return Err(invalid("rows reference a different heat"));
        }
        if first.side == second.side {
            return Err(invalid("both sides must be assigned"));
        }
        if first.cup_code == second.cup_code {
            return Err(invalid("cup codes must differ"));
        }
        let mapped = [first.participant_id, second.participant_id];
        if !mapped.contains(&competitor1) || !mapped.contains(&competitor2) {
            return Err(invalid("participants do not match the heat"));
        }

        self.store.replace_cup_positions(heat_id, &positions).await?;
        log::debug!(
            "heat {heat_id}: cup positions assigned ({} {}, {} {})",
            first.cup_code,
            first.side,
            second.cup_code,
            second.side
        );
        Ok(())
    }

    /// Accept one judge's ballot for a running heat.
    ///
    /// Each judge holds one ballot per heat; a second submission by the
    /// same judge replaces the first, even when the beverage changes.
    /// Fails with `RoleBeverageMismatch` when the judge's role does not
    /// cover the ballot's beverage under the tournament's judging model.
    pub async fn submit_ballot(&self, ballot: NewJudgeBallot) -> ScoringResult<JudgeBallot> {
        let heat = self.heat(ballot.heat_id).await?;
        if heat.is_bye() {
            return Err(ScoringError::ByeHeat(heat.id));
        }
        match heat.status {
            HeatStatus::Running => {}
            HeatStatus::Done => return Err(ScoringError::HeatAlreadyComplete(heat.id)),
            status => {
                return Err(ScoringError::HeatNotRunning {
                    heat_id: heat.id,
                    status,
                });
            }
        }

        let tournament = self
            .store
            .get_tournament(heat.tournament_id)
            .await?
            .ok_or(ScoringError::TournamentNotFound(heat.tournament_id))?;
        if !ballot
            .judge_role
            .permits(ballot.beverage, tournament.config.judging_model)
        {
            return Err(ScoringError::RoleBeverageMismatch {
                judge_id: ballot.judge_id,
                role: ballot.judge_role,
                beverage: ballot.beverage,
            });
        }

        let stored = self.store.upsert_ballot(&ballot).await?;
        log::debug!(
            "heat {}: {:?} ballot from judge {}",
            stored.heat_id,
            stored.beverage,
            stored.judge_id
        );
        Ok(stored)
    }

    /// Recompute and cache the heat's score rows from its ballots.
    ///
    /// Pure recomputation: cached rows are replaced wholesale and the
    /// result is the same no matter how often it runs. Missing ballots
    /// or cup positions yield zero totals rather than errors.
    pub async fn recompute_heat_scores(&self, heat_id: HeatId) -> ScoringResult<Vec<HeatScore>> {
        let heat = self.heat(heat_id).await?;
        let ballots = self.store.list_ballots(heat_id).await?;
        let positions = self.store.list_cup_positions(heat_id).await?;
        let scores = aggregator::heat_scores(&heat, &ballots, &positions);
        self.store.replace_heat_scores(heat_id, &scores).await?;
        Ok(scores)
    }

    /// Resolve the heat's winner from its ballots and complete it.
    ///
    /// Score rows are cached as a side effect. A decided heat is
    /// completed through a guarded status update, so of two concurrent
    /// finalizers exactly one performs the completion and the other
    /// gets `HeatAlreadyComplete`. A dead heat comes back as
    /// [`WinnerResolution::ManualResolutionRequired`] and leaves the
    /// heat running for an organizer to settle.
    ///
    /// # Errors
    ///
    /// * `ByeHeat` - bye heats are born complete and never finalized
    /// * `HeatNotRunning` - no segment has started yet
    /// * `HeatAlreadyComplete` - the heat already has a result
    /// * `MissingCupPositions` - the admin mapping is not assigned
    pub async fn finalize_heat(&self, heat_id: HeatId) -> ScoringResult<WinnerResolution> {
        let heat = self.heat(heat_id).await?;
        if heat.is_bye() {
            return Err(ScoringError::ByeHeat(heat_id));
        }
        match heat.status {
            HeatStatus::Running => {}
            HeatStatus::Done => return Err(ScoringError::HeatAlreadyComplete(heat_id)),
            status => return Err(ScoringError::HeatNotRunning { heat_id, status }),
        }

        let ballots = self.store.list_ballots(heat_id).await?;
        let positions = self.store.list_cup_positions(heat_id).await?;
        let resolution = resolver::resolve_winner(&heat, &ballots, &positions)?;

        let scores = aggregator::heat_scores(&heat, &ballots, &positions);
        self.store.replace_heat_scores(heat_id, &scores).await?;

        match &resolution {
            WinnerResolution::Decided {
                winner_id, reason, ..
            } => {
                let completed = self
                    .store
                    .complete_heat(heat_id, *winner_id, Utc::now())
                    .await?;
                if !completed {
                    return Err(ScoringError::HeatAlreadyComplete(heat_id));
                }
                log::info!("heat {heat_id}: participant {winner_id} wins ({reason})");
                self.events.emit(EngineEvent::HeatCompleted {
                    heat_id,
                    winner_id: *winner_id,
                });
            }
            WinnerResolution::ManualResolutionRequired { reason, .. } => {
                log::warn!("heat {heat_id}: manual resolution required ({reason})");
            }
        }

        Ok(resolution)
    }
}
