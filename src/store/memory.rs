//! In-memory implementation of [`TournamentStore`].
//!
//! Backs tests, demos, and single-host dry runs without a database.
//! All collections live behind one mutex, so every operation observes
//! and produces a consistent snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::heat::models::{Heat, HeatId, HeatSegment, HeatStatus, NewHeat, NewHeatSegment, SegmentId, SegmentStatus};
use crate::schedule::models::{RoundTimePlan, Station, StationId, StationStatus};
use crate::scoring::models::{BallotId, CupPosition, HeatScore, JudgeBallot, NewJudgeBallot};
use crate::store::repository::{StoreResult, TournamentStore};
use crate::tournament::models::{
    Participant, ParticipantId, Tournament, TournamentConfig, TournamentId, TournamentStatus,
};

#[derive(Debug, Default)]
struct MemState {
    tournaments: HashMap<TournamentId, Tournament>,
    participants: HashMap<ParticipantId, Participant>,
    stations: HashMap<StationId, Station>,
    heats: HashMap<HeatId, Heat>,
    segments: HashMap<SegmentId, HeatSegment>,
    ballots: Vec<JudgeBallot>,
    cup_positions: HashMap<HeatId, Vec<CupPosition>>,
    heat_scores: HashMap<HeatId, Vec<HeatScore>>,
    round_plans: HashMap<(TournamentId, u32), RoundTimePlan>,
    next_id: i64,
}

impl MemState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory tournament store
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<MemState>,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a tournament in registration and return it
    pub fn add_tournament(&self, name: &str, config: TournamentConfig) -> Tournament {
        let mut state = self.state();
        let id = state.next_id();
        let tournament = Tournament {
            id,
            name: name.to_string(),
            status: TournamentStatus::Registration,
            config,
            current_round: 0,
            total_rounds: 0,
            winner_id: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        state.tournaments.insert(id, tournament.clone());
        tournament
    }

    /// Insert one participant with an explicit seed and return it
    pub fn add_participant(
        &self,
        tournament_id: TournamentId,
        display_name: &str,
        seed: u32,
    ) -> Participant {
        let mut state = self.state();
        let id = state.next_id();
        let participant = Participant {
            id,
            tournament_id,
            display_name: display_name.to_string(),
            seed,
            cumulative_score: 0,
            eliminated_round: None,
            final_rank: None,
        };
        state.participants.insert(id, participant.clone());
        participant
    }

    /// Insert a roster seeded in the given order and return it
    pub fn add_roster(&self, tournament_id: TournamentId, names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| self.add_participant(tournament_id, name, i as u32 + 1))
            .collect()
    }

    /// Insert an available station and return it
    pub fn add_station(&self, name: &str) -> Station {
        let mut state = self.state();
        let id = state.next_id();
        let station = Station {
            id,
            name: name.to_string(),
            status: StationStatus::Available,
            next_available_at: Utc::now(),
            lead_id: None,
        };
        state.stations.insert(id, station.clone());
        station
    }

    /// Insert the canonical A/B/C rotation and return it
    pub fn add_standard_stations(&self) -> Vec<Station> {
        ["A", "B", "C"].iter().map(|name| self.add_station(name)).collect()
    }

    /// Fetch a participant directly, for assertions
    pub fn participant(&self, id: ParticipantId) -> Option<Participant> {
        self.state().participants.get(&id).cloned()
    }
}

#[async_trait]
impl TournamentStore for MemStore {
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.state().tournaments.get(&id).cloned())
    }

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(tournament) = state.tournaments.get_mut(&id) {
            tournament.status = status;
            match status {
                TournamentStatus::InProgress => {
                    if tournament.started_at.is_none() {
                        tournament.started_at = Some(Utc::now());
                    }
                }
                TournamentStatus::Completed | TournamentStatus::Cancelled => {
                    tournament.finished_at = Some(Utc::now());
                }
                TournamentStatus::Registration => {}
            }
        }
        Ok(())
    }

    async fn set_tournament_rounds(
        &self,
        id: TournamentId,
        current_round: u32,
        total_rounds: u32,
    ) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(tournament) = state.tournaments.get_mut(&id) {
            tournament.current_round = current_round;
            tournament.total_rounds = total_rounds;
        }
        Ok(())
    }

    async fn set_tournament_current_round(&self, id: TournamentId, round: u32) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(tournament) = state.tournaments.get_mut(&id) {
            tournament.current_round = round;
        }
        Ok(())
    }

    async fn set_tournament_winner(
        &self,
        id: TournamentId,
        winner_id: ParticipantId,
    ) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(tournament) = state.tournaments.get_mut(&id) {
            tournament.winner_id = Some(winner_id);
        }
        Ok(())
    }

    async fn list_participants(&self, tournament_id: TournamentId) -> StoreResult<Vec<Participant>> {
        let state = self.state();
        let mut participants: Vec<Participant> = state
            .participants
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.seed);
        Ok(participants)
    }

    async fn add_to_participant_score(&self, id: ParticipantId, delta: i64) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(participant) = state.participants.get_mut(&id) {
            participant.cumulative_score += delta;
        }
        Ok(())
    }

    async fn set_participant_elimination(&self, id: ParticipantId, round: u32) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(participant) = state.participants.get_mut(&id) {
            if participant.eliminated_round.is_none() {
                participant.eliminated_round = Some(round);
            }
        }
        Ok(())
    }

    async fn set_participant_final_rank(&self, id: ParticipantId, rank: u32) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(participant) = state.participants.get_mut(&id) {
            participant.final_rank = Some(rank);
        }
        Ok(())
    }

    async fn list_stations(&self) -> StoreResult<Vec<Station>> {
        let state = self.state();
        let mut stations: Vec<Station> = state.stations.values().cloned().collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stations)
    }

    async fn get_station(&self, id: StationId) -> StoreResult<Option<Station>> {
        Ok(self.state().stations.get(&id).cloned())
    }

    async fn update_station(&self, station: &Station) -> StoreResult<()> {
        self.state().stations.insert(station.id, station.clone());
        Ok(())
    }

    async fn create_heat(&self, heat: &NewHeat) -> StoreResult<Heat> {
        let mut state = self.state();
        let id = state.next_id();
        let heat = Heat {
            id,
            tournament_id: heat.tournament_id,
            round: heat.round,
            heat_number: heat.heat_number,
            station_id: heat.station_id,
            competitor1_id: heat.competitor1_id,
            competitor2_id: heat.competitor2_id,
            status: heat.status,
            winner_id: heat.winner_id,
            scheduled_at: heat.scheduled_at,
            started_at: heat.started_at,
            ended_at: heat.ended_at,
        };
        state.heats.insert(id, heat.clone());
        Ok(heat)
    }

    async fn get_heat(&self, id: HeatId) -> StoreResult<Option<Heat>> {
        Ok(self.state().heats.get(&id).cloned())
    }

    async fn update_heat(&self, heat: &Heat) -> StoreResult<()> {
        self.state().heats.insert(heat.id, heat.clone());
        Ok(())
    }

    async fn list_heats(&self, tournament_id: TournamentId) -> StoreResult<Vec<Heat>> {
        let state = self.state();
        let mut heats: Vec<Heat> = state
            .heats
            .values()
            .filter(|h| h.tournament_id == tournament_id)
            .cloned()
            .collect();
        heats.sort_by_key(|h| h.heat_number);
        Ok(heats)
    }

    async fn list_round_heats(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Vec<Heat>> {
        let state = self.state();
        let mut heats: Vec<Heat> = state
            .heats
            .values()
            .filter(|h| h.tournament_id == tournament_id && h.round == round)
            .cloned()
            .collect();
        heats.sort_by_key(|h| h.heat_number);
        Ok(heats)
    }

    async fn complete_heat(
        &self,
        id: HeatId,
        winner_id: ParticipantId,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state();
        match state.heats.get_mut(&id) {
            Some(heat) if heat.status != HeatStatus::Done => {
                heat.status = HeatStatus::Done;
                heat.winner_id = Some(winner_id);
                heat.ended_at = Some(ended_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_segment(&self, segment: &NewHeatSegment) -> StoreResult<HeatSegment> {
        let mut state = self.state();
        let id = state.next_id();
        let segment = HeatSegment {
            id,
            heat_id: segment.heat_id,
            code: segment.code,
            status: SegmentStatus::Idle,
            planned_minutes: segment.planned_minutes,
            started_at: None,
            ended_at: None,
        };
        state.segments.insert(id, segment.clone());
        Ok(segment)
    }

    async fn update_segment(&self, segment: &HeatSegment) -> StoreResult<()> {
        self.state().segments.insert(segment.id, segment.clone());
        Ok(())
    }

    async fn list_segments(&self, heat_id: HeatId) -> StoreResult<Vec<HeatSegment>> {
        let state = self.state();
        let mut segments: Vec<HeatSegment> = state
            .segments
            .values()
            .filter(|s| s.heat_id == heat_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.code);
        Ok(segments)
    }

    async fn upsert_ballot(&self, ballot: &NewJudgeBallot) -> StoreResult<JudgeBallot> {
        let mut state = self.state();
        state.ballots.retain(|existing| {
            !(existing.heat_id == ballot.heat_id && existing.judge_id == ballot.judge_id)
        });
        let id: BallotId = state.next_id();
        let ballot = JudgeBallot {
            id,
            heat_id: ballot.heat_id,
            judge_id: ballot.judge_id,
            judge_role: ballot.judge_role,
            beverage: ballot.beverage,
            left_cup_code: ballot.left_cup_code.clone(),
            right_cup_code: ballot.right_cup_code.clone(),
            visual_latte_art: ballot.visual_latte_art,
            taste: ballot.taste,
            tactile: ballot.tactile,
            flavour: ballot.flavour,
            overall: ballot.overall,
            submitted_at: Utc::now(),
        };
        state.ballots.push(ballot.clone());
        Ok(ballot)
    }

    async fn list_ballots(&self, heat_id: HeatId) -> StoreResult<Vec<JudgeBallot>> {
        let state = self.state();
        let mut ballots: Vec<JudgeBallot> = state
            .ballots
            .iter()
            .filter(|b| b.heat_id == heat_id)
            .cloned()
            .collect();
        ballots.sort_by_key(|b| b.id);
        Ok(ballots)
    }

    async fn replace_cup_positions(
        &self,
        heat_id: HeatId,
        positions: &[CupPosition],
    ) -> StoreResult<()> {
        self.state().cup_positions.insert(heat_id, positions.to_vec());
        Ok(())
    }

    async fn list_cup_positions(&self, heat_id: HeatId) -> StoreResult<Vec<CupPosition>> {
        Ok(self
            .state()
            .cup_positions
            .get(&heat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_heat_scores(&self, heat_id: HeatId, scores: &[HeatScore]) -> StoreResult<()> {
        self.state().heat_scores.insert(heat_id, scores.to_vec());
        Ok(())
    }

    async fn list_heat_scores(&self, heat_id: HeatId) -> StoreResult<Vec<HeatScore>> {
        Ok(self
            .state()
            .heat_scores
            .get(&heat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_round_plan(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Option<RoundTimePlan>> {
        Ok(self.state().round_plans.get(&(tournament_id, round)).copied())
    }

    async fn insert_round_plan(&self, plan: &RoundTimePlan) -> StoreResult<()> {
        self.state()
            .round_plans
            .insert((plan.tournament_id, plan.round), *plan);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::models::{Beverage, CupSide, JudgeRole};
    use uuid::Uuid;

    fn new_heat(tournament_id: TournamentId, number: u32, c1: ParticipantId, c2: ParticipantId) -> NewHeat {
        NewHeat {
            tournament_id,
            round: 1,
            heat_number: number,
            station_id: None,
            competitor1_id: c1,
            competitor2_id: Some(c2),
            status: HeatStatus::Pending,
            winner_id: None,
            scheduled_at: None,
            started_at: None,
            ended_at: None,
        }
    }

    #[tokio::test]
    async fn test_complete_heat_is_first_writer_wins() {
        let store = MemStore::new();
        let tournament = store.add_tournament("Throwdown", TournamentConfig::default());
        let heat = store
            .create_heat(&new_heat(tournament.id, 1, 10, 20))
            .await
            .unwrap();

        let now = Utc::now();
        assert!(store.complete_heat(heat.id, 10, now).await.unwrap());
        // Second completion loses the race and must not overwrite.
        assert!(!store.complete_heat(heat.id, 20, now).await.unwrap());

        let stored = store.get_heat(heat.id).await.unwrap().unwrap();
        assert_eq!(stored.winner_id, Some(10));
        assert_eq!(stored.status, HeatStatus::Done);
    }

    #[tokio::test]
    async fn test_elimination_round_is_sticky() {
        let store = MemStore::new();
        let tournament = store.add_tournament("Throwdown", TournamentConfig::default());
        let participant = store.add_participant(tournament.id, "june", 1);

        store.set_participant_elimination(participant.id, 2).await.unwrap();
        store.set_participant_elimination(participant.id, 3).await.unwrap();

        let stored = store.participant(participant.id).unwrap();
        assert_eq!(stored.eliminated_round, Some(2));
    }

    #[tokio::test]
    async fn test_ballot_upsert_keeps_one_row_per_judge() {
        let store = MemStore::new();
        let judge = Uuid::new_v4();
        let base = NewJudgeBallot {
            heat_id: 1,
            judge_id: judge,
            judge_role: JudgeRole::Sensory,
            beverage: Beverage::Espresso,
            left_cup_code: "K7".to_string(),
            right_cup_code: "M2".to_string(),
            visual_latte_art: None,
            taste: Some(CupSide::Left),
            tactile: None,
            flavour: None,
            overall: None,
        };
        store.upsert_ballot(&base).await.unwrap();

        let corrected = NewJudgeBallot {
            taste: Some(CupSide::Right),
            ..base.clone()
        };
        store.upsert_ballot(&corrected).await.unwrap();

        let ballots = store.list_ballots(1).await.unwrap();
        assert_eq!(ballots.len(), 1);
        assert_eq!(ballots[0].taste, Some(CupSide::Right));

        // Switching beverage still replaces; the judge keeps one row.
        let switched = NewJudgeBallot {
            beverage: Beverage::Cappuccino,
            ..base.clone()
        };
        store.upsert_ballot(&switched).await.unwrap();
        let ballots = store.list_ballots(1).await.unwrap();
        assert_eq!(ballots.len(), 1);
        assert_eq!(ballots[0].beverage, Beverage::Cappuccino);

        // A different judge is a separate ballot.
        let other_judge = NewJudgeBallot {
            judge_id: Uuid::new_v4(),
            ..base
        };
        store.upsert_ballot(&other_judge).await.unwrap();
        assert_eq!(store.list_ballots(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listings_keep_natural_order() {
        let store = MemStore::new();
        let tournament = store.add_tournament("Throwdown", TournamentConfig::default());
        store.add_participant(tournament.id, "low", 3);
        store.add_participant(tournament.id, "top", 1);
        store.add_participant(tournament.id, "mid", 2);

        let participants = store.list_participants(tournament.id).await.unwrap();
        let seeds: Vec<u32> = participants.iter().map(|p| p.seed).collect();
        assert_eq!(seeds, vec![1, 2, 3]);

        store.create_heat(&new_heat(tournament.id, 2, 1, 2)).await.unwrap();
        store.create_heat(&new_heat(tournament.id, 1, 3, 4)).await.unwrap();
        let heats = store.list_heats(tournament.id).await.unwrap();
        let numbers: Vec<u32> = heats.iter().map(|h| h.heat_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_round_plan_roundtrip() {
        let store = MemStore::new();
        assert!(store.get_round_plan(1, 1).await.unwrap().is_none());

        let plan = RoundTimePlan::standard(1, 1);
        store.insert_round_plan(&plan).await.unwrap();
        assert_eq!(store.get_round_plan(1, 1).await.unwrap(), Some(plan));
    }
}
