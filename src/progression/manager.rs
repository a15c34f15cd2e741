//! Round completion, standings rollup, and next-round population.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::bracket::seeding;
use crate::events::{EngineEvent, EventBus};
use crate::heat::models::{Heat, NewHeat, NewHeatSegment, SegmentCode};
use crate::progression::errors::{ProgressionError, ProgressionResult};
use crate::progression::gate::{self, RoundGateReport};
use crate::schedule::errors::ScheduleError;
use crate::schedule::models::RoundTimePlan;
use crate::schedule::scheduler::StationScheduler;
use crate::scoring::aggregator;
use crate::scoring::models::HeatScore;
use crate::store::TournamentStore;
use crate::tournament::models::{ParticipantId, Tournament, TournamentId, TournamentStatus};

/// Tournaments with an advance operation mid-flight.
///
/// At most one guard exists per tournament; a second acquire fails
/// fast instead of queueing, and dropping the guard releases the
/// tournament even on an error path.
#[derive(Clone, Default)]
struct AdvanceLocks {
    inner: Arc<Mutex<HashSet<TournamentId>>>,
}

impl AdvanceLocks {
    fn acquire(&self, tournament_id: TournamentId) -> Option<AdvanceGuard> {
        let mut held = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(tournament_id) {
            return None;
        }
        Some(AdvanceGuard {
            tournament_id,
            locks: self.clone(),
        })
    }
}

struct AdvanceGuard {
    tournament_id: TournamentId,
    locks: AdvanceLocks,
}

impl Drop for AdvanceGuard {
    fn drop(&mut self) {
        self.locks
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.tournament_id);
    }
}

/// Round progression manager.
///
/// Clones share the advance locks, so every code path that advances a
/// tournament must go through clones of one manager.
#[derive(Clone)]
pub struct ProgressionManager {
    store: Arc<dyn TournamentStore>,
    scheduler: StationScheduler,
    events: EventBus,
    advance_locks: AdvanceLocks,
}

impl ProgressionManager {
    /// Create a new progression manager
    pub fn new(
        store: Arc<dyn TournamentStore>,
        scheduler: StationScheduler,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            scheduler,
            events,
            advance_locks: AdvanceLocks::default(),
        }
    }

    async fn tournament(&self, tournament_id: TournamentId) -> ProgressionResult<Tournament> {
        self.store
            .get_tournament(tournament_id)
            .await?
            .ok_or(ProgressionError::TournamentNotFound(tournament_id))
    }

    fn require_running(tournament: &Tournament) -> ProgressionResult<()> {
        if tournament.status != TournamentStatus::InProgress {
            return Err(ProgressionError::TournamentNotRunning {
                tournament_id: tournament.id,
                status: tournament.status,
            });
        }
        Ok(())
    }

    async fn refresh_heat_scores(&self, heat: &Heat) -> ProgressionResult<Vec<HeatScore>> {
        let ballots = self.store.list_ballots(heat.id).await?;
        let positions = self.store.list_cup_positions(heat.id).await?;
        let scores = aggregator::heat_scores(heat, &ballots, &positions);
        self.store.replace_heat_scores(heat.id, &scores).await?;
        Ok(scores)
    }

    async fn create_segment_triple(
        &self,
        heat: &Heat,
        plan: &RoundTimePlan,
    ) -> ProgressionResult<()> {
        for code in SegmentCode::ALL {
            let segment = NewHeatSegment::new(heat.id, code, plan.minutes_for(code));
            self.store.create_segment(&segment).await?;
        }
        Ok(())
    }

    /// Evaluate the completion gate for one round.
    ///
    /// Read-only; safe to poll from a refresh loop while heats are
    /// still being judged.
    pub async fn round_gate(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> ProgressionResult<RoundGateReport> {
        self.tournament(tournament_id).await?;
        let heats = self.store.list_round_heats(tournament_id, round).await?;
        Ok(gate::evaluate(tournament_id, round, &heats))
    }

    /// Close out a finished round: roll heat scores into cumulative
    /// standings, mark losers eliminated, then advance the round
    /// pointer or crown the champion.
    ///
    /// Score refresh is best-effort per heat: one heat failing to
    /// recompute is logged and skipped, never blocking the advance.
    /// Cumulative scores are only ever added to, and eliminations
    /// stick at the first round they were recorded in, so re-running
    /// a failed completion cannot double-punish anyone.
    ///
    /// # Errors
    ///
    /// * `RoundAdvanceInProgress` - another advance holds the tournament
    /// * `InvalidRound` - `round` is not the live round
    /// * `RoundNotComplete` - the gate has unfinished heats
    pub async fn complete_round(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> ProgressionResult<Tournament> {
        let _advance = self
            .advance_locks
            .acquire(tournament_id)
            .ok_or(ProgressionError::RoundAdvanceInProgress(tournament_id))?;

        let tournament = self.tournament(tournament_id).await?;
        Self::require_running(&tournament)?;
        if round != tournament.current_round {
            return Err(ProgressionError::InvalidRound {
                current: tournament.current_round,
                requested: round,
            });
        }

        let heats = self.store.list_round_heats(tournament_id, round).await?;
        let report = gate::evaluate(tournament_id, round, &heats);
        if !report.is_complete() {
            return Err(ProgressionError::RoundNotComplete { report });
        }

        let mut round_points: HashMap<ParticipantId, i64> = HashMap::new();
        for heat in &heats {
            match self.refresh_heat_scores(heat).await {
                Ok(scores) => {
                    for score in scores {
                        *round_points.entry(score.participant_id).or_default() +=
                            i64::from(score.total);
                    }
                }
                Err(err) => {
                    log::warn!("heat {}: score refresh failed, skipped ({err})", heat.id);
                }
            }
        }
        for (participant_id, points) in &round_points {
            if *points > 0 {
                self.store
                    .add_to_participant_score(*participant_id, *points)
                    .await?;
            }
        }

        for heat in &heats {
            if let Some(loser) = heat.loser_id() {
                self.store.set_participant_elimination(loser, round).await?;
            }
        }

        if round >= tournament.total_rounds {
            let champion = heats
                .iter()
                .rev()
                .find_map(|h| h.winner_id)
                .ok_or(ProgressionError::NoWinnersFound {
                    tournament_id,
                    round,
                })?;
            self.store
                .set_tournament_winner(tournament_id, champion)
                .await?;
            self.store.set_participant_final_rank(champion, 1).await?;
            self.store
                .set_tournament_status(tournament_id, TournamentStatus::Completed)
                .await?;
            log::info!("tournament {tournament_id}: participant {champion} takes the title");
            self.events.emit(EngineEvent::RoundCompleted {
                tournament_id,
                round,
            });
            self.events.emit(EngineEvent::TournamentFinalized {
                tournament_id,
                winner_id: champion,
            });
        } else {
            self.store
                .set_tournament_current_round(tournament_id, round + 1)
                .await?;
            log::info!(
                "tournament {tournament_id}: round {round} closed, round {} is live",
                round + 1
            );
            self.events.emit(EngineEvent::RoundCompleted {
                tournament_id,
                round,
            });
        }

        self.tournament(tournament_id).await
    }

    /// Pair the previous round's winners into heats for the live
    /// round and schedule them.
    ///
    /// Winners are taken in heat order and paired sequentially; an
    /// odd winner count gives the last winner the round's single bye.
    /// Pairs land on whichever available station opens earliest, so
    /// they spread across the rotation without any fresh stagger. One
    /// available station is enough to keep a shorthanded venue
    /// moving.
    ///
    /// # Errors
    ///
    /// * `RoundAdvanceInProgress` - another advance holds the tournament
    /// * `RoundAlreadyPopulated` - the live round already has heats;
    ///   round 1 always does, it is seeded with the bracket
    /// * `RoundNotComplete` - the previous round's gate has not passed
    /// * `NoWinnersFound` - fewer than two winners to pair
    /// * `Schedule` - no station is available
    pub async fn populate_next_round(
        &self,
        tournament_id: TournamentId,
    ) -> ProgressionResult<Vec<Heat>> {
        let _advance = self
            .advance_locks
            .acquire(tournament_id)
            .ok_or(ProgressionError::RoundAdvanceInProgress(tournament_id))?;

        let tournament = self.tournament(tournament_id).await?;
        Self::require_running(&tournament)?;
        let next_round = tournament.current_round;

        let existing = self.store.list_round_heats(tournament_id, next_round).await?;
        if !existing.is_empty() {
            return Err(ProgressionError::RoundAlreadyPopulated {
                tournament_id,
                round: next_round,
            });
        }

        let prev_round = next_round.saturating_sub(1);
        let prev_heats = self.store.list_round_heats(tournament_id, prev_round).await?;
        let report = gate::evaluate(tournament_id, prev_round, &prev_heats);
        if !report.is_complete() {
            return Err(ProgressionError::RoundNotComplete { report });
        }

        let winners: Vec<ParticipantId> = prev_heats.iter().filter_map(|h| h.winner_id).collect();
        if winners.len() < 2 {
            return Err(ProgressionError::NoWinnersFound {
                tournament_id,
                round: prev_round,
            });
        }
        let (pairs, leftover) = seeding::sequential_pairs(&winners);

        if self.scheduler.available_stations().await?.is_empty() {
            return Err(ScheduleError::InsufficientStations {
                available: 0,
                required: 1,
            }
            .into());
        }
        let plan = self
            .scheduler
            .round_plan_or_default(tournament_id, next_round)
            .await?;
        let mut heat_number = self
            .store
            .list_heats(tournament_id)
            .await?
            .last()
            .map(|h| h.heat_number)
            .unwrap_or(0);

        let mut heats = Vec::with_capacity(pairs.len() + usize::from(leftover.is_some()));
        for (first, second) in pairs {
            heat_number += 1;
            let (station_id, scheduled_at) = self.scheduler.assign_next(&plan).await?;
            let heat = self
                .store
                .create_heat(&NewHeat::pairing(
                    tournament_id,
                    next_round,
                    heat_number,
                    first,
                    second,
                    station_id,
                    scheduled_at,
                ))
                .await?;
            self.create_segment_triple(&heat, &plan).await?;
            heats.push(heat);
        }
        if let Some(competitor) = leftover {
            heat_number += 1;
            let heat = self
                .store
                .create_heat(&NewHeat::bye(
                    tournament_id,
                    next_round,
                    heat_number,
                    competitor,
                    Utc::now(),
                ))
                .await?;
            self.create_segment_triple(&heat, &plan).await?;
            heats.push(heat);
        }

        log::info!(
            "tournament {tournament_id}: round {next_round} populated with {} heats",
            heats.len()
        );
        self.events.emit(EngineEvent::BracketGenerated {
            tournament_id,
            round: next_round,
            heat_count: heats.len(),
        });
        Ok(heats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::models::HeatStatus;
    use crate::scoring::models::{Beverage, CupPosition, CupSide, JudgeRole, NewJudgeBallot};
    use crate::store::MemStore;
    use crate::tournament::models::TournamentConfig;
    use uuid::Uuid;

    struct Fixture {
        store: Arc<MemStore>,
        manager: ProgressionManager,
        tournament_id: TournamentId,
        roster: Vec<ParticipantId>,
    }

    /// A tournament mid-round-1 with the given roster size and
    /// station rotation already in place
    async fn mid_round_one(names: &[&str], total_rounds: u32) -> Fixture {
        let store = Arc::new(MemStore::new());
        let tournament = store.add_tournament("Progression Cup", TournamentConfig::pooled());
        let roster = store
            .add_roster(tournament.id, names)
            .into_iter()
            .map(|p| p.id)
            .collect();
        store.add_standard_stations();
        store
            .set_tournament_rounds(tournament.id, 1, total_rounds)
            .await
            .unwrap();
        store
            .set_tournament_status(tournament.id, TournamentStatus::InProgress)
            .await
            .unwrap();

        let scheduler = StationScheduler::new(store.clone());
        let manager = ProgressionManager::new(store.clone(), scheduler, EventBus::default());
        Fixture {
            store,
            manager,
            tournament_id: tournament.id,
            roster,
        }
    }

    /// Create a round-1 heat on the first station and decide it
    async fn decided_heat(
        f: &Fixture,
        heat_number: u32,
        competitor1: ParticipantId,
        competitor2: ParticipantId,
        winner: ParticipantId,
    ) -> Heat {
        let station = f.store.list_stations().await.unwrap()[0].id;
        let heat = f
            .store
            .create_heat(&NewHeat::pairing(
                f.tournament_id,
                1,
                heat_number,
                competitor1,
                competitor2,
                station,
                Utc::now(),
            ))
            .await
            .unwrap();
        f.store.complete_heat(heat.id, winner, Utc::now()).await.unwrap();
        f.store.get_heat(heat.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_complete_round_rolls_up_and_advances() {
        let f = mid_round_one(&["A", "B", "C", "D"], 2).await;
        let [a, b, c, d] = f.roster[..] else { unreachable!() };
        let heat = decided_heat(&f, 1, a, b, a).await;
        decided_heat(&f, 2, c, d, c).await;

        // Judged scores for the first heat only: A sweeps an espresso
        // ballot for 8 points.
        f.store
            .replace_cup_positions(
                heat.id,
                &[
                    CupPosition {
                        heat_id: heat.id,
                        participant_id: a,
                        cup_code: "M7".to_string(),
                        side: CupSide::Left,
                    },
                    CupPosition {
                        heat_id: heat.id,
                        participant_id: b,
                        cup_code: "K9".to_string(),
                        side: CupSide::Right,
                    },
                ],
            )
            .await
            .unwrap();
        f.store
            .upsert_ballot(&NewJudgeBallot {
                heat_id: heat.id,
                judge_id: Uuid::new_v4(),
                judge_role: JudgeRole::Sensory,
                beverage: Beverage::Espresso,
                left_cup_code: "M7".to_string(),
                right_cup_code: "K9".to_string(),
                visual_latte_art: None,
                taste: Some(CupSide::Left),
                tactile: Some(CupSide::Left),
                flavour: Some(CupSide::Left),
                overall: Some(CupSide::Left),
            })
            .await
            .unwrap();

        let tournament = f.manager.complete_round(f.tournament_id, 1).await.unwrap();
        assert_eq!(tournament.current_round, 2);
        assert_eq!(tournament.status, TournamentStatus::InProgress);
        assert_eq!(tournament.winner_id, None);

        assert_eq!(f.store.participant(a).unwrap().cumulative_score, 8);
        assert_eq!(f.store.participant(b).unwrap().cumulative_score, 0);
        assert_eq!(f.store.participant(b).unwrap().eliminated_round, Some(1));
        assert_eq!(f.store.participant(d).unwrap().eliminated_round, Some(1));
        assert_eq!(f.store.participant(a).unwrap().eliminated_round, None);

        let scores = f.store.list_heat_scores(heat.id).await.unwrap();
        assert!(scores.iter().any(|s| s.participant_id == a && s.total == 8));
    }

    #[tokio::test]
    async fn test_complete_round_requires_the_gate() {
        let f = mid_round_one(&["A", "B", "C", "D"], 2).await;
        let [a, b, c, d] = f.roster[..] else { unreachable!() };
        decided_heat(&f, 1, a, b, a).await;

        // Second heat still running.
        let station = f.store.list_stations().await.unwrap()[0].id;
        let open = f
            .store
            .create_heat(&NewHeat::pairing(f.tournament_id, 1, 2, c, d, station, Utc::now()))
            .await
            .unwrap();

        let err = f.manager.complete_round(f.tournament_id, 1).await.unwrap_err();
        let ProgressionError::RoundNotComplete { report } = err else {
            panic!("expected the gate to refuse, got {err:?}");
        };
        assert_eq!(report.pending_heats, vec![open.id]);
        assert!(report.missing_winners.is_empty());
        assert!(
            report
                .stations
                .iter()
                .any(|s| s.station_id == station && !s.is_complete)
        );
    }

    #[tokio::test]
    async fn test_only_the_live_round_completes() {
        let f = mid_round_one(&["A", "B"], 1).await;
        let result = f.manager.complete_round(f.tournament_id, 2).await;
        assert!(matches!(
            result,
            Err(ProgressionError::InvalidRound {
                current: 1,
                requested: 2,
            })
        ));
    }

    #[tokio::test]
    async fn test_final_round_crowns_the_champion() {
        let f = mid_round_one(&["A", "B"], 1).await;
        let [a, b] = f.roster[..] else { unreachable!() };
        decided_heat(&f, 1, a, b, a).await;

        let events = EventBus::default();
        let mut rx = events.subscribe();
        let manager = ProgressionManager::new(
            f.store.clone(),
            StationScheduler::new(f.store.clone()),
            events,
        );

        let tournament = manager.complete_round(f.tournament_id, 1).await.unwrap();
        assert_eq!(tournament.status, TournamentStatus::Completed);
        assert_eq!(tournament.winner_id, Some(a));
        assert_eq!(tournament.current_round, 1);
        assert!(tournament.finished_at.is_some());
        assert_eq!(f.store.participant(a).unwrap().final_rank, Some(1));

        assert_eq!(rx.recv().await.unwrap().name(), "round:completed");
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::TournamentFinalized {
                tournament_id: f.tournament_id,
                winner_id: a,
            }
        );
    }

    #[tokio::test]
    async fn test_advance_lock_fails_fast() {
        let f = mid_round_one(&["A", "B"], 1).await;

        let guard = f.manager.advance_locks.acquire(f.tournament_id).unwrap();
        let result = f.manager.complete_round(f.tournament_id, 1).await;
        assert!(matches!(
            result,
            Err(ProgressionError::RoundAdvanceInProgress(_))
        ));

        // Other tournaments are unaffected, and dropping the guard
        // releases this one.
        assert!(f.manager.advance_locks.acquire(f.tournament_id + 1).is_some());
        drop(guard);
        assert!(f.manager.advance_locks.acquire(f.tournament_id).is_some());
    }

    #[tokio::test]
    async fn test_populate_pairs_winners_in_heat_order() {
        let f = mid_round_one(&["A", "B", "C", "D"], 2).await;
        let [a, b, c, d] = f.roster[..] else { unreachable!() };
        decided_heat(&f, 1, a, b, a).await;
        decided_heat(&f, 2, c, d, d).await;
        f.manager.complete_round(f.tournament_id, 1).await.unwrap();

        let heats = f.manager.populate_next_round(f.tournament_id).await.unwrap();
        assert_eq!(heats.len(), 1);
        assert_eq!(heats[0].round, 2);
        assert_eq!(heats[0].heat_number, 3);
        assert_eq!(heats[0].competitors(), Some((a, d)));
        assert_eq!(heats[0].status, HeatStatus::Pending);
        assert!(heats[0].station_id.is_some());

        let segments = f.store.list_segments(heats[0].id).await.unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[tokio::test]
    async fn test_populate_gives_odd_winner_count_one_bye() {
        let f = mid_round_one(&["A", "B", "C", "D", "E", "F"], 3).await;
        let winners: Vec<ParticipantId> = f.roster.iter().step_by(2).copied().collect();
        decided_heat(&f, 1, f.roster[0], f.roster[1], winners[0]).await;
        decided_heat(&f, 2, f.roster[2], f.roster[3], winners[1]).await;
        decided_heat(&f, 3, f.roster[4], f.roster[5], winners[2]).await;
        f.manager.complete_round(f.tournament_id, 1).await.unwrap();

        let heats = f.manager.populate_next_round(f.tournament_id).await.unwrap();
        assert_eq!(heats.len(), 2);
        assert_eq!(heats[0].competitors(), Some((winners[0], winners[1])));

        let bye = &heats[1];
        assert!(bye.is_bye());
        assert_eq!(bye.status, HeatStatus::Done);
        assert_eq!(bye.winner_id, Some(winners[2]));
        assert_eq!(bye.station_id, None);
    }

    #[tokio::test]
    async fn test_populate_rejects_existing_round() {
        let f = mid_round_one(&["A", "B", "C", "D"], 2).await;
        let [a, b, c, d] = f.roster[..] else { unreachable!() };
        decided_heat(&f, 1, a, b, a).await;
        decided_heat(&f, 2, c, d, c).await;
        f.manager.complete_round(f.tournament_id, 1).await.unwrap();
        f.manager.populate_next_round(f.tournament_id).await.unwrap();

        let result = f.manager.populate_next_round(f.tournament_id).await;
        assert!(matches!(
            result,
            Err(ProgressionError::RoundAlreadyPopulated { round: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_populate_during_live_round_is_rejected() {
        let f = mid_round_one(&["A", "B", "C", "D"], 2).await;
        let [a, b, ..] = f.roster[..] else { unreachable!() };

        // Round 1 heats exist and are still being played.
        let station = f.store.list_stations().await.unwrap()[0].id;
        f.store
            .create_heat(&NewHeat::pairing(f.tournament_id, 1, 1, a, b, station, Utc::now()))
            .await
            .unwrap();

        let result = f.manager.populate_next_round(f.tournament_id).await;
        assert!(matches!(
            result,
            Err(ProgressionError::RoundAlreadyPopulated { round: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_populate_needs_an_available_station() {
        let f = mid_round_one(&["A", "B", "C", "D"], 2).await;
        let [a, b, c, d] = f.roster[..] else { unreachable!() };
        decided_heat(&f, 1, a, b, a).await;
        decided_heat(&f, 2, c, d, c).await;
        f.manager.complete_round(f.tournament_id, 1).await.unwrap();

        let mut stations = f.store.list_stations().await.unwrap();
        for station in &mut stations {
            station.status = crate::schedule::models::StationStatus::Offline;
            f.store.update_station(station).await.unwrap();
        }

        let result = f.manager.populate_next_round(f.tournament_id).await;
        assert!(matches!(
            result,
            Err(ProgressionError::Schedule(
                ScheduleError::InsufficientStations { available: 0, .. }
            ))
        ));
    }
}
