//! Opening-round bracket generation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::bracket::errors::{BracketError, BracketResult};
use crate::bracket::seeding::{self, SeedPairing};
use crate::events::{EngineEvent, EventBus};
use crate::heat::models::{Heat, NewHeat, NewHeatSegment, SegmentCode};
use crate::schedule::scheduler::StationScheduler;
use crate::store::TournamentStore;
use crate::tournament::models::{ParticipantId, TournamentId, TournamentStatus};

/// Bracket manager
#[derive(Clone)]
pub struct BracketManager {
    store: Arc<dyn TournamentStore>,
    scheduler: StationScheduler,
    events: EventBus,
}

impl BracketManager {
    /// Create a new bracket manager
    pub fn new(
        store: Arc<dyn TournamentStore>,
        scheduler: StationScheduler,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            scheduler,
            events,
        }
    }

    /// Seed round 1, schedule its heats, and start the tournament.
    ///
    /// The roster's seeds drive the pairings: an even field plays
    /// 1-vs-N down to the middle, an odd field gives seed 1 the bye.
    /// Contested heats are spread across the freshly staggered A/B/C
    /// rotation; every heat gets its dial-in/cappuccino/espresso
    /// segment triple. On success the tournament is in progress at
    /// round 1 with `total_rounds` fixed for the whole run.
    ///
    /// # Errors
    ///
    /// * `InvalidStatus` - the tournament already left registration
    /// * `InvalidFieldSize` - fewer than two participants
    /// * `Schedule` - fewer than three stations are available
    pub async fn generate_bracket(&self, tournament_id: TournamentId) -> BracketResult<Vec<Heat>> {
        let tournament = self
            .store
            .get_tournament(tournament_id)
            .await?
            .ok_or(BracketError::TournamentNotFound(tournament_id))?;
        if tournament.status != TournamentStatus::Registration {
            return Err(BracketError::InvalidStatus {
                expected: TournamentStatus::Registration,
                actual: tournament.status,
            });
        }

        let participants = self.store.list_participants(tournament_id).await?;
        if participants.len() < 2 {
            return Err(BracketError::InvalidFieldSize(participants.len()));
        }
        let by_seed: HashMap<u32, ParticipantId> =
            participants.iter().map(|p| (p.seed, p.id)).collect();
        let competitor = |seed: u32| -> BracketResult<ParticipantId> {
            by_seed.get(&seed).copied().ok_or(BracketError::MissingSeed(seed))
        };

        let field_size = participants.len() as u32;
        let now = Utc::now();
        self.scheduler.stagger_rotation(now).await?;
        let plan = self.scheduler.round_plan_or_default(tournament_id, 1).await?;

        let mut heats = Vec::new();
        for (i, pairing) in seeding::round1_pairings(field_size).into_iter().enumerate() {
            let heat_number = i as u32 + 1;
            let new_heat = match pairing {
                SeedPairing::Bye { seed } => {
                    NewHeat::bye(tournament_id, 1, heat_number, competitor(seed)?, now)
                }
                SeedPairing::Contest { first, second } => {
                    let (station_id, scheduled_at) = self.scheduler.assign_next(&plan).await?;
                    NewHeat::pairing(
                        tournament_id,
                        1,
                        heat_number,
                        competitor(first)?,
                        competitor(second)?,
                        station_id,
                        scheduled_at,
                    )
                }
            };
            let heat = self.store.create_heat(&new_heat).await?;
            for code in SegmentCode::ALL {
                let segment = NewHeatSegment::new(heat.id, code, plan.minutes_for(code));
                self.store.create_segment(&segment).await?;
            }
            heats.push(heat);
        }

        let total_rounds = seeding::rounds_for(field_size);
        self.store
            .set_tournament_rounds(tournament_id, 1, total_rounds)
            .await?;
        self.store
            .set_tournament_status(tournament_id, TournamentStatus::InProgress)
            .await?;

        log::info!(
            "tournament {tournament_id}: bracket generated, {} heats over {total_rounds} rounds",
            heats.len()
        );
        self.events.emit(EngineEvent::BracketGenerated {
            tournament_id,
            round: 1,
            heat_count: heats.len(),
        });
        Ok(heats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::models::HeatStatus;
    use crate::schedule::errors::ScheduleError;
    use crate::store::MemStore;
    use crate::tournament::models::TournamentConfig;
    use chrono::Duration;

    fn throwdown(names: &[&str]) -> (Arc<MemStore>, BracketManager, TournamentId) {
        let store = Arc::new(MemStore::new());
        let tournament = store.add_tournament("City Throwdown", TournamentConfig::pooled());
        store.add_roster(tournament.id, names);
        store.add_standard_stations();

        let scheduler = StationScheduler::new(store.clone());
        let manager = BracketManager::new(store.clone(), scheduler, EventBus::default());
        (store, manager, tournament.id)
    }

    #[tokio::test]
    async fn test_five_competitor_bracket() {
        let (store, manager, tournament_id) = throwdown(&["S1", "S2", "S3", "S4", "S5"]);
        let roster = store.list_participants(tournament_id).await.unwrap();

        let heats = manager.generate_bracket(tournament_id).await.unwrap();
        assert_eq!(heats.len(), 3);

        // Seed 1 takes the bye, born complete without a station.
        let bye = &heats[0];
        assert!(bye.is_bye());
        assert_eq!(bye.status, HeatStatus::Done);
        assert_eq!(bye.winner_id, Some(roster[0].id));
        assert_eq!(bye.station_id, None);

        // 2v5 and 3v4 wait at their stations.
        assert_eq!(
            heats[1].competitors(),
            Some((roster[1].id, roster[4].id))
        );
        assert_eq!(
            heats[2].competitors(),
            Some((roster[2].id, roster[3].id))
        );
        for heat in &heats[1..] {
            assert_eq!(heat.status, HeatStatus::Pending);
            assert!(heat.station_id.is_some());
        }

        let tournament = store.get_tournament(tournament_id).await.unwrap().unwrap();
        assert_eq!(tournament.status, TournamentStatus::InProgress);
        assert_eq!(tournament.current_round, 1);
        assert_eq!(tournament.total_rounds, 3);
        assert!(tournament.started_at.is_some());
    }

    #[tokio::test]
    async fn test_even_field_pairs_top_against_bottom() {
        let (store, manager, tournament_id) = throwdown(&["S1", "S2", "S3", "S4"]);
        let roster = store.list_participants(tournament_id).await.unwrap();

        let heats = manager.generate_bracket(tournament_id).await.unwrap();
        assert_eq!(heats.len(), 2);
        assert_eq!(heats[0].competitors(), Some((roster[0].id, roster[3].id)));
        assert_eq!(heats[1].competitors(), Some((roster[1].id, roster[2].id)));
        assert!(heats.iter().all(|h| !h.is_bye()));

        let tournament = store.get_tournament(tournament_id).await.unwrap().unwrap();
        assert_eq!(tournament.total_rounds, 2);
    }

    #[tokio::test]
    async fn test_contested_heats_spread_over_stagger() {
        let (store, manager, tournament_id) = throwdown(&["S1", "S2", "S3", "S4", "S5", "S6"]);

        let heats = manager.generate_bracket(tournament_id).await.unwrap();
        let stations = store.list_stations().await.unwrap();
        assert_eq!(heats[0].station_id, Some(stations[0].id));
        assert_eq!(heats[1].station_id, Some(stations[1].id));
        assert_eq!(heats[2].station_id, Some(stations[2].id));

        let first = heats[0].scheduled_at.unwrap();
        assert_eq!(heats[1].scheduled_at, Some(first + Duration::minutes(10)));
        assert_eq!(heats[2].scheduled_at, Some(first + Duration::minutes(20)));
    }

    #[tokio::test]
    async fn test_every_heat_gets_the_segment_triple() {
        let (store, manager, tournament_id) = throwdown(&["S1", "S2", "S3"]);

        let heats = manager.generate_bracket(tournament_id).await.unwrap();
        for heat in &heats {
            let segments = store.list_segments(heat.id).await.unwrap();
            let codes: Vec<SegmentCode> = segments.iter().map(|s| s.code).collect();
            assert_eq!(codes, SegmentCode::ALL);
            assert_eq!(
                segments.iter().map(|s| s.planned_minutes).sum::<u32>(),
                15
            );
        }
    }

    #[tokio::test]
    async fn test_field_of_one_is_rejected() {
        let (_, manager, tournament_id) = throwdown(&["Solo"]);
        let result = manager.generate_bracket(tournament_id).await;
        assert!(matches!(result, Err(BracketError::InvalidFieldSize(1))));
    }

    #[tokio::test]
    async fn test_short_rotation_is_rejected() {
        let store = Arc::new(MemStore::new());
        let tournament = store.add_tournament("Short", TournamentConfig::pooled());
        store.add_roster(tournament.id, &["S1", "S2"]);
        store.add_station("A");
        let scheduler = StationScheduler::new(store.clone());
        let manager = BracketManager::new(store, scheduler, EventBus::default());

        let result = manager.generate_bracket(tournament.id).await;
        assert!(matches!(
            result,
            Err(BracketError::Schedule(
                ScheduleError::InsufficientStations { available: 1, .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_bracket_cannot_generate_twice() {
        let (_, manager, tournament_id) = throwdown(&["S1", "S2", "S3", "S4"]);
        manager.generate_bracket(tournament_id).await.unwrap();

        let result = manager.generate_bracket(tournament_id).await;
        assert!(matches!(
            result,
            Err(BracketError::InvalidStatus {
                actual: TournamentStatus::InProgress,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_generation_announces_itself() {
        let store = Arc::new(MemStore::new());
        let tournament = store.add_tournament("Announced", TournamentConfig::pooled());
        store.add_roster(tournament.id, &["S1", "S2", "S3", "S4", "S5"]);
        store.add_standard_stations();
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let scheduler = StationScheduler::new(store.clone());
        let manager = BracketManager::new(store, scheduler, events);

        manager.generate_bracket(tournament.id).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "bracket:generated");
        assert_eq!(
            event,
            EngineEvent::BracketGenerated {
                tournament_id: tournament.id,
                round: 1,
                heat_count: 3,
            }
        );
    }
}
