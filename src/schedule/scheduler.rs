//! Station assignment and start-time scheduling.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::heat::models::{Heat, HeatStatus};
use crate::schedule::errors::{ScheduleError, ScheduleResult};
use crate::schedule::models::{RoundTimePlan, Station, StationId, StationStatus};
use crate::store::TournamentStore;
use crate::tournament::models::TournamentId;

/// Stations in the canonical A/B/C rotation
pub const ROTATION_SIZE: usize = 3;

/// Minutes between the staggered opening slots of the rotation
pub const STAGGER_MINUTES: i64 = 10;

/// Cleanup and reset minutes reserved after every heat
pub const INTER_HEAT_BUFFER_MINUTES: i64 = 10;

/// Assigns stations to heats and keeps their availability clocks.
///
/// Station rows are read-modify-write under one internal lock, so a
/// slot handed to one heat can never be handed to another. Clone
/// handles share the lock; every manager that schedules heats must
/// hold a clone of the same scheduler.
#[derive(Clone)]
pub struct StationScheduler {
    store: Arc<dyn TournamentStore>,
    assign_lock: Arc<Mutex<()>>,
}

impl StationScheduler {
    /// Create a scheduler over the given store
    pub fn new(store: Arc<dyn TournamentStore>) -> Self {
        Self {
            store,
            assign_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The time plan for a round, creating and persisting the
    /// standard 10/3/2 split on first use
    pub async fn round_plan_or_default(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> ScheduleResult<RoundTimePlan> {
        if let Some(plan) = self.store.get_round_plan(tournament_id, round).await? {
            return Ok(plan);
        }
        let plan = RoundTimePlan::standard(tournament_id, round);
        self.store.insert_round_plan(&plan).await?;
        log::debug!(
            "tournament {tournament_id} round {round}: standard time plan created ({} min)",
            plan.total_minutes()
        );
        Ok(plan)
    }

    /// Stations currently taking new heats, in name order
    pub async fn available_stations(&self) -> ScheduleResult<Vec<Station>> {
        let stations = self.store.list_stations().await?;
        Ok(stations.into_iter().filter(Station::is_available).collect())
    }

    /// Change a station's availability.
    ///
    /// Taking a station Offline only stops it receiving new heats;
    /// heats already assigned to it stay where they are.
    pub async fn set_station_status(
        &self,
        station_id: StationId,
        status: StationStatus,
    ) -> ScheduleResult<Station> {
        let mut station = self
            .store
            .get_station(station_id)
            .await?
            .ok_or(ScheduleError::StationNotFound(station_id))?;
        station.status = status;
        self.store.update_station(&station).await?;
        log::info!("station {} is now {status:?}", station.name);
        Ok(station)
    }

    /// The heat currently running on a station, if any.
    ///
    /// Derived from heat rows on every call; the station itself never
    /// stores which heat it is playing.
    pub async fn current_heat_for_station(
        &self,
        tournament_id: TournamentId,
        station_id: StationId,
    ) -> ScheduleResult<Option<Heat>> {
        self.store
            .get_station(station_id)
            .await?
            .ok_or(ScheduleError::StationNotFound(station_id))?;
        let heats = self.store.list_heats(tournament_id).await?;
        Ok(heats
            .into_iter()
            .find(|h| h.station_id == Some(station_id) && h.status == HeatStatus::Running))
    }

    /// Stagger the rotation's opening slots for a fresh bracket.
    ///
    /// The first station opens at `now`, the second ten minutes later,
    /// the third ten after that. Fails with `InsufficientStations`
    /// unless the full rotation is available; a fresh bracket never
    /// starts short-handed.
    pub async fn stagger_rotation(&self, now: DateTime<Utc>) -> ScheduleResult<Vec<Station>> {
        let _guard = self.assign_lock.lock().await;

        let mut rotation = self.available_stations().await?;
        if rotation.len() < ROTATION_SIZE {
            return Err(ScheduleError::InsufficientStations {
                available: rotation.len(),
                required: ROTATION_SIZE,
            });
        }
        rotation.truncate(ROTATION_SIZE);

        for (i, station) in rotation.iter_mut().enumerate() {
            station.next_available_at = now + Duration::minutes(STAGGER_MINUTES * i as i64);
            self.store.update_station(station).await?;
            log::debug!(
                "station {} opens at {}",
                station.name,
                station.next_available_at
            );
        }
        Ok(rotation)
    }

    /// Reserve the next slot for one heat and return the station and
    /// start time.
    ///
    /// Picks the available station whose clock is earliest, then
    /// advances that clock by the plan's total plus the inter-heat
    /// buffer. A station's clock never moves backwards.
    pub async fn assign_next(
        &self,
        plan: &RoundTimePlan,
    ) -> ScheduleResult<(StationId, DateTime<Utc>)> {
        let _guard = self.assign_lock.lock().await;

        let mut station = self
            .available_stations()
            .await?
            .into_iter()
            .min_by_key(|s| s.next_available_at)
            .ok_or(ScheduleError::NoAvailableStation)?;

        let scheduled_at = station.next_available_at;
        station.next_available_at = scheduled_at
            + Duration::minutes(plan.total_minutes() as i64 + INTER_HEAT_BUFFER_MINUTES);
        self.store.update_station(&station).await?;

        log::debug!(
            "station {} reserved until {}",
            station.name,
            station.next_available_at
        );
        Ok((station.id, scheduled_at))
    }
}
