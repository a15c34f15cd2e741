//! Heat lifecycle and segment clock management.
//!
//! A heat moves PENDING → READY → RUNNING → DONE. The first two
//! transitions happen here; the move to DONE belongs to the scoring
//! side once a winner is resolved. Within a running heat the three
//! segments are started and stopped strictly in dial-in, cappuccino,
//! espresso order.

use std::sync::Arc;

use chrono::Utc;

use crate::events::{EngineEvent, EventBus};
use crate::heat::errors::{HeatError, HeatResult};
use crate::heat::models::{Heat, HeatId, HeatSegment, HeatStatus, SegmentCode, SegmentStatus};
use crate::store::TournamentStore;

/// Heat manager
#[derive(Clone)]
pub struct HeatManager {
    store: Arc<dyn TournamentStore>,
    events: EventBus,
}

impl HeatManager {
    /// Create a new heat manager
    pub fn new(store: Arc<dyn TournamentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    async fn heat(&self, heat_id: HeatId) -> HeatResult<Heat> {
        self.store
            .get_heat(heat_id)
            .await?
            .ok_or(HeatError::HeatNotFound(heat_id))
    }

    /// Load the full segment triple of a heat, keyed by running order
    async fn segment_triple(&self, heat_id: HeatId) -> HeatResult<Vec<HeatSegment>> {
        let segments = self.store.list_segments(heat_id).await?;
        let complete = SegmentCode::ALL
            .iter()
            .all(|code| segments.iter().any(|s| s.code == *code));
        if segments.len() != SegmentCode::ALL.len() || !complete {
            return Err(HeatError::IncompleteSegmentSet {
                heat_id,
                found: segments.len(),
            });
        }
        Ok(segments)
    }

    /// Mark a pending heat as staged at its station.
    ///
    /// Calling this on an already ready heat is a no-op, so a station
    /// lead can confirm setup twice without harm.
    pub async fn mark_ready(&self, heat_id: HeatId) -> HeatResult<Heat> {
        let mut heat = self.heat(heat_id).await?;
        match heat.status {
            HeatStatus::Ready => return Ok(heat),
            HeatStatus::Pending => {}
            HeatStatus::Done => return Err(HeatError::HeatAlreadyComplete(heat_id)),
            actual => {
                return Err(HeatError::UnexpectedStatus {
                    heat_id,
                    expected: HeatStatus::Pending,
                    actual,
                });
            }
        }

        heat.status = HeatStatus::Ready;
        self.store.update_heat(&heat).await?;
        log::info!("heat {heat_id}: ready at station {:?}", heat.station_id);
        Ok(heat)
    }

    /// Start a segment's clock.
    ///
    /// The heat must be ready or running and the immediately preceding
    /// segment must have ended. Starting the first segment moves the
    /// heat to RUNNING and stamps its start time.
    pub async fn start_segment(
        &self,
        heat_id: HeatId,
        code: SegmentCode,
    ) -> HeatResult<HeatSegment> {
        let mut heat = self.heat(heat_id).await?;
        match heat.status {
            HeatStatus::Ready | HeatStatus::Running => {}
            HeatStatus::Done => return Err(HeatError::HeatAlreadyComplete(heat_id)),
            status => return Err(HeatError::HeatNotReady { heat_id, status }),
        }

        let segments = self.segment_triple(heat_id).await?;
        if let Some(predecessor) = code.predecessor() {
            let ended = segments
                .iter()
                .any(|s| s.code == predecessor && s.status == SegmentStatus::Ended);
            if !ended {
                return Err(HeatError::SegmentOrderViolation {
                    heat_id,
                    code,
                    predecessor,
                });
            }
        }

        let found = segments.len();
        let Some(mut segment) = segments.into_iter().find(|s| s.code == code) else {
            return Err(HeatError::IncompleteSegmentSet { heat_id, found });
        };
        if segment.status != SegmentStatus::Idle {
            return Err(HeatError::SegmentAlreadyStarted { heat_id, code });
        }

        let now = Utc::now();
        segment.status = SegmentStatus::Running;
        segment.started_at = Some(now);
        self.store.update_segment(&segment).await?;

        if heat.status == HeatStatus::Ready {
            heat.status = HeatStatus::Running;
            heat.started_at = Some(now);
            self.store.update_heat(&heat).await?;
        }

        log::info!("heat {heat_id}: {code} started");
        self.events.emit(EngineEvent::SegmentStarted { heat_id, code });
        Ok(segment)
    }

    /// Stop a running segment's clock
    pub async fn stop_segment(
        &self,
        heat_id: HeatId,
        code: SegmentCode,
    ) -> HeatResult<HeatSegment> {
        self.heat(heat_id).await?;

        let segments = self.store.list_segments(heat_id).await?;
        let mut segment = segments
            .into_iter()
            .find(|s| s.code == code)
            .ok_or(HeatError::SegmentNotRunning { heat_id, code })?;
        if segment.status != SegmentStatus::Running {
            return Err(HeatError::SegmentNotRunning { heat_id, code });
        }

        segment.status = SegmentStatus::Ended;
        segment.ended_at = Some(Utc::now());
        self.store.update_segment(&segment).await?;

        log::info!("heat {heat_id}: {code} ended");
        self.events.emit(EngineEvent::SegmentEnded { heat_id, code });
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::models::{NewHeat, NewHeatSegment};
    use crate::schedule::models::RoundTimePlan;
    use crate::store::MemStore;
    use crate::tournament::models::TournamentConfig;

    async fn staged_heat() -> (Arc<MemStore>, HeatManager, Heat) {
        let store = Arc::new(MemStore::new());
        let tournament = store.add_tournament("Winter Jam", TournamentConfig::pooled());
        let roster = store.add_roster(tournament.id, &["Noa", "Iris"]);
        let station = store.add_station("A");

        let heat = store
            .create_heat(&NewHeat::pairing(
                tournament.id,
                1,
                1,
                roster[0].id,
                roster[1].id,
                station.id,
                Utc::now(),
            ))
            .await
            .unwrap();
        let plan = RoundTimePlan::standard(tournament.id, 1);
        for code in SegmentCode::ALL {
            store
                .create_segment(&NewHeatSegment::new(heat.id, code, plan.minutes_for(code)))
                .await
                .unwrap();
        }

        let manager = HeatManager::new(store.clone(), EventBus::default());
        (store, manager, heat)
    }

    #[tokio::test]
    async fn test_mark_ready_is_idempotent() {
        let (_, manager, heat) = staged_heat().await;

        let ready = manager.mark_ready(heat.id).await.unwrap();
        assert_eq!(ready.status, HeatStatus::Ready);

        let again = manager.mark_ready(heat.id).await.unwrap();
        assert_eq!(again.status, HeatStatus::Ready);
    }

    #[tokio::test]
    async fn test_first_segment_start_runs_the_heat() {
        let (store, manager, heat) = staged_heat().await;
        manager.mark_ready(heat.id).await.unwrap();

        let segment = manager
            .start_segment(heat.id, SegmentCode::DialIn)
            .await
            .unwrap();
        assert_eq!(segment.status, SegmentStatus::Running);
        assert!(segment.started_at.is_some());

        let heat = store.get_heat(heat.id).await.unwrap().unwrap();
        assert_eq!(heat.status, HeatStatus::Running);
        assert!(heat.started_at.is_some());
    }

    #[tokio::test]
    async fn test_segments_enforce_running_order() {
        let (_, manager, heat) = staged_heat().await;
        manager.mark_ready(heat.id).await.unwrap();

        let result = manager.start_segment(heat.id, SegmentCode::Cappuccino).await;
        assert!(matches!(
            result,
            Err(HeatError::SegmentOrderViolation {
                code: SegmentCode::Cappuccino,
                predecessor: SegmentCode::DialIn,
                ..
            })
        ));

        // Startable once the predecessor has ended, not before.
        manager.start_segment(heat.id, SegmentCode::DialIn).await.unwrap();
        let result = manager.start_segment(heat.id, SegmentCode::Cappuccino).await;
        assert!(matches!(result, Err(HeatError::SegmentOrderViolation { .. })));

        manager.stop_segment(heat.id, SegmentCode::DialIn).await.unwrap();
        manager.start_segment(heat.id, SegmentCode::Cappuccino).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_segment_run_leaves_heat_running() {
        let (store, manager, heat) = staged_heat().await;
        manager.mark_ready(heat.id).await.unwrap();

        for code in SegmentCode::ALL {
            manager.start_segment(heat.id, code).await.unwrap();
            manager.stop_segment(heat.id, code).await.unwrap();
        }

        let segments = store.list_segments(heat.id).await.unwrap();
        assert!(segments.iter().all(|s| s.status == SegmentStatus::Ended));

        // Winner resolution completes heats; the clock alone does not.
        let heat = store.get_heat(heat.id).await.unwrap().unwrap();
        assert_eq!(heat.status, HeatStatus::Running);
        assert_eq!(heat.winner_id, None);
    }

    #[tokio::test]
    async fn test_segment_cannot_start_twice() {
        let (_, manager, heat) = staged_heat().await;
        manager.mark_ready(heat.id).await.unwrap();
        manager.start_segment(heat.id, SegmentCode::DialIn).await.unwrap();

        let result = manager.start_segment(heat.id, SegmentCode::DialIn).await;
        assert!(matches!(
            result,
            Err(HeatError::SegmentAlreadyStarted {
                code: SegmentCode::DialIn,
                ..
            })
        ));

        // Ended segments may not restart either.
        manager.stop_segment(heat.id, SegmentCode::DialIn).await.unwrap();
        let result = manager.start_segment(heat.id, SegmentCode::DialIn).await;
        assert!(matches!(result, Err(HeatError::SegmentAlreadyStarted { .. })));
    }

    #[tokio::test]
    async fn test_pending_heat_cannot_run_segments() {
        let (_, manager, heat) = staged_heat().await;

        let result = manager.start_segment(heat.id, SegmentCode::DialIn).await;
        assert!(matches!(
            result,
            Err(HeatError::HeatNotReady {
                status: HeatStatus::Pending,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stop_requires_running_segment() {
        let (_, manager, heat) = staged_heat().await;
        manager.mark_ready(heat.id).await.unwrap();

        let result = manager.stop_segment(heat.id, SegmentCode::DialIn).await;
        assert!(matches!(
            result,
            Err(HeatError::SegmentNotRunning {
                code: SegmentCode::DialIn,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_incomplete_segment_set_is_rejected() {
        let store = Arc::new(MemStore::new());
        let tournament = store.add_tournament("Bare", TournamentConfig::pooled());
        let roster = store.add_roster(tournament.id, &["Noa", "Iris"]);
        let station = store.add_station("A");

        // Heat created without its segment triple.
        let heat = store
            .create_heat(&NewHeat::pairing(
                tournament.id,
                1,
                1,
                roster[0].id,
                roster[1].id,
                station.id,
                Utc::now(),
            ))
            .await
            .unwrap();
        let manager = HeatManager::new(store.clone(), EventBus::default());
        manager.mark_ready(heat.id).await.unwrap();

        let result = manager.start_segment(heat.id, SegmentCode::DialIn).await;
        assert!(matches!(
            result,
            Err(HeatError::IncompleteSegmentSet { found: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_done_heat_rejects_segment_starts() {
        let (store, manager, mut heat) = staged_heat().await;
        heat.status = HeatStatus::Done;
        heat.winner_id = Some(heat.competitor1_id);
        store.update_heat(&heat).await.unwrap();

        let result = manager.start_segment(heat.id, SegmentCode::DialIn).await;
        assert!(matches!(result, Err(HeatError::HeatAlreadyComplete(_))));
    }

    #[tokio::test]
    async fn test_segment_events_are_emitted() {
        let (store, _, heat) = staged_heat().await;
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let manager = HeatManager::new(store, events);

        manager.mark_ready(heat.id).await.unwrap();
        manager.start_segment(heat.id, SegmentCode::DialIn).await.unwrap();
        manager.stop_segment(heat.id, SegmentCode::DialIn).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::SegmentStarted {
                heat_id: heat.id,
                code: SegmentCode::DialIn,
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::SegmentEnded {
                heat_id: heat.id,
                code: SegmentCode::DialIn,
            }
        );
    }
}
