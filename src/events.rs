//! Engine event broadcasting.
//!
//! Managers emit an [`EngineEvent`] after every externally visible
//! state change so displays, stream overlays, and audit logs can
//! follow the bracket live. Delivery is lossy: a slow subscriber drops
//! its own backlog and never stalls the engine.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::heat::models::{HeatId, SegmentCode};
use crate::tournament::models::{ParticipantId, TournamentId};

/// Default broadcast channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Externally visible engine state changes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A round's heats were created and scheduled
    BracketGenerated {
        tournament_id: TournamentId,
        round: u32,
        heat_count: usize,
    },
    /// A segment clock started
    SegmentStarted { heat_id: HeatId, code: SegmentCode },
    /// A segment clock stopped
    SegmentEnded { heat_id: HeatId, code: SegmentCode },
    /// A heat was decided
    HeatCompleted {
        heat_id: HeatId,
        winner_id: ParticipantId,
    },
    /// A round passed its gate and was closed out
    RoundCompleted {
        tournament_id: TournamentId,
        round: u32,
    },
    /// The champion was crowned
    TournamentFinalized {
        tournament_id: TournamentId,
        winner_id: ParticipantId,
    },
}

impl EngineEvent {
    /// Stable wire name of this event kind
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::BracketGenerated { .. } => "bracket:generated",
            EngineEvent::SegmentStarted { .. } => "segment:started",
            EngineEvent::SegmentEnded { .. } => "segment:ended",
            EngineEvent::HeatCompleted { .. } => "heat:completed",
            EngineEvent::RoundCompleted { .. } => "round:completed",
            EngineEvent::TournamentFinalized { .. } => "tournament:finalized",
        }
    }
}

impl std::fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::BracketGenerated {
                tournament_id,
                round,
                heat_count,
            } => write!(
                f,
                "tournament {tournament_id} round {round}: {heat_count} heats scheduled"
            ),
            EngineEvent::SegmentStarted { heat_id, code } => {
                write!(f, "heat {heat_id}: {code} started")
            }
            EngineEvent::SegmentEnded { heat_id, code } => {
                write!(f, "heat {heat_id}: {code} ended")
            }
            EngineEvent::HeatCompleted { heat_id, winner_id } => {
                write!(f, "heat {heat_id}: won by participant {winner_id}")
            }
            EngineEvent::RoundCompleted {
                tournament_id,
                round,
            } => write!(f, "tournament {tournament_id}: round {round} completed"),
            EngineEvent::TournamentFinalized {
                tournament_id,
                winner_id,
            } => write!(
                f,
                "tournament {tournament_id}: champion is participant {winner_id}"
            ),
        }
    }
}

/// Handle for broadcasting engine events to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to engine events from this point forward
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current subscribers.
    ///
    /// Send errors only mean nobody is listening, which is normal for
    /// a headless engine, so they are ignored.
    pub fn emit(&self, event: EngineEvent) {
        log::debug!("event {}: {event}", event.name());
        let _ = self.tx.send(event);
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
