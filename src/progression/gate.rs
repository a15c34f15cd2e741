//! Round completeness evaluation.
//!
//! The gate is a pure function over one read of a round's heats: no
//! locks, no writes, safe to poll from a refresh loop. Progression
//! calls it before mutating anything; UIs call it to show what is
//! still in the way.

use serde::Serialize;

use crate::heat::models::{Heat, HeatId, HeatStatus};
use crate::schedule::models::StationId;
use crate::tournament::models::TournamentId;

/// Completion state of one station's share of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationRoundReport {
    /// Station the heats are assigned to
    pub station_id: StationId,
    /// The station's heats in this round
    pub heat_ids: Vec<HeatId>,
    /// Whether every one of them is done with a winner
    pub is_complete: bool,
}

/// Structured answer to "may this round advance?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundGateReport {
    /// Tournament evaluated
    pub tournament_id: TournamentId,
    /// Round evaluated
    pub round: u32,
    /// Heats found in the round
    pub heat_count: usize,
    /// Whether every heat has reached DONE
    pub all_heats_done: bool,
    /// Whether every finished heat has a recorded winner
    pub all_winners_recorded: bool,
    /// Heats still short of DONE
    pub pending_heats: Vec<HeatId>,
    /// Heats that finished without a winner
    pub missing_winners: Vec<HeatId>,
    /// Per-station breakdown, stations without round heats omitted
    pub stations: Vec<StationRoundReport>,
}

impl RoundGateReport {
    /// Whether the round may advance: at least one heat, all done,
    /// all winners recorded, every assigned station cleared
    pub fn is_complete(&self) -> bool {
        self.heat_count > 0
            && self.all_heats_done
            && self.all_winners_recorded
            && self.stations.iter().all(|s| s.is_complete)
    }
}

fn heat_cleared(heat: &Heat) -> bool {
    heat.status == HeatStatus::Done && heat.winner_id.is_some()
}

/// Evaluate the gate for one round from a single heats read
pub fn evaluate(tournament_id: TournamentId, round: u32, heats: &[Heat]) -> RoundGateReport {
    let pending_heats: Vec<HeatId> = heats
        .iter()
        .filter(|h| h.status != HeatStatus::Done)
        .map(|h| h.id)
        .collect();
    let missing_winners: Vec<HeatId> = heats
        .iter()
        .filter(|h| h.status == HeatStatus::Done && h.winner_id.is_none())
        .map(|h| h.id)
        .collect();

    let mut stations: Vec<StationRoundReport> = Vec::new();
    for heat in heats {
        let Some(station_id) = heat.station_id else {
            continue;
        };
        match stations.iter_mut().find(|s| s.station_id == station_id) {
            Some(report) => {
                report.heat_ids.push(heat.id);
                report.is_complete &= heat_cleared(heat);
            }
            None => stations.push(StationRoundReport {
                station_id,
                heat_ids: vec![heat.id],
                is_complete: heat_cleared(heat),
            }),
        }
    }

    RoundGateReport {
        tournament_id,
        round,
        heat_count: heats.len(),
        all_heats_done: pending_heats.is_empty(),
        all_winners_recorded: missing_winners.is_empty(),
        pending_heats,
        missing_winners,
        stations,
    }
}
