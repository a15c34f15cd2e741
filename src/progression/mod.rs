//! Round gating, progression, and next-round population.
//!
//! This module implements:
//! - The pure round gate: every heat Done, every winner recorded, and
//!   every station with heats fully cleared
//! - Round completion: standings rollup, eliminations, advancing the
//!   round pointer or crowning the champion
//! - Next-round population: pairing winners in heat order with at most
//!   one bye per round
//! - The per-tournament fail-fast advance lock shared by both write
//!   operations
//!
//! ## Example
//!
//! ```no_run
//! use barista_throwdown::events::EventBus;
//! use barista_throwdown::progression::ProgressionManager;
//! use barista_throwdown::schedule::StationScheduler;
//! use barista_throwdown::store::MemStore;
//! use barista_throwdown::tournament::TournamentConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemStore::new());
//!     let tournament = store.add_tournament("City Throwdown", TournamentConfig::pooled());
//!
//!     let scheduler = StationScheduler::new(store.clone());
//!     let progression = ProgressionManager::new(store.clone(), scheduler, EventBus::default());
//!
//!     let report = progression.round_gate(tournament.id, 1).await?;
//!     if report.is_complete() {
//!         progression.complete_round(tournament.id, 1).await?;
//!         progression.populate_next_round(tournament.id).await?;
//!     } else {
//!         println!("still waiting on heats {:?}", report.pending_heats);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod gate;
pub mod manager;

pub use errors::{ProgressionError, ProgressionResult};
pub use gate::{RoundGateReport, StationRoundReport};
pub use manager::ProgressionManager;
