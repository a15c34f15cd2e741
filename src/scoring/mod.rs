//! Blind judging, score aggregation, and winner resolution.
//!
//! This module implements:
//! - Judge ballots with blind left/right verdicts, upserted per judge
//! - Admin cup-position assignment that reconciles cups to competitors
//! - Pure point aggregation (latte art 3, sensory 1 each, overall 5)
//! - The winner cascade: total, overall wins, latte art wins, sensory
//!   wins, then manual resolution
//! - Compare-and-swap heat completion so a heat is decided exactly once
//!
//! ## Example
//!
//! ```no_run
//! use barista_throwdown::events::EventBus;
//! use barista_throwdown::heat::{HeatStatus, NewHeat};
//! use barista_throwdown::scoring::{
//!     Beverage, CupPosition, CupSide, JudgeRole, NewJudgeBallot, ScoringManager,
//! };
//! use barista_throwdown::store::{MemStore, TournamentStore};
//! use barista_throwdown::tournament::TournamentConfig;
//! use chrono::Utc;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemStore::new());
//!     let tournament = store.add_tournament("City Throwdown", TournamentConfig::pooled());
//!     let mut heat = store
//!         .create_heat(&NewHeat::pairing(tournament.id, 1, 1, 10, 20, 1, Utc::now()))
//!         .await?;
//!     heat.status = HeatStatus::Running;
//!     store.update_heat(&heat).await?;
//!
//!     let scoring = ScoringManager::new(store.clone(), EventBus::default());
//!     scoring
//!         .assign_cup_positions(
//!             heat.id,
//!             vec![
//!                 CupPosition {
//!                     heat_id: heat.id,
//!                     participant_id: 10,
//!                     cup_code: "M7".to_string(),
//!                     side: CupSide::Left,
//!                 },
//!                 CupPosition {
//!                     heat_id: heat.id,
//!                     participant_id: 20,
//!                     cup_code: "K9".to_string(),
//!                     side: CupSide::Right,
//!                 },
//!             ],
//!         )
//!         .await?;
//!     scoring
//!         .submit_ballot(NewJudgeBallot {
//!             heat_id: heat.id,
//!             judge_id: Uuid::new_v4(),
//!             judge_role: JudgeRole::Sensory,
//!             beverage: Beverage::Espresso,
//!             left_cup_code: "M7".to_string(),
//!             right_cup_code: "K9".to_string(),
//!             visual_latte_art: None,
//!             taste: Some(CupSide::Left),
//!             tactile: Some(CupSide::Left),
//!             flavour: Some(CupSide::Left),
//!             overall: Some(CupSide::Left),
//!         })
//!         .await?;
//!
//!     let resolution = scoring.finalize_heat(heat.id).await?;
//!     println!("{}", resolution.reason());
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod errors;
pub mod manager;
pub mod models;
pub mod resolver;

pub use errors::{ScoringError, ScoringResult};
pub use manager::ScoringManager;
pub use models::{
    BallotId, Beverage, CupPosition, CupSide, HeatScore, JudgeBallot, JudgeId, JudgeRole,
    NewJudgeBallot,
};
pub use resolver::{WinnerResolution, resolve_winner};
