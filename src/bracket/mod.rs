//! Bracket generation for single-elimination tournaments.
//!
//! This module implements:
//! - Seed pairing math with mirror seeding and bye placement
//! - Round-1 heat creation with staggered station scheduling
//! - Bracket length derivation (`ceil(log2(N))` rounds)
//! - Tournament transition from Registration to InProgress
//!
//! ## Example
//!
//! ```no_run
//! use barista_throwdown::bracket::BracketManager;
//! use barista_throwdown::events::EventBus;
//! use barista_throwdown::schedule::StationScheduler;
//! use barista_throwdown::store::MemStore;
//! use barista_throwdown::tournament::TournamentConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemStore::new());
//!     let tournament = store.add_tournament("City Throwdown", TournamentConfig::pooled());
//!     store.add_roster(tournament.id, &["june", "ari", "sam", "noor", "kit"]);
//!     store.add_standard_stations();
//!
//!     let scheduler = StationScheduler::new(store.clone());
//!     let bracket = BracketManager::new(store.clone(), scheduler, EventBus::default());
//!
//!     // Five entrants: seed 1 gets the bye, 2v5 and 3v4 play.
//!     let heats = bracket.generate_bracket(tournament.id).await?;
//!     println!("round 1 has {} heats", heats.len());
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod seeding;

pub use errors::{BracketError, BracketResult};
pub use manager::BracketManager;
pub use seeding::{SeedPairing, round1_pairings, rounds_for, sequential_pairs};
