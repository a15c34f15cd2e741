//! # Barista Throwdown
//!
//! A bracket-and-scoring engine for head-to-head barista competitions.
//!
//! This library runs single-elimination tournaments where pairs of
//! competitors pour against each other in timed heats at physical
//! espresso stations, judged blind. It covers seeding and byes,
//! station scheduling, the heat state machine, score aggregation with
//! a deterministic tie-break cascade, and the round gating that
//! decides when a tournament may advance.
//!
//! ## Architecture
//!
//! A tournament flows through the engine in a fixed loop:
//!
//! - **Seeding**: an ordered entrant list becomes round-1 pairs, with a
//!   bye for an odd field
//! - **Scheduling**: heats land on the A/B/C station rotation with
//!   staggered start times
//! - **Heats**: each heat runs its DIAL_IN, CAPPUCCINO, ESPRESSO
//!   segments strictly in order
//! - **Judging**: judges submit blind left/right ballots and an admin
//!   reveals which competitor poured which side
//! - **Resolution**: aggregated totals plus a tie-break cascade decide
//!   the winner, written exactly once
//! - **Gating**: a round advances only when every heat, winner, and
//!   station is cleared
//! - **Progression**: standings roll up, losers are eliminated, and
//!   winners pair into the next round until a champion remains
//!
//! ## Core Modules
//!
//! - [`bracket`]: seeding math and round-1 bracket generation
//! - [`schedule`]: station inventory, clocks, and heat scheduling
//! - [`heat`]: the heat and segment state machines
//! - [`scoring`]: ballots, aggregation, and winner resolution
//! - [`progression`]: the round gate, standings rollup, and next-round
//!   population
//! - [`tournament`]: shared tournament and participant models
//! - [`store`]: the storage seam (PostgreSQL and in-memory)
//! - [`events`]: engine event broadcasting
//!
//! ## Example
//!
//! ```
//! use barista_throwdown::bracket::{SeedPairing, round1_pairings};
//!
//! // Five entrants: the top seed sits out round 1.
//! let pairings = round1_pairings(5);
//! assert_eq!(pairings[0], SeedPairing::Bye { seed: 1 });
//! assert_eq!(pairings.len(), 3);
//! ```

/// Seeding math and bracket generation.
pub mod bracket;
pub use bracket::BracketManager;

/// Station inventory and heat scheduling.
pub mod schedule;
pub use schedule::StationScheduler;

/// Heat lifecycle and the segment state machine.
pub mod heat;
pub use heat::HeatManager;

/// Blind judging, score aggregation, and winner resolution.
pub mod scoring;
pub use scoring::ScoringManager;

/// Round gating, progression, and next-round population.
pub mod progression;
pub use progression::ProgressionManager;

/// Shared tournament and participant models.
pub mod tournament;

/// The storage seam and its implementations.
pub mod store;
pub use store::{MemStore, PgStore, TournamentStore};

/// Engine event broadcasting.
pub mod events;
pub use events::{EngineEvent, EventBus};
