//! Heat lifecycle and the segment state machine.
//!
//! This module implements:
//! - The heat model (Pending, Ready, Running, Done) with bye support
//! - The fixed DIAL_IN, CAPPUCCINO, ESPRESSO segment triple per heat
//! - Strict segment ordering (a segment starts only after its
//!   predecessor has ended)
//! - Station-lead staging via `mark_ready`
//!
//! Completing a heat with a winner is the scoring manager's job;
//! running out the segment clocks alone never decides anything.
//!
//! ## Example
//!
//! ```no_run
//! use barista_throwdown::events::EventBus;
//! use barista_throwdown::heat::{HeatManager, NewHeat, NewHeatSegment, SegmentCode};
//! use barista_throwdown::store::{MemStore, TournamentStore};
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemStore::new());
//!     let heat = store
//!         .create_heat(&NewHeat::pairing(1, 1, 1, 10, 20, 1, Utc::now()))
//!         .await?;
//!     for code in SegmentCode::ALL {
//!         store.create_segment(&NewHeatSegment::new(heat.id, code, 5)).await?;
//!     }
//!
//!     let manager = HeatManager::new(store.clone(), EventBus::default());
//!     manager.mark_ready(heat.id).await?;
//!     manager.start_segment(heat.id, SegmentCode::DialIn).await?;
//!     manager.stop_segment(heat.id, SegmentCode::DialIn).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{HeatError, HeatResult};
pub use manager::HeatManager;
pub use models::{
    Heat, HeatId, HeatSegment, HeatStatus, NewHeat, NewHeatSegment, SegmentCode, SegmentId,
    SegmentStatus,
};
