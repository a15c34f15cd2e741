//! Station inventory and heat scheduling.
//!
//! This module implements:
//! - The station model with availability states and per-station clocks
//! - Staggered opening slots for the canonical A/B/C rotation
//! - Earliest-clock station assignment behind a single critical section
//! - Per-round segment time plans with a persisted 10/3/2 default
//! - Station status changes and the running-heat projection
//!
//! ## Example
//!
//! ```no_run
//! use barista_throwdown::schedule::{RoundTimePlan, StationScheduler};
//! use barista_throwdown::store::MemStore;
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemStore::new());
//!     store.add_standard_stations();
//!
//!     let scheduler = StationScheduler::new(store);
//!     scheduler.stagger_rotation(Utc::now()).await?;
//!
//!     let plan = RoundTimePlan::standard(1, 1);
//!     let (station_id, starts_at) = scheduler.assign_next(&plan).await?;
//!     println!("next heat plays on station {station_id} at {starts_at}");
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod models;
pub mod scheduler;

pub use errors::{ScheduleError, ScheduleResult};
pub use models::{RoundTimePlan, Station, StationId, StationStatus};
pub use scheduler::{
    INTER_HEAT_BUFFER_MINUTES, ROTATION_SIZE, STAGGER_MINUTES, StationScheduler,
};
