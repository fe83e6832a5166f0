//! Firework burst simulation
//!
//! A burst is one time-limited group of particles sharing an origin, color,
//! sprite and animation progress. `attributes` generates the per-particle
//! initial state, `burst` owns one burst's lifecycle, and `scheduler` decides
//! when and where new bursts appear.

mod attributes;
mod burst;
mod scheduler;

pub use attributes::{generate_attributes, BurstAttributes};
pub use burst::{Burst, BurstState, BURST_DURATION};
pub use scheduler::{BurstScheduler, BurstTuning, SpawnRequest};

use thiserror::Error;

/// Why a spawn was refused. Spawning is best-effort: the scheduler logs
/// these and the frame loop carries on.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("invalid spawn parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("particle buffer allocation failed")]
    Allocation(#[from] std::collections::TryReserveError),
}
