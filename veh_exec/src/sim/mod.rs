//! # Simulated equipment
//!
//! Stand-ins for the vehicle's sensors and actuators so the controllers can be run on a
//! development machine. Each simulation owns a shared world and hands out handles which
//! implement the `eqpt_if` traits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod brake;
mod vehicle;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

pub use brake::*;
pub use vehicle::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for all simulated equipment, loaded from `sim.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub vehicle: SimVehicleParams,
    pub brake: SimBrakeParams,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Lock a world, carrying on with the data if another handle panicked while holding it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
