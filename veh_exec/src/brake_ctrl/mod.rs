//! # Brake control module
//!
//! Positions the brake's linear actuator with a bang-bang servo: the actuator is driven at a
//! fixed duty in one direction until the position sensor shows the target has been reached.
//! Seeks are bounded in time and watched for stalls, any fault de-energises the actuator and
//! latches [`BrakeState::Faulted`] until [`BrakeCtrl::reset_fault`] is called.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// [`eqpt_if::brake::DriveChannel`] implementation for `embedded_hal` PWM pins.
pub mod hal_drive;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::EqptError;
use serde::Serialize;

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during BrakeCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum BrakeError {
    #[error("The brake has been stopped and cannot be commanded again")]
    Disabled,

    #[error("The brake is faulted, reset the fault before commanding it")]
    Faulted,

    #[error("Could not read the brake position: {0}")]
    SensorUnavailable(EqptError),

    #[error(
        "Actuator stalled at {position:.3} after {elapsed_s:.3} s while seeking {target:.3}"
    )]
    ActuatorStall {
        target: f64,
        position: f64,
        elapsed_s: f64,
    },

    #[error("Could not set the brake drive: {0}")]
    Drive(EqptError),

    #[error("Could not set the actuator enable line")]
    EnableLine,

    #[error("Brake parameters are invalid: {0}")]
    InvalidParams(ParamsError),

    #[error("Target position {0} is not a number")]
    InvalidTarget(f64),
}

/// Activity of the brake actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrakeState {
    Idle,
    Extending,
    Retracting,

    /// A seek failed, the actuator is de-energised and the enable line is low.
    Faulted,
}

/// Direction the actuator was driven during a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Motion {
    /// Already inside the hysteresis band.
    None,
    Extend,
    Retract,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl From<ParamsError> for BrakeError {
    fn from(e: ParamsError) -> Self {
        BrakeError::InvalidParams(e)
    }
}
