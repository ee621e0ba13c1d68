//! # Steering control module
//!
//! Holds a differential drive vehicle on the heading it was pointing at when the mission began,
//! for a set odometry distance.
//!
//! - [`heading`] - wraparound handling and the differential output mapping
//! - [`SteerCtrl`] - per-cycle processing of one sensor sample into motor demands
//! - [`SteerSupervisor`] - owns the equipment and runs the interval gated control loop

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

#[cfg(test)]
mod fakes;
pub mod heading;
mod params;
mod state;
mod supervisor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::EqptError;

pub use params::*;
pub use state::*;
pub use supervisor::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SteerCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SteerCtrlError {
    #[error("Steering parameters are invalid: {0}")]
    InvalidParams(ParamsError),

    #[error("Heading sensor unavailable: {0}")]
    SensorUnavailable(EqptError),

    #[error("Drive motor fault: {0}")]
    MotorFault(EqptError),

    #[error(
        "Control interval overrun: {elapsed_s:.4} s since the last step, interval is \
         {interval_s:.4} s"
    )]
    TimingViolation {
        elapsed_s: f64,
        interval_s: f64
    },

    #[error("Steering has not been started, no setpoint is set")]
    NotStarted,

    #[error("Steering has already been started with a setpoint of {0} deg")]
    AlreadyStarted(f64),

    #[error("Could not create the steering PID loop: {0}")]
    PidError(crate::pid::PidError),
}

impl From<ParamsError> for SteerCtrlError {
    fn from(e: ParamsError) -> Self {
        SteerCtrlError::InvalidParams(e)
    }
}
