//! # Equipment interface crate.
//!
//! Provides the interfaces between the vehicle control modules and the equipment they sense and
//! actuate. Board-specific drivers (and the simulation) implement these traits, the control
//! modules only ever see the traits.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Linear actuator (brake) position sensor and drive channels
pub mod brake;

/// Orientation and acceleration sensing
pub mod imu;

/// Drive motors
pub mod motor;

/// Wheel odometry
pub mod odom;

/// Free running interval timers
pub mod timer;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by equipment.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EqptError {
    #[error("The equipment did not respond")]
    NoResponse,

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Equipment reported an out of range value: {0}")]
    OutOfRange(f64),
}
