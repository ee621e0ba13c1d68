//! # Drive Motor Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::EqptError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Which side of the vehicle a drive motor is on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorSide {
    Left,
    Right
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A speed controlled drive motor.
///
/// Speeds are signed percentages of full speed, positive is forwards.
pub trait Motor {
    /// Energise the motor driver and command an initial speed.
    fn start(&mut self, speed: i32) -> Result<(), EqptError>;

    /// Command a new speed.
    fn set_output(&mut self, speed: i32) -> Result<(), EqptError>;

    /// Immediately stop and de-energise the motor.
    fn stop(&mut self) -> Result<(), EqptError>;
}
