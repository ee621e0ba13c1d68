//! # Brake Actuator Interface
//!
//! The brake is a linear actuator driven through an H-bridge with two complementary PWM
//! channels (extend and retract) and fed back by an analogue position sensor.

use crate::EqptError;

/// Position feedback of a linear actuator.
pub trait PositionSensor {
    /// Read the extension of the actuator as a fraction of its full travel, in [0, 1].
    fn read(&mut self) -> Result<f64, EqptError>;
}

/// One PWM channel of an H-bridge.
pub trait DriveChannel {
    /// Set the PWM period.
    fn set_period_us(&mut self, period_us: u32) -> Result<(), EqptError>;

    /// Set the duty cycle as a fraction of the period. Must be between 0.0 and 1.0.
    fn set_duty(&mut self, duty: f64) -> Result<(), EqptError>;

    /// The currently applied duty cycle.
    fn duty(&self) -> f64;
}
