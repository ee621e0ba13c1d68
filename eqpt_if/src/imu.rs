//! # IMU Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::EqptError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Orientation of the vehicle as Euler angles.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    /// Heading, clockwise from north.
    ///
    /// Units: degrees, range [0, 360)
    pub heading_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,

    /// Units: degrees
    pub pitch_deg: f64,
}

/// Linear (gravity removed) acceleration of the vehicle body.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct LinAccel {
    /// Units: meters/second^2
    pub x_ms2: f64,

    /// Units: meters/second^2
    pub y_ms2: f64,

    /// Units: meters/second^2
    pub z_ms2: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An orientation sensor providing fused heading and linear acceleration.
pub trait Imu {
    /// Read the current orientation.
    fn euler(&mut self) -> Result<EulerAngles, EqptError>;

    /// Read the current linear acceleration.
    fn lin_accel(&mut self) -> Result<LinAccel, EqptError>;
}
