//! Heading wraparound handling and differential output mapping

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Units: degrees
pub const FULL_TURN_DEG: f64 = 360.0;

/// Units: degrees
pub const HALF_TURN_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A raw heading reflected into [0, 180] for the heading controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NormalisedHeading {
    /// Controller input.
    ///
    /// Units: degrees
    pub input_deg: f64,

    /// True if the raw heading was reflected (`raw > 180`), which inverts the meaning of the
    /// controller output's sign.
    pub flip: bool,
}

/// Speed demands for the left and right drive motors.
///
/// Units: percent of full speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelDems {
    pub left: f64,
    pub right: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Reflect a raw heading in [0, 360) about 180 so the controller never sees the 0/360
/// discontinuity.
pub fn normalise_heading(raw_deg: f64) -> NormalisedHeading {
    if raw_deg > HALF_TURN_DEG {
        NormalisedHeading {
            input_deg: FULL_TURN_DEG - raw_deg,
            flip: true
        }
    }
    else {
        NormalisedHeading {
            input_deg: raw_deg,
            flip: false
        }
    }
}

/// Map a heading controller output onto differential wheel speeds.
///
/// A positive output speeds up the left wheel, unless the heading was reflected in which case
/// the right wheel is sped up instead.
pub fn map_output(base_speed: f64, output: f64, flip: bool) -> WheelDems {
    if flip {
        WheelDems {
            left: base_speed - output,
            right: base_speed + output
        }
    }
    else {
        WheelDems {
            left: base_speed + output,
            right: base_speed - output
        }
    }
}

/// Average a set of heading samples into a setpoint.
///
/// This is a plain arithmetic mean, samples straddling 0/360 are not unwrapped.
pub fn mean_heading(samples_deg: &[f64]) -> Option<f64> {
    util::maths::mean(samples_deg)
}

impl WheelDems {
    /// Integer motor speeds, truncated towards zero.
    pub fn motor_speeds(&self) -> (i32, i32) {
        (self.left as i32, self.right as i32)
    }
}
