//! Parameters structure for SteerCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use crate::pid::{PidController, PidGains, PidMode};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest speed magnitude a drive motor accepts.
///
/// Units: percent of full speed
pub const MAX_MOTOR_SPEED: f64 = 100.0;

/// Longest allowed delay after each setpoint sample.
///
/// Units: seconds
pub const MAX_SAMPLE_DELAY_S: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for steering control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- CONTROLLER ----

    /// Heading controller gains.
    ///
    /// Units: output per degree of heading error
    pub gains: PidGains,

    /// How the heading controller is run.
    pub pid_mode: PidMode,

    /// Lower limit on the heading controller output.
    ///
    /// Units: percent of full speed
    pub out_min: f64,

    /// Upper limit on the heading controller output.
    ///
    /// Units: percent of full speed
    pub out_max: f64,

    /// Speed both wheels are driven at with no steering correction.
    ///
    /// Units: percent of full speed
    pub base_speed: f64,

    // ---- TIMING ----

    /// Period between control steps. Also the heading controller interval.
    ///
    /// Units: seconds
    pub control_interval_s: f64,

    /// A step starting more than this many control intervals after the previous one is a
    /// timing violation.
    pub max_interval_overrun: f64,

    // ---- MISSION ----

    /// Distance to travel before stopping.
    ///
    /// Units: encoder pulses (mean of left and right)
    pub mission_distance_pulses: i64,

    /// Number of heading samples averaged into the setpoint.
    pub setpoint_num_samples: usize,

    /// Delay after each setpoint sample.
    ///
    /// Units: seconds
    pub setpoint_sample_delay_s: f64,
}

/// Reasons the parameters can be invalid.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Control interval must be positive, found {0}")]
    NonPositiveInterval(f64),

    #[error("Output limits are inverted ({0} > {1})")]
    InvertedOutputLimits(f64, f64),

    #[error("Base speed {0} plus the largest correction {1} exceeds the motor range")]
    SpeedOutOfRange(f64, f64),

    #[error("At least one setpoint sample is required")]
    NoSetpointSamples,

    #[error("Interval overrun limit must be at least 1 interval, found {0}")]
    OverrunTooSmall(f64),

    #[error("Setpoint sample delay must not be negative, found {0}")]
    NegativeSampleDelay(f64),

    #[error("Setpoint sample delay must be at most {} s, found {0}", MAX_SAMPLE_DELAY_S)]
    SampleDelayTooLong(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            gains: PidGains { k_p: 3.0, k_i: 0.0, k_d: 0.0 },
            pid_mode: PidMode::Stepped,
            out_min: -50.0,
            out_max: 50.0,
            base_speed: 30.0,
            control_interval_s: 0.028,
            max_interval_overrun: 10.0,
            mission_distance_pulses: 10000,
            setpoint_num_samples: 5,
            setpoint_sample_delay_s: 0.01,
        }
    }
}

impl Params {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.control_interval_s > 0.0) {
            return Err(ParamsError::NonPositiveInterval(self.control_interval_s));
        }

        if self.out_min > self.out_max {
            return Err(ParamsError::InvertedOutputLimits(self.out_min, self.out_max));
        }

        let max_correction = self.out_min.abs().max(self.out_max.abs());
        if self.base_speed.abs() + max_correction > MAX_MOTOR_SPEED {
            return Err(ParamsError::SpeedOutOfRange(self.base_speed, max_correction));
        }

        if self.setpoint_num_samples == 0 {
            return Err(ParamsError::NoSetpointSamples);
        }

        if !(self.max_interval_overrun >= 1.0) {
            return Err(ParamsError::OverrunTooSmall(self.max_interval_overrun));
        }

        if self.setpoint_sample_delay_s < 0.0 {
            return Err(ParamsError::NegativeSampleDelay(self.setpoint_sample_delay_s));
        }

        if !(self.setpoint_sample_delay_s <= MAX_SAMPLE_DELAY_S) {
            return Err(ParamsError::SampleDelayTooLong(self.setpoint_sample_delay_s));
        }

        Ok(())
    }

    /// Build the heading controller described by these parameters.
    pub fn heading_controller(&self) -> PidController {
        PidController::new(self.gains, self.control_interval_s, self.out_min, self.out_max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert_eq!(Params::default().are_valid(), Ok(()));
    }

    #[test]
    fn test_invalid() {
        let mut p = Params::default();
        p.base_speed = 60.0;
        assert_eq!(p.are_valid(), Err(ParamsError::SpeedOutOfRange(60.0, 50.0)));

        let mut p = Params::default();
        p.setpoint_num_samples = 0;
        assert_eq!(p.are_valid(), Err(ParamsError::NoSetpointSamples));

        let mut p = Params::default();
        p.control_interval_s = 0.0;
        assert_eq!(p.are_valid(), Err(ParamsError::NonPositiveInterval(0.0)));

        let mut p = Params::default();
        p.out_min = 10.0;
        p.out_max = -10.0;
        assert_eq!(p.are_valid(), Err(ParamsError::InvertedOutputLimits(10.0, -10.0)));
    }

    #[test]
    fn test_sample_delay_bounded() {
        let mut p = Params::default();
        p.setpoint_sample_delay_s = 1e20;
        assert_eq!(p.are_valid(), Err(ParamsError::SampleDelayTooLong(1e20)));

        p.setpoint_sample_delay_s = std::f64::NAN;
        assert!(p.are_valid().is_err());

        p.setpoint_sample_delay_s = MAX_SAMPLE_DELAY_S;
        assert_eq!(p.are_valid(), Ok(()));
    }

    #[test]
    fn test_parse_toml() {
        let p: Params = util::params::parse(
            r#"
            pid_mode = "threaded"
            out_min = -50.0
            out_max = 50.0
            base_speed = 30.0
            control_interval_s = 0.028
            max_interval_overrun = 10.0
            mission_distance_pulses = 10000
            setpoint_num_samples = 5
            setpoint_sample_delay_s = 0.01

            [gains]
            k_p = 3.0
            k_i = 0.0
            k_d = 0.0
            "#
        ).unwrap();

        assert_eq!(p.pid_mode, PidMode::Threaded);
        assert_eq!(p.gains.k_p, 3.0);
        assert_eq!(p.are_valid(), Ok(()));
    }
}
