//! Parameters structure for BrakeCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for brake control.
///
/// All positions are fractions of the actuator's full travel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- TRAVEL ----

    /// Targets below this are raised to it.
    pub min_position: f64,

    /// Targets above this are lowered to it.
    pub max_position: f64,

    /// Half width of the band around the target inside which no motion is commanded.
    pub hysteresis: f64,

    // ---- DRIVE ----

    /// Period of both drive channels.
    ///
    /// Units: microseconds
    pub pwm_period_us: u32,

    /// Duty applied to the active channel while seeking.
    pub drive_duty: f64,

    // ---- FAULT DETECTION ----

    /// Longest a single seek may take.
    ///
    /// Units: seconds
    pub seek_timeout_s: f64,

    /// Window over which progress towards the target is measured.
    ///
    /// Units: seconds
    pub stall_window_s: f64,

    /// Least travel towards the target within one stall window before the actuator is
    /// considered stalled.
    pub stall_min_progress: f64,

    /// Delay between position polls during a seek. Zero polls as fast as the sensor allows. Must
    /// be shorter than the stall window.
    ///
    /// Units: seconds
    pub poll_period_s: f64,
}

/// Reasons the parameters can be invalid.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Position limits must satisfy 0 <= min < max <= 1, found [{0}, {1}]")]
    InvalidLimits(f64, f64),

    #[error("Hysteresis must be non-negative and narrower than the travel, found {0}")]
    InvalidHysteresis(f64),

    #[error("PWM period must be non-zero")]
    ZeroPeriod,

    #[error("Drive duty must be in (0, 1], found {0}")]
    InvalidDuty(f64),

    #[error("Seek timeout and stall window must be positive, found {0} and {1}")]
    NonPositiveTimeout(f64, f64),

    #[error("Stall progress and poll period must not be negative")]
    NegativeFaultParam,

    #[error("Poll period {0} must be shorter than the stall window {1}")]
    PollTooSlow(f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            min_position: 0.03,
            max_position: 0.75,
            hysteresis: 0.01,
            pwm_period_us: 50,
            drive_duty: 1.0,
            seek_timeout_s: 5.0,
            stall_window_s: 0.5,
            stall_min_progress: 0.005,
            poll_period_s: 0.0,
        }
    }
}

impl Params {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.min_position >= 0.0
            && self.min_position < self.max_position
            && self.max_position <= 1.0)
        {
            return Err(ParamsError::InvalidLimits(self.min_position, self.max_position));
        }

        if !(self.hysteresis >= 0.0)
            || self.hysteresis * 2.0 >= self.max_position - self.min_position
        {
            return Err(ParamsError::InvalidHysteresis(self.hysteresis));
        }

        if self.pwm_period_us == 0 {
            return Err(ParamsError::ZeroPeriod);
        }

        if !(self.drive_duty > 0.0 && self.drive_duty <= 1.0) {
            return Err(ParamsError::InvalidDuty(self.drive_duty));
        }

        if !(self.seek_timeout_s > 0.0 && self.stall_window_s > 0.0) {
            return Err(ParamsError::NonPositiveTimeout(
                self.seek_timeout_s,
                self.stall_window_s
            ));
        }

        if !(self.stall_min_progress >= 0.0 && self.poll_period_s >= 0.0) {
            return Err(ParamsError::NegativeFaultParam);
        }

        if !(self.poll_period_s < self.stall_window_s) {
            return Err(ParamsError::PollTooSlow(self.poll_period_s, self.stall_window_s));
        }

        Ok(())
    }
}
