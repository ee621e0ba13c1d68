//! Discrete fixed interval PID controller

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
}

/// A PID controller which assumes it is evaluated once every `interval_s`.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    gains: PidGains,

    /// Evaluation interval
    ///
    /// Units: seconds
    interval_s: f64,

    /// Lower output limit
    out_min: f64,

    /// Upper output limit
    out_max: f64,

    /// The integral accumulation, already scaled by the integral gain
    integral: f64,

    /// Input on the previous evaluation
    prev_input: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains, interval and output limits.
    pub fn new(gains: PidGains, interval_s: f64, out_min: f64, out_max: f64) -> Self {
        Self {
            gains,
            interval_s,
            out_min,
            out_max,
            integral: 0f64,
            prev_input: None
        }
    }

    pub fn interval_s(&self) -> f64 {
        self.interval_s
    }

    pub fn limits(&self) -> (f64, f64) {
        (self.out_min, self.out_max)
    }

    /// Evaluate the controller for one interval.
    ///
    /// The error is `setpoint - input`. The integral is held within the output limits to prevent
    /// windup and the derivative acts on the input so that setpoint changes don't kick the
    /// output. The returned output is always within the limits.
    pub fn compute(&mut self, setpoint: f64, input: f64) -> f64 {
        let error = setpoint - input;

        self.integral = clamp(
            self.integral + self.gains.k_i * error * self.interval_s,
            self.out_min,
            self.out_max
        );

        // No derivative on the first evaluation, there's nothing to difference against
        let d_input = match self.prev_input {
            Some(p) if self.interval_s > 0.0 => (input - p) / self.interval_s,
            _ => 0f64
        };

        self.prev_input = Some(input);

        clamp(
            self.gains.k_p * error + self.integral - self.gains.k_d * d_input,
            self.out_min,
            self.out_max
        )
    }

    /// Forget the previous input so the first evaluation after a pause has no derivative term.
    pub fn resume(&mut self) {
        self.prev_input = None;
    }

    /// Clear all accumulated state.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_input = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gains(k_p: f64, k_i: f64, k_d: f64) -> PidGains {
        PidGains { k_p, k_i, k_d }
    }

    #[test]
    fn test_proportional() {
        let mut pid = PidController::new(gains(3.0, 0.0, 0.0), 0.028, -50.0, 50.0);
        assert_eq!(pid.compute(10.0, 10.0), 0.0);
        assert_eq!(pid.compute(10.0, 8.0), 6.0);
        assert_eq!(pid.compute(10.0, 12.0), -6.0);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::new(gains(3.0, 0.0, 0.0), 0.028, -50.0, 50.0);
        assert_eq!(pid.compute(170.0, 0.0), 50.0);
        assert_eq!(pid.compute(0.0, 170.0), -50.0);
    }

    #[test]
    fn test_integral_windup_limited() {
        let mut pid = PidController::new(gains(0.0, 1.0, 0.0), 1.0, -50.0, 50.0);
        for _ in 0..100 {
            pid.compute(10.0, 0.0);
        }
        assert_eq!(pid.compute(10.0, 0.0), 50.0);

        // Integral held at 50 rather than 1000, so one opposing interval unwinds it
        assert_eq!(pid.compute(0.0, 10.0), 40.0);

        pid.reset();
        assert_eq!(pid.compute(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_derivative_on_input() {
        let mut pid = PidController::new(gains(0.0, 0.0, 1.0), 0.5, -50.0, 50.0);
        // First sample has no derivative
        assert_eq!(pid.compute(0.0, 1.0), 0.0);
        // Input rose by 1 in 0.5 s
        assert_eq!(pid.compute(0.0, 2.0), -2.0);

        // Changing only the setpoint produces no derivative kick
        assert_eq!(pid.compute(20.0, 2.0), 0.0);

        pid.resume();
        assert_eq!(pid.compute(0.0, 10.0), 0.0);
    }
}
