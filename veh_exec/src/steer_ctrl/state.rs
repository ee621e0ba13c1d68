//! SteerCtrl per-cycle processing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use eqpt_if::{
    imu::{EulerAngles, LinAccel},
    EqptError,
};
use log::{info, trace};
use serde::Serialize;

// Internal
use super::{
    heading::{map_output, normalise_heading, WheelDems, FULL_TURN_DEG},
    Params, SteerCtrlError,
};
use crate::pid::PidLoop;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steering control module state
pub struct SteerCtrl<P: PidLoop> {
    params: Params,

    /// Heading controller
    pid: P,

    /// Heading to hold, fixed once the mission begins.
    ///
    /// Units: degrees
    setpoint_deg: Option<f64>,

    /// Distance left to travel.
    ///
    /// Units: encoder pulses
    distance_rem: i64,

    /// Number of processed cycles
    cycles: u64,
}

/// Input data to steering control, sampled once per control step.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct InputData {
    pub euler: EulerAngles,

    /// Linear acceleration, only archived. `None` if it couldn't be read this step.
    pub lin_accel: Option<LinAccel>,

    /// Left encoder pulses over the last interval
    pub left_pulses: i32,

    /// Right encoder pulses over the last interval
    pub right_pulses: i32,
}

/// Motor demands from steering control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputData {
    /// Units: percent of full speed
    pub left_speed: i32,

    /// Units: percent of full speed
    pub right_speed: i32,

    /// True once the mission distance has been covered
    pub mission_complete: bool,
}

/// Status report for steering control processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub cycle: u64,

    /// Raw heading.
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// Heading after wraparound reflection.
    ///
    /// Units: degrees
    pub input_deg: f64,

    pub flip: bool,

    pub pid_output: f64,

    /// True if the controller output is sitting on one of its limits
    pub output_saturated: bool,

    pub wheel_dems: WheelDems,

    pub distance_rem: i64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P: PidLoop> SteerCtrl<P> {

    /// Create a new steering controller around the given heading controller.
    pub fn new(params: Params, pid: P) -> Result<Self, SteerCtrlError> {
        params.are_valid()?;

        Ok(Self {
            distance_rem: params.mission_distance_pulses,
            params,
            pid,
            setpoint_deg: None,
            cycles: 0
        })
    }

    /// Begin the mission holding the given heading.
    ///
    /// The setpoint cannot be changed afterwards.
    pub fn begin(&mut self, setpoint_deg: f64) -> Result<(), SteerCtrlError> {
        if let Some(sp) = self.setpoint_deg {
            return Err(SteerCtrlError::AlreadyStarted(sp));
        }

        self.pid.set_setpoint(setpoint_deg);
        self.pid.start();
        self.setpoint_deg = Some(setpoint_deg);

        info!("Steering heading set to {:.3} deg", setpoint_deg);
        info!("Drive distance set to {} pulses", self.distance_rem);

        Ok(())
    }

    /// Process one control step.
    ///
    /// Processing involves:
    ///  1. Reflecting the heading into the controller's range
    ///  1. Exchanging the new input for the controller's output
    ///  1. Mapping the output onto differential wheel speeds
    ///  1. Counting down the mission distance by the mean of the encoder deltas
    pub fn proc(
        &mut self,
        input: &InputData
    ) -> Result<(OutputData, StatusReport), SteerCtrlError> {
        if self.setpoint_deg.is_none() {
            return Err(SteerCtrlError::NotStarted);
        }

        let heading_deg = input.euler.heading_deg;
        if !(heading_deg >= 0.0 && heading_deg <= FULL_TURN_DEG) {
            return Err(SteerCtrlError::SensorUnavailable(EqptError::OutOfRange(heading_deg)));
        }

        let norm = normalise_heading(heading_deg);
        let pid_output = self.pid.exchange(norm.input_deg);
        let wheel_dems = map_output(self.params.base_speed, pid_output, norm.flip);
        let (left_speed, right_speed) = wheel_dems.motor_speeds();

        self.distance_rem -= (input.left_pulses as i64 + input.right_pulses as i64) / 2;
        self.cycles += 1;

        let report = StatusReport {
            cycle: self.cycles,
            heading_deg,
            input_deg: norm.input_deg,
            flip: norm.flip,
            pid_output,
            output_saturated: pid_output <= self.params.out_min
                || pid_output >= self.params.out_max,
            wheel_dems,
            distance_rem: self.distance_rem,
        };

        trace!("SteerCtrl input: {:?}", input);
        trace!("SteerCtrl report: {:?}", report);

        Ok((
            OutputData {
                left_speed,
                right_speed,
                mission_complete: self.is_complete()
            },
            report
        ))
    }

    /// Stop the heading controller at the end of the mission.
    pub fn finish(&mut self) {
        self.pid.stop();
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn pid(&self) -> &P {
        &self.pid
    }

    pub fn setpoint_deg(&self) -> Option<f64> {
        self.setpoint_deg
    }

    pub fn distance_rem(&self) -> i64 {
        self.distance_rem
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_started(&self) -> bool {
        self.setpoint_deg.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.distance_rem <= 0
    }
}

impl SteerCtrl<Box<dyn PidLoop + Send>> {

    /// Create a steering controller with the heading controller the parameters describe.
    pub fn from_params(params: Params) -> Result<Self, SteerCtrlError> {
        params.are_valid()?;

        let pid = params
            .pid_mode
            .build(params.heading_controller())
            .map_err(SteerCtrlError::PidError)?;

        Self::new(params, pid)
    }
}
