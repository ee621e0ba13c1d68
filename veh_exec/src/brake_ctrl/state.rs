//! Brake controller state and seek loop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Instant;

use embedded_hal::digital::v2::OutputPin;
use eqpt_if::brake::{DriveChannel, PositionSensor};
use log::{debug, error, info, warn};
use serde::Serialize;
use util::{maths::clamp, time::seconds_to_std};

use super::{BrakeError, BrakeState, Motion, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Brake actuator position controller.
///
/// `X` drives the actuator towards full extension and `R` towards full retraction. The two
/// channels are never driven at the same time.
pub struct BrakeCtrl<X, R, En, S>
where
    X: DriveChannel,
    R: DriveChannel,
    En: OutputPin,
    S: PositionSensor,
{
    params: Params,

    extend: X,
    retract: R,
    enable: En,
    sensor: S,

    state: BrakeState,

    /// True while the enable line is asserted
    armed: bool,

    /// Set by [`BrakeCtrl::stop`], never cleared
    disabled: bool,
}

/// Outcome of a successful seek.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeekReport {
    /// The target after clamping to the position limits.
    pub target: f64,

    pub start_position: f64,

    pub final_position: f64,

    pub motion: Motion,

    /// Units: seconds
    pub elapsed_s: f64,

    /// Number of position reads made after the actuator started moving.
    pub polls: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<X, R, En, S> BrakeCtrl<X, R, En, S>
where
    X: DriveChannel,
    R: DriveChannel,
    En: OutputPin,
    S: PositionSensor,
{
    /// Create a new brake controller.
    ///
    /// Both channels are configured with the parameterised period and zero duty, then the
    /// enable line is asserted, arming the actuator.
    pub fn new(
        params: Params,
        mut extend: X,
        mut retract: R,
        mut enable: En,
        sensor: S
    ) -> Result<Self, BrakeError> {
        params.are_valid()?;

        extend.set_period_us(params.pwm_period_us).map_err(BrakeError::Drive)?;
        retract.set_period_us(params.pwm_period_us).map_err(BrakeError::Drive)?;
        extend.set_duty(0.0).map_err(BrakeError::Drive)?;
        retract.set_duty(0.0).map_err(BrakeError::Drive)?;

        enable.set_high().map_err(|_| BrakeError::EnableLine)?;

        info!("Brake armed, travel limited to [{}, {}]", params.min_position, params.max_position);

        Ok(Self {
            params,
            extend,
            retract,
            enable,
            sensor,
            state: BrakeState::Idle,
            armed: true,
            disabled: false,
        })
    }

    /// Drive the actuator to the given position.
    ///
    /// The target is clamped to the position limits. If the current position is outside the
    /// hysteresis band around the target the actuator is driven towards it until the position
    /// reaches the target. The call blocks for the duration of the seek.
    ///
    /// A seek which takes longer than the timeout, makes too little progress within a stall
    /// window, or loses the position sensor faults the brake.
    pub fn set_position(&mut self, target: f64) -> Result<SeekReport, BrakeError> {
        if self.disabled {
            return Err(BrakeError::Disabled);
        }
        if self.state == BrakeState::Faulted {
            return Err(BrakeError::Faulted);
        }
        if target.is_nan() {
            return Err(BrakeError::InvalidTarget(target));
        }

        let clamped = clamp(target, self.params.min_position, self.params.max_position);
        if clamped != target {
            debug!("Brake target {:.3} clamped to {:.3}", target, clamped);
        }

        let start_position = self.sensor.read().map_err(BrakeError::SensorUnavailable)?;

        let motion = if start_position < clamped - self.params.hysteresis {
            Motion::Extend
        }
        else if start_position > clamped + self.params.hysteresis {
            Motion::Retract
        }
        else {
            Motion::None
        };

        if motion == Motion::None {
            debug!("Brake at {:.3}, within band of {:.3}", start_position, clamped);
            return Ok(SeekReport {
                target: clamped,
                start_position,
                final_position: start_position,
                motion,
                elapsed_s: 0.0,
                polls: 0,
            });
        }

        match self.seek(clamped, start_position, motion) {
            Ok(report) => {
                debug!(
                    "Brake reached {:.3} (target {:.3}) in {:.3} s, {} polls",
                    report.final_position,
                    report.target,
                    report.elapsed_s,
                    report.polls
                );
                Ok(report)
            },
            Err(e) => {
                error!("Brake seek failed: {}", e);
                self.fault();
                Err(e)
            }
        }
    }

    /// Read the current actuator position.
    pub fn get_position(&mut self) -> Result<f64, BrakeError> {
        self.sensor.read().map_err(BrakeError::SensorUnavailable)
    }

    /// De-energise the actuator and de-assert the enable line.
    ///
    /// After this the brake cannot be commanded again. Calling it more than once is harmless.
    pub fn stop(&mut self) -> Result<(), BrakeError> {
        let extend = self.extend.set_duty(0.0).map_err(BrakeError::Drive);
        let retract = self.retract.set_duty(0.0).map_err(BrakeError::Drive);
        let enable = self.enable.set_low().map_err(|_| BrakeError::EnableLine);

        if !self.disabled {
            info!("Brake stopped");
        }

        self.armed = false;
        self.disabled = true;
        if self.state != BrakeState::Faulted {
            self.state = BrakeState::Idle;
        }

        extend.and(retract).and(enable)
    }

    /// Clear a fault, re-arming the actuator.
    ///
    /// Does nothing if the brake isn't faulted. A stopped brake cannot be reset.
    pub fn reset_fault(&mut self) -> Result<(), BrakeError> {
        if self.disabled {
            return Err(BrakeError::Disabled);
        }
        if self.state != BrakeState::Faulted {
            return Ok(());
        }

        self.extend.set_duty(0.0).map_err(BrakeError::Drive)?;
        self.retract.set_duty(0.0).map_err(BrakeError::Drive)?;
        self.enable.set_high().map_err(|_| BrakeError::EnableLine)?;

        self.armed = true;
        self.state = BrakeState::Idle;

        warn!("Brake fault reset");

        Ok(())
    }

    pub fn state(&self) -> BrakeState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Drive towards the target until it's reached, leaving both channels at zero duty.
    fn seek(
        &mut self,
        target: f64,
        start_position: f64,
        motion: Motion
    ) -> Result<SeekReport, BrakeError> {
        let start_time = Instant::now();
        let poll_period = seconds_to_std(self.params.poll_period_s);
        let duty = self.params.drive_duty;

        // Zero the opposing channel first
        match motion {
            Motion::Extend => {
                self.retract.set_duty(0.0).map_err(BrakeError::Drive)?;
                self.extend.set_duty(duty).map_err(BrakeError::Drive)?;
                self.state = BrakeState::Extending;
            },
            Motion::Retract => {
                self.extend.set_duty(0.0).map_err(BrakeError::Drive)?;
                self.retract.set_duty(duty).map_err(BrakeError::Drive)?;
                self.state = BrakeState::Retracting;
            },
            Motion::None => return Err(BrakeError::InvalidTarget(target))
        }

        let mut position = start_position;
        let mut polls = 0;
        let mut window_start = start_time;
        let mut window_position = start_position;

        loop {
            let reached = match motion {
                Motion::Extend => position >= target,
                _ => position <= target,
            };
            if reached {
                break;
            }

            let now = Instant::now();
            let elapsed_s = now.duration_since(start_time).as_secs_f64();

            if elapsed_s > self.params.seek_timeout_s {
                return Err(BrakeError::ActuatorStall { target, position, elapsed_s });
            }

            if now.duration_since(window_start).as_secs_f64() >= self.params.stall_window_s {
                let progress = match motion {
                    Motion::Extend => position - window_position,
                    _ => window_position - position,
                };

                if progress < self.params.stall_min_progress {
                    return Err(BrakeError::ActuatorStall { target, position, elapsed_s });
                }

                window_start = now;
                window_position = position;
            }

            if self.params.poll_period_s > 0.0 {
                std::thread::sleep(poll_period);
            }

            position = self.sensor.read().map_err(BrakeError::SensorUnavailable)?;
            polls += 1;
        }

        let zeroed = match motion {
            Motion::Extend => self.extend.set_duty(0.0),
            _ => self.retract.set_duty(0.0),
        };
        zeroed.map_err(BrakeError::Drive)?;

        self.state = BrakeState::Idle;

        Ok(SeekReport {
            target,
            start_position,
            final_position: position,
            motion,
            elapsed_s: start_time.elapsed().as_secs_f64(),
            polls,
        })
    }

    /// De-energise everything and latch the fault state.
    fn fault(&mut self) {
        if let Err(e) = self.extend.set_duty(0.0) {
            error!("Could not zero the extend channel: {}", e);
        }
        if let Err(e) = self.retract.set_duty(0.0) {
            error!("Could not zero the retract channel: {}", e);
        }
        if self.enable.set_low().is_err() {
            error!("Could not de-assert the brake enable line");
        }

        self.armed = false;
        self.state = BrakeState::Faulted;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{BrakeChannel, SimBrake, SimBrakeParams};
    use eqpt_if::EqptError;

    type SimCtrl = BrakeCtrl<
        crate::sim::SimDriveChannel,
        crate::sim::SimDriveChannel,
        crate::sim::SimEnablePin,
        crate::sim::SimPositionSensor,
    >;

    fn brake(initial_position: f64, params: Params) -> (SimBrake, SimCtrl) {
        let sim = SimBrake::new(&SimBrakeParams { initial_position, travel_per_read: 0.001 });
        let ctrl = BrakeCtrl::new(
            params,
            sim.drive_channel(BrakeChannel::Extend),
            sim.drive_channel(BrakeChannel::Retract),
            sim.enable_pin(),
            sim.sensor()
        ).unwrap();

        (sim, ctrl)
    }

    fn fast_stall() -> Params {
        let mut p = Params::default();
        p.stall_window_s = 0.02;
        p.seek_timeout_s = 1.0;
        p
    }

    #[test]
    fn test_new_arms() {
        let (sim, ctrl) = brake(0.2, Params::default());
        assert!(ctrl.is_armed());
        assert!(sim.is_enabled());
        assert_eq!(sim.period_us(BrakeChannel::Extend), 50);
        assert_eq!(sim.period_us(BrakeChannel::Retract), 50);
        assert_eq!(sim.duties(), (0.0, 0.0));
        assert_eq!(ctrl.state(), BrakeState::Idle);
    }

    #[test]
    fn test_extend() {
        let (sim, mut ctrl) = brake(0.2, Params::default());
        let report = ctrl.set_position(0.5).unwrap();

        assert_eq!(report.motion, Motion::Extend);
        assert_eq!(report.target, 0.5);
        assert!(report.final_position >= 0.5 && report.final_position < 0.5 + 0.0011);
        assert_eq!(report.final_position, sim.position());
        assert_eq!(sim.duties(), (0.0, 0.0));
        assert_eq!(ctrl.state(), BrakeState::Idle);
        assert!(!sim.overlap_seen());
    }

    #[test]
    fn test_retract() {
        let (sim, mut ctrl) = brake(0.6, Params::default());
        let report = ctrl.set_position(0.3).unwrap();

        assert_eq!(report.motion, Motion::Retract);
        assert!(report.final_position <= 0.3 && report.final_position > 0.3 - 0.0011);
        assert_eq!(sim.duties(), (0.0, 0.0));
        assert!(!sim.overlap_seen());
    }

    #[test]
    fn test_target_clamped() {
        // Below the lower limit
        let (sim, mut ctrl) = brake(0.2, Params::default());
        let report = ctrl.set_position(0.02).unwrap();
        assert_eq!(report.target, 0.03);
        assert_eq!(report.motion, Motion::Retract);
        assert!(report.final_position <= 0.03 && report.final_position > 0.028);
        assert!(sim.position() > 0.02);

        // Above the upper limit behaves the same as the limit itself
        let (_, mut ctrl_a) = brake(0.2, Params::default());
        let (_, mut ctrl_b) = brake(0.2, Params::default());
        let a = ctrl_a.set_position(0.9).unwrap();
        let b = ctrl_b.set_position(0.75).unwrap();
        assert_eq!(a.target, 0.75);
        assert_eq!(a.polls, b.polls);
        assert!((a.final_position - b.final_position).abs() < 1e-12);
    }

    #[test]
    fn test_within_band() {
        let (sim, mut ctrl) = brake(0.405, Params::default());

        for target in [0.4, 0.41, 0.396, 0.414].iter() {
            let report = ctrl.set_position(*target).unwrap();
            assert_eq!(report.motion, Motion::None);
            assert_eq!(report.polls, 0);
        }

        assert_eq!(sim.duties(), (0.0, 0.0));
        assert_eq!(sim.position(), 0.405);
    }

    #[test]
    fn test_nan_target() {
        let (_, mut ctrl) = brake(0.2, Params::default());
        match ctrl.set_position(std::f64::NAN) {
            Err(BrakeError::InvalidTarget(_)) => (),
            r => panic!("Expected invalid target, got {:?}", r)
        }
        assert_eq!(ctrl.state(), BrakeState::Idle);
    }

    #[test]
    fn test_stall_faults() {
        let (sim, mut ctrl) = brake(0.2, fast_stall());
        sim.set_jammed(true);

        match ctrl.set_position(0.5) {
            Err(BrakeError::ActuatorStall { target, position, .. }) => {
                assert_eq!(target, 0.5);
                assert_eq!(position, 0.2);
            },
            r => panic!("Expected stall, got {:?}", r)
        }

        assert_eq!(ctrl.state(), BrakeState::Faulted);
        assert!(!ctrl.is_armed());
        assert!(!sim.is_enabled());
        assert_eq!(sim.duties(), (0.0, 0.0));

        // Faulted brakes refuse commands until reset
        match ctrl.set_position(0.5) {
            Err(BrakeError::Faulted) => (),
            r => panic!("Expected faulted, got {:?}", r)
        }

        sim.set_jammed(false);
        ctrl.reset_fault().unwrap();
        assert_eq!(ctrl.state(), BrakeState::Idle);
        assert!(ctrl.is_armed());
        assert!(sim.is_enabled());

        let report = ctrl.set_position(0.5).unwrap();
        assert!(report.final_position >= 0.5);
    }

    #[test]
    fn test_seek_timeout() {
        // Slow enough to pass the stall check but not the timeout
        let mut params = Params::default();
        params.seek_timeout_s = 0.05;
        params.stall_window_s = 10.0;
        params.poll_period_s = 0.002;

        let (_, mut ctrl) = brake(0.03, params);
        match ctrl.set_position(0.75) {
            Err(BrakeError::ActuatorStall { elapsed_s, .. }) => assert!(elapsed_s > 0.05),
            r => panic!("Expected stall, got {:?}", r)
        }
        assert_eq!(ctrl.state(), BrakeState::Faulted);
    }

    #[test]
    fn test_sensor_failure_mid_seek() {
        let (sim, mut ctrl) = brake(0.2, Params::default());
        sim.fail_at_read(Some(20));

        match ctrl.set_position(0.5) {
            Err(BrakeError::SensorUnavailable(EqptError::NoResponse)) => (),
            r => panic!("Expected sensor unavailable, got {:?}", r)
        }
        assert_eq!(ctrl.state(), BrakeState::Faulted);
        assert_eq!(sim.duties(), (0.0, 0.0));
        assert!(!sim.is_enabled());
    }

    #[test]
    fn test_sensor_failure_before_seek() {
        let (sim, mut ctrl) = brake(0.2, Params::default());
        sim.fail_at_read(Some(0));

        match ctrl.set_position(0.5) {
            Err(BrakeError::SensorUnavailable(_)) => (),
            r => panic!("Expected sensor unavailable, got {:?}", r)
        }

        // Nothing moved so there's nothing to fault
        assert_eq!(ctrl.state(), BrakeState::Idle);
        assert!(ctrl.is_armed());
        assert!(ctrl.get_position().is_err());
    }

    #[test]
    fn test_stop() {
        let (sim, mut ctrl) = brake(0.2, Params::default());
        ctrl.set_position(0.4).unwrap();

        ctrl.stop().unwrap();
        assert!(ctrl.is_disabled());
        assert!(!ctrl.is_armed());
        assert!(!sim.is_enabled());
        assert_eq!(sim.duties(), (0.0, 0.0));

        ctrl.stop().unwrap();
        assert!(ctrl.is_disabled());

        match ctrl.set_position(0.6) {
            Err(BrakeError::Disabled) => (),
            r => panic!("Expected disabled, got {:?}", r)
        }
        match ctrl.reset_fault() {
            Err(BrakeError::Disabled) => (),
            r => panic!("Expected disabled, got {:?}", r)
        }

        // Position can still be read
        assert!((ctrl.get_position().unwrap() - sim.position()).abs() < 0.01);
    }

    #[test]
    fn test_reset_when_idle() {
        let (_, mut ctrl) = brake(0.2, Params::default());
        ctrl.reset_fault().unwrap();
        assert_eq!(ctrl.state(), BrakeState::Idle);
    }

    #[test]
    fn test_invalid_params() {
        let sim = SimBrake::new(&SimBrakeParams::default());
        let mut params = Params::default();
        params.drive_duty = 1.5;

        let r = BrakeCtrl::new(
            params,
            sim.drive_channel(BrakeChannel::Extend),
            sim.drive_channel(BrakeChannel::Retract),
            sim.enable_pin(),
            sim.sensor()
        );
        assert!(matches!(r, Err(BrakeError::InvalidParams(_))));
        assert!(!sim.is_enabled());
    }
}
