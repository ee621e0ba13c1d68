//! Steering supervisor - runs steering control against the vehicle equipment

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use eqpt_if::{
    imu::Imu,
    motor::{Motor, MotorSide},
    odom::WheelEncoder,
    timer::IntervalTimer,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use util::time::seconds_to_std;

// Internal
use super::{heading::mean_heading, InputData, OutputData, SteerCtrl, SteerCtrlError};
use crate::pid::PidLoop;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The equipment the steering supervisor senses and actuates.
pub struct Equipment<I, E, M, T> {
    pub imu: I,
    pub left_encoder: E,
    pub right_encoder: E,
    pub left_motor: M,
    pub right_motor: M,
    pub timer: T,
}

/// Runs [`SteerCtrl`] on a fixed control interval until the mission distance is covered.
pub struct SteerSupervisor<I, E, M, T, P>
where
    I: Imu,
    E: WheelEncoder,
    M: Motor,
    T: IntervalTimer,
    P: PidLoop,
{
    eqpt: Equipment<I, E, M, T>,
    ctrl: SteerCtrl<P>,
}

/// Summary of a completed mission.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MissionReport {
    /// Units: degrees
    pub setpoint_deg: f64,

    pub cycles: u64,

    /// Zero or negative, the overshoot past the mission distance.
    ///
    /// Units: encoder pulses
    pub distance_rem: i64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<I, E, M, T, P> SteerSupervisor<I, E, M, T, P>
where
    I: Imu,
    E: WheelEncoder,
    M: Motor,
    T: IntervalTimer,
    P: PidLoop,
{
    pub fn new(eqpt: Equipment<I, E, M, T>, ctrl: SteerCtrl<P>) -> Self {
        Self { eqpt, ctrl }
    }

    /// Prepare for the mission.
    ///
    /// Starts both motors at zero speed, averages a number of heading samples into the setpoint
    /// and starts the heading controller. Returns the setpoint.
    pub fn init(&mut self) -> Result<f64, SteerCtrlError> {
        self.eqpt.left_motor.start(0).map_err(SteerCtrlError::MotorFault)?;
        self.eqpt.right_motor.start(0).map_err(SteerCtrlError::MotorFault)?;
        info!("Motors initialised");

        let num_samples = self.ctrl.params().setpoint_num_samples;
        let delay = seconds_to_std(self.ctrl.params().setpoint_sample_delay_s);

        let mut samples = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            let euler = self.eqpt.imu.euler().map_err(SteerCtrlError::SensorUnavailable)?;
            samples.push(euler.heading_deg);
            std::thread::sleep(delay);
        }

        debug!("Setpoint heading samples: {:?}", samples);

        let setpoint = mean_heading(&samples).ok_or(SteerCtrlError::NotStarted)?;
        self.ctrl.begin(setpoint)?;

        Ok(setpoint)
    }

    /// Execute a single control step: sample, process, actuate.
    pub fn step(&mut self) -> Result<OutputData, SteerCtrlError> {
        let euler = self.eqpt.imu.euler().map_err(SteerCtrlError::SensorUnavailable)?;

        // Acceleration isn't used for control so losing it only costs telemetry
        let lin_accel = match self.eqpt.imu.lin_accel() {
            Ok(a) => Some(a),
            Err(e) => {
                warn!("Could not read linear acceleration: {}", e);
                None
            }
        };

        let input = InputData {
            euler,
            lin_accel,
            left_pulses: self.eqpt.left_encoder.take_pulses(),
            right_pulses: self.eqpt.right_encoder.take_pulses(),
        };

        let (output, report) = self.ctrl.proc(&input)?;

        self.eqpt.left_motor
            .set_output(output.left_speed)
            .map_err(SteerCtrlError::MotorFault)?;
        self.eqpt.right_motor
            .set_output(output.right_speed)
            .map_err(SteerCtrlError::MotorFault)?;

        debug!(
            "Step {}: heading {:.2} (in {:.2}, flip {}) out {:.2} -> L {} R {}, {} pulses left",
            report.cycle,
            report.heading_deg,
            report.input_deg,
            report.flip,
            report.pid_output,
            output.left_speed,
            output.right_speed,
            report.distance_rem
        );

        Ok(output)
    }

    /// Run the mission to completion.
    ///
    /// Initialises first if [`SteerSupervisor::init`] hasn't been called. Steps are gated by the
    /// interval timer: a step runs once more than one control interval has elapsed since the
    /// last, and if more than `max_interval_overrun` intervals have elapsed the mission is
    /// aborted with a timing violation.
    ///
    /// The motors, timer and heading controller are always stopped before returning, whether
    /// the mission completed or failed.
    pub fn run(&mut self) -> Result<MissionReport, SteerCtrlError> {
        let result = if self.ctrl.is_started() {
            self.run_loop()
        }
        else {
            self.init().and_then(|_| self.run_loop())
        };

        match result {
            Ok(()) => {
                self.shutdown()?;

                let report = MissionReport {
                    setpoint_deg: self.ctrl.setpoint_deg().unwrap_or(std::f64::NAN),
                    cycles: self.ctrl.cycles(),
                    distance_rem: self.ctrl.distance_rem(),
                };
                info!("Mission complete: {:?}", report);

                Ok(report)
            },
            Err(e) => {
                error!("Mission aborted: {}", e);
                if let Err(se) = self.shutdown() {
                    error!("Could not shut down cleanly: {}", se);
                }
                Err(e)
            }
        }
    }

    /// Stop the motors immediately, then the interval timer and heading controller.
    ///
    /// Both motors are always commanded to stop, if either fails the first error is returned.
    pub fn shutdown(&mut self) -> Result<(), SteerCtrlError> {
        let left = self.eqpt.left_motor.stop();
        let right = self.eqpt.right_motor.stop();

        for (side, r) in [(MotorSide::Left, &left), (MotorSide::Right, &right)].iter() {
            if let Err(e) = r {
                error!("Failed to stop {:?} motor: {}", side, e);
            }
        }

        self.eqpt.timer.stop();
        self.ctrl.finish();

        info!("Motors stopped");

        left.and(right).map_err(SteerCtrlError::MotorFault)
    }

    pub fn ctrl(&self) -> &SteerCtrl<P> {
        &self.ctrl
    }

    pub fn equipment(&self) -> &Equipment<I, E, M, T> {
        &self.eqpt
    }

    pub fn into_parts(self) -> (Equipment<I, E, M, T>, SteerCtrl<P>) {
        (self.eqpt, self.ctrl)
    }

    fn run_loop(&mut self) -> Result<(), SteerCtrlError> {
        let interval_s = self.ctrl.params().control_interval_s;
        let overrun_limit_s = interval_s * self.ctrl.params().max_interval_overrun;

        self.eqpt.timer.reset();
        self.eqpt.timer.start();

        while !self.ctrl.is_complete() {
            let elapsed_s = self.eqpt.timer.read();

            if elapsed_s <= interval_s {
                self.eqpt.timer.idle(interval_s - elapsed_s);
                continue;
            }

            self.eqpt.timer.reset();

            if elapsed_s > overrun_limit_s {
                return Err(SteerCtrlError::TimingViolation { elapsed_s, interval_s });
            }

            self.step()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::steer_ctrl::{
        fakes::*,
        Params,
    };
    use eqpt_if::EqptError;

    type Sup = SteerSupervisor<FakeImu, FakeEncoder, FakeMotor, FakeTimer, FixedPid>;

    fn supervisor(
        headings: &[f64],
        timer_reads: &[f64],
        distance: i64,
        pid_output: f64
    ) -> Sup {
        let mut params = Params::default();
        params.mission_distance_pulses = distance;
        params.setpoint_sample_delay_s = 0.0;

        SteerSupervisor::new(
            Equipment {
                imu: FakeImu::new(headings),
                left_encoder: FakeEncoder { delta: 50, resets: 0 },
                right_encoder: FakeEncoder { delta: 54, resets: 0 },
                left_motor: FakeMotor::default(),
                right_motor: FakeMotor::default(),
                timer: FakeTimer::new(timer_reads),
            },
            SteerCtrl::new(params, fixed(pid_output)).unwrap()
        )
    }

    #[test]
    fn test_setpoint_is_mean_of_samples() {
        let mut sup = supervisor(&[8.0, 9.0, 10.0, 11.0, 12.0, 40.0], &[0.03], 200, 0.0);
        assert_eq!(sup.init().unwrap(), 10.0);
        assert_eq!(sup.equipment().imu.reads, 5);
        assert_eq!(sup.ctrl().pid().io().setpoint, 10.0);
        assert!(sup.ctrl().pid().is_running());
        assert_eq!(sup.equipment().left_motor.calls, vec![MotorCall::Start(0)]);
        assert_eq!(sup.equipment().right_motor.calls, vec![MotorCall::Start(0)]);
    }

    #[test]
    fn test_mission_distance() {
        let mut sup = supervisor(&[10.0], &[0.03], 200, 0.0);
        sup.init().unwrap();

        sup.step().unwrap();
        sup.step().unwrap();
        assert_eq!(sup.ctrl().distance_rem(), 96);
        assert!(!sup.ctrl().is_complete());
        assert_eq!(sup.equipment().left_encoder.resets, 2);
        assert_eq!(sup.equipment().right_encoder.resets, 2);

        let report = sup.run().unwrap();
        assert_eq!(report.cycles, 4);
        assert_eq!(report.distance_rem, -8);

        let (eqpt, ctrl) = sup.into_parts();
        assert_eq!(eqpt.left_motor.calls.last(), Some(&MotorCall::Stop));
        assert_eq!(eqpt.right_motor.calls.last(), Some(&MotorCall::Stop));
        assert_eq!(eqpt.left_motor.calls.len(), 1 + 4 + 1);
        assert!(!eqpt.timer.running);
        assert!(!ctrl.pid().is_running());
    }

    #[test]
    fn test_wrapped_heading_commands() {
        let mut sup = supervisor(&[10.0, 10.0, 10.0, 10.0, 10.0, 350.0], &[0.03], 200, 5.0);
        sup.init().unwrap();

        let out = sup.step().unwrap();
        assert_eq!((out.left_speed, out.right_speed), (25, 35));
        assert_eq!(sup.ctrl().pid().inputs, vec![10.0]);
        assert_eq!(sup.equipment().left_motor.calls.last(), Some(&MotorCall::Set(25)));
        assert_eq!(sup.equipment().right_motor.calls.last(), Some(&MotorCall::Set(35)));
    }

    #[test]
    fn test_gate_waits_for_interval() {
        // Every other read is still inside the interval
        let mut sup = supervisor(&[0.0], &[0.01, 0.029], 200, 0.0);
        let report = sup.run().unwrap();
        assert_eq!(report.cycles, 4);

        let (eqpt, _) = sup.into_parts();
        assert_eq!(eqpt.timer.idles.len(), 4);
        for i in eqpt.timer.idles.iter() {
            assert!((i - 0.018).abs() < 1e-9);
        }
        // One reset to start the loop and one per step
        assert_eq!(eqpt.timer.resets, 1 + 4);
    }

    #[test]
    fn test_timing_violation() {
        let mut sup = supervisor(&[0.0], &[1.0], 200, 0.0);

        match sup.run() {
            Err(SteerCtrlError::TimingViolation { elapsed_s, interval_s }) => {
                assert_eq!(elapsed_s, 1.0);
                assert_eq!(interval_s, 0.028);
            },
            r => panic!("Expected timing violation, got {:?}", r)
        }

        // No steps ran and everything was stopped
        let (eqpt, ctrl) = sup.into_parts();
        assert_eq!(ctrl.cycles(), 0);
        assert_eq!(eqpt.left_motor.calls, vec![MotorCall::Start(0), MotorCall::Stop]);
        assert_eq!(eqpt.right_motor.calls, vec![MotorCall::Start(0), MotorCall::Stop]);
        assert!(!ctrl.pid().is_running());
    }

    #[test]
    fn test_sensor_dropout_stops_motors() {
        let mut sup = supervisor(&[0.0], &[0.03], 200, 0.0);
        sup.init().unwrap();
        sup.step().unwrap();

        // 5 setpoint samples and 1 step so far
        sup.eqpt.imu.fail_after = Some(6);

        match sup.run() {
            Err(SteerCtrlError::SensorUnavailable(EqptError::NoResponse)) => (),
            r => panic!("Expected sensor unavailable, got {:?}", r)
        }

        assert_eq!(sup.ctrl().cycles(), 1);
        assert_eq!(sup.equipment().left_motor.calls.last(), Some(&MotorCall::Stop));
        assert_eq!(sup.equipment().right_motor.calls.last(), Some(&MotorCall::Stop));
    }

    #[test]
    fn test_setpoint_sampling_failure() {
        let mut sup = supervisor(&[0.0], &[0.03], 200, 0.0);
        sup.eqpt.imu.fail_after = Some(2);

        match sup.run() {
            Err(SteerCtrlError::SensorUnavailable(_)) => (),
            r => panic!("Expected sensor unavailable, got {:?}", r)
        }
        assert!(!sup.ctrl().is_started());
        assert_eq!(sup.equipment().left_motor.calls.last(), Some(&MotorCall::Stop));
    }

    #[test]
    fn test_motor_fault() {
        let mut sup = supervisor(&[0.0], &[0.03], 200, 0.0);
        sup.eqpt.right_motor.fail_set = true;

        match sup.run() {
            Err(SteerCtrlError::MotorFault(EqptError::Bus(_))) => (),
            r => panic!("Expected motor fault, got {:?}", r)
        }
        assert_eq!(sup.equipment().left_motor.calls.last(), Some(&MotorCall::Stop));
        assert_eq!(sup.equipment().right_motor.calls.last(), Some(&MotorCall::Stop));
    }
}
