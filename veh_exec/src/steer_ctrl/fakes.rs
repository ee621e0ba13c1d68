//! Scripted equipment used by the steering tests

use eqpt_if::{
    imu::{EulerAngles, Imu, LinAccel},
    motor::Motor,
    odom::WheelEncoder,
    timer::IntervalTimer,
    EqptError,
};

use crate::pid::{PidIo, PidLoop};

/// Heading controller which always outputs the same value.
pub struct FixedPid {
    pub output: f64,
    pub io: PidIo,
    pub running: bool,
    pub inputs: Vec<f64>,
}

pub fn fixed(output: f64) -> FixedPid {
    FixedPid { output, io: PidIo::default(), running: false, inputs: Vec::new() }
}

impl PidLoop for FixedPid {
    fn start(&mut self) { self.running = true; }
    fn stop(&mut self) { self.running = false; }
    fn is_running(&self) -> bool { self.running }
    fn set_setpoint(&mut self, setpoint: f64) { self.io.setpoint = setpoint; }
    fn exchange(&mut self, input: f64) -> f64 {
        self.inputs.push(input);
        self.io.input = input;
        self.io.output = self.output;
        self.output
    }
    fn io(&self) -> PidIo { self.io }
}

/// Plays back a list of headings, repeating the last one. Fails every read once `fail_after`
/// headings have been read.
pub struct FakeImu {
    pub headings: Vec<f64>,
    pub reads: usize,
    pub fail_after: Option<usize>,
}

impl FakeImu {
    pub fn new(headings: &[f64]) -> Self {
        Self { headings: headings.to_vec(), reads: 0, fail_after: None }
    }
}

impl Imu for FakeImu {
    fn euler(&mut self) -> Result<EulerAngles, EqptError> {
        if let Some(n) = self.fail_after {
            if self.reads >= n {
                return Err(EqptError::NoResponse);
            }
        }

        let idx = self.reads.min(self.headings.len().saturating_sub(1));
        self.reads += 1;

        Ok(EulerAngles {
            heading_deg: self.headings.get(idx).copied().unwrap_or(0.0),
            ..Default::default()
        })
    }

    fn lin_accel(&mut self) -> Result<LinAccel, EqptError> {
        Ok(LinAccel { x_ms2: 0.1, y_ms2: 0.0, z_ms2: 0.0 })
    }
}

/// Encoder which counts the same number of pulses every interval.
pub struct FakeEncoder {
    pub delta: i32,
    pub resets: usize,
}

impl WheelEncoder for FakeEncoder {
    fn pulses(&self) -> i32 {
        self.delta
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCall {
    Start(i32),
    Set(i32),
    Stop,
}

#[derive(Default)]
pub struct FakeMotor {
    pub calls: Vec<MotorCall>,
    pub fail_set: bool,
}

impl Motor for FakeMotor {
    fn start(&mut self, speed: i32) -> Result<(), EqptError> {
        self.calls.push(MotorCall::Start(speed));
        Ok(())
    }

    fn set_output(&mut self, speed: i32) -> Result<(), EqptError> {
        if self.fail_set {
            return Err(EqptError::Bus("motor board not responding".into()));
        }
        self.calls.push(MotorCall::Set(speed));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EqptError> {
        self.calls.push(MotorCall::Stop);
        Ok(())
    }
}

/// Timer whose reads cycle through a fixed list of elapsed times.
pub struct FakeTimer {
    pub reads: Vec<f64>,
    pub idx: std::cell::Cell<usize>,
    pub running: bool,
    pub resets: usize,
    pub idles: Vec<f64>,
}

impl FakeTimer {
    pub fn new(reads: &[f64]) -> Self {
        Self {
            reads: reads.to_vec(),
            idx: std::cell::Cell::new(0),
            running: false,
            resets: 0,
            idles: Vec::new()
        }
    }
}

impl IntervalTimer for FakeTimer {
    fn start(&mut self) { self.running = true; }
    fn stop(&mut self) { self.running = false; }
    fn reset(&mut self) { self.resets += 1; }

    fn read(&self) -> f64 {
        let i = self.idx.get();
        self.idx.set(i + 1);
        self.reads[i % self.reads.len()]
    }

    fn idle(&mut self, remaining_s: f64) {
        self.idles.push(remaining_s);
    }
}
