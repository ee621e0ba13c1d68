//! [`PidLoop`] recomputed synchronously on every exchange

use super::{PidController, PidIo, PidLoop};

/// A PID loop with no clock of its own.
///
/// While running, every [`PidLoop::exchange`] evaluates the controller once against the new
/// input, so the caller's own control interval is the controller interval.
#[derive(Debug, Clone)]
pub struct SteppedPid {
    ctrl: PidController,
    io: PidIo,
    running: bool,
}

impl SteppedPid {
    pub fn new(ctrl: PidController) -> Self {
        Self {
            ctrl,
            io: PidIo::default(),
            running: false
        }
    }
}

impl PidLoop for SteppedPid {
    fn start(&mut self) {
        if !self.running {
            self.ctrl.resume();
            self.running = true;
        }
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_setpoint(&mut self, setpoint: f64) {
        self.io.setpoint = setpoint;
    }

    fn exchange(&mut self, input: f64) -> f64 {
        self.io.input = input;

        if self.running {
            self.io.output = self.ctrl.compute(self.io.setpoint, self.io.input);
        }

        self.io.output
    }

    fn io(&self) -> PidIo {
        self.io
    }
}
