//! # PID module
//!
//! A discrete PID controller and two ways of running it:
//!
//! - [`SteppedPid`] recomputes synchronously each time new input is exchanged.
//! - [`ThreadedPid`] recomputes on its own periodic tick in a background thread.
//!
//! Both hold the setpoint, input and output together in a [`PidIo`] block. Callers never get a
//! reference into that block, they [`PidLoop::exchange`] a new input for the latest output, which
//! is done as a single critical section so a tick can never compute against a half written block.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod controller;
mod stepped;
mod threaded;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use controller::*;
pub use stepped::*;
pub use threaded::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The values shared between a PID loop and its user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidIo {
    pub setpoint: f64,
    pub input: f64,
    pub output: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How a PID loop is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidMode {
    /// Output recomputed whenever input is exchanged
    Stepped,

    /// Output recomputed by a background tick every controller interval
    Threaded,
}

/// Errors raised while running a PID loop.
#[derive(thiserror::Error, Debug)]
pub enum PidError {
    #[error("Could not spawn the PID tick thread: {0}")]
    SpawnFailed(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A PID controller together with whatever drives its periodic recomputation.
pub trait PidLoop {
    /// Enable periodic recomputation.
    fn start(&mut self);

    /// Disable periodic recomputation. The output holds its last value.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    fn set_setpoint(&mut self, setpoint: f64);

    /// Write a new input and read back the current output in one critical section.
    fn exchange(&mut self, input: f64) -> f64;

    /// A consistent snapshot of the shared values.
    fn io(&self) -> PidIo;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: PidLoop + ?Sized> PidLoop for Box<P> {
    fn start(&mut self) {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn set_setpoint(&mut self, setpoint: f64) {
        (**self).set_setpoint(setpoint)
    }

    fn exchange(&mut self, input: f64) -> f64 {
        (**self).exchange(input)
    }

    fn io(&self) -> PidIo {
        (**self).io()
    }
}

impl PidMode {
    /// Build a boxed loop of this mode around the given controller.
    pub fn build(self, ctrl: PidController) -> Result<Box<dyn PidLoop + Send>, PidError> {
        Ok(match self {
            PidMode::Stepped => Box::new(SteppedPid::new(ctrl)),
            PidMode::Threaded => Box::new(ThreadedPid::new(ctrl)?),
        })
    }
}
