//! Simulated brake actuator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{convert::Infallible, sync::{Arc, Mutex}};

use embedded_hal::digital::v2::OutputPin;
use eqpt_if::{
    brake::{DriveChannel, PositionSensor},
    EqptError,
};
use log::warn;
use serde::Deserialize;

use super::lock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimBrakeParams {
    /// Position of the actuator at start.
    pub initial_position: f64,

    /// Distance moved per position read at full duty.
    pub travel_per_read: f64,
}

/// Which H-bridge channel a drive handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeChannel {
    Extend,
    Retract,
}

/// A linear actuator which moves a fixed amount every time its position is read.
///
/// Tying motion to reads rather than time makes seeks deterministic.
#[derive(Clone)]
pub struct SimBrake {
    world: Arc<Mutex<BrakeWorld>>,
}

pub struct SimPositionSensor {
    world: Arc<Mutex<BrakeWorld>>,
}

pub struct SimDriveChannel {
    world: Arc<Mutex<BrakeWorld>>,
    channel: BrakeChannel,
}

pub struct SimEnablePin {
    world: Arc<Mutex<BrakeWorld>>,
}

struct BrakeWorld {
    position: f64,
    travel_per_read: f64,

    extend_duty: f64,
    retract_duty: f64,
    extend_period_us: u32,
    retract_period_us: u32,

    enabled: bool,
    jammed: bool,

    /// Set if both channels were ever driven together
    overlap_seen: bool,

    reads: usize,
    fail_at_read: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimBrakeParams {
    fn default() -> Self {
        Self {
            initial_position: 0.2,
            travel_per_read: 0.001,
        }
    }
}

impl SimBrake {
    pub fn new(params: &SimBrakeParams) -> Self {
        Self {
            world: Arc::new(Mutex::new(BrakeWorld {
                position: params.initial_position,
                travel_per_read: params.travel_per_read,
                extend_duty: 0.0,
                retract_duty: 0.0,
                extend_period_us: 0,
                retract_period_us: 0,
                enabled: false,
                jammed: false,
                overlap_seen: false,
                reads: 0,
                fail_at_read: None,
            }))
        }
    }

    pub fn sensor(&self) -> SimPositionSensor {
        SimPositionSensor { world: self.world.clone() }
    }

    pub fn drive_channel(&self, channel: BrakeChannel) -> SimDriveChannel {
        SimDriveChannel { world: self.world.clone(), channel }
    }

    pub fn enable_pin(&self) -> SimEnablePin {
        SimEnablePin { world: self.world.clone() }
    }

    pub fn position(&self) -> f64 {
        lock(&self.world).position
    }

    /// Duty cycles of the extend and retract channels.
    pub fn duties(&self) -> (f64, f64) {
        let w = lock(&self.world);
        (w.extend_duty, w.retract_duty)
    }

    pub fn period_us(&self, channel: BrakeChannel) -> u32 {
        let w = lock(&self.world);
        match channel {
            BrakeChannel::Extend => w.extend_period_us,
            BrakeChannel::Retract => w.retract_period_us,
        }
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.world).enabled
    }

    pub fn overlap_seen(&self) -> bool {
        lock(&self.world).overlap_seen
    }

    /// A jammed actuator doesn't move however it's driven.
    pub fn set_jammed(&self, jammed: bool) {
        lock(&self.world).jammed = jammed;
    }

    /// Fail every position read after `reads` more successful ones. `None` clears the failure.
    pub fn fail_at_read(&self, reads: Option<usize>) {
        let mut w = lock(&self.world);
        let done = w.reads;
        w.fail_at_read = reads.map(|n| done + n);
    }
}

impl PositionSensor for SimPositionSensor {
    fn read(&mut self) -> Result<f64, EqptError> {
        let mut w = lock(&self.world);

        if let Some(n) = w.fail_at_read {
            if w.reads >= n {
                return Err(EqptError::NoResponse);
            }
        }
        w.reads += 1;

        if w.enabled && !w.jammed {
            let drive = w.extend_duty - w.retract_duty;
            w.position = (w.position + drive * w.travel_per_read).max(0.0).min(1.0);
        }

        Ok(w.position)
    }
}

impl DriveChannel for SimDriveChannel {
    fn set_period_us(&mut self, period_us: u32) -> Result<(), EqptError> {
        let mut w = lock(&self.world);
        match self.channel {
            BrakeChannel::Extend => w.extend_period_us = period_us,
            BrakeChannel::Retract => w.retract_period_us = period_us,
        }
        Ok(())
    }

    fn set_duty(&mut self, duty: f64) -> Result<(), EqptError> {
        if !(0.0..=1.0).contains(&duty) {
            return Err(EqptError::OutOfRange(duty));
        }

        let mut w = lock(&self.world);
        match self.channel {
            BrakeChannel::Extend => w.extend_duty = duty,
            BrakeChannel::Retract => w.retract_duty = duty,
        }

        if w.extend_duty > 0.0 && w.retract_duty > 0.0 && !w.overlap_seen {
            warn!("Both brake channels driven at once");
            w.overlap_seen = true;
        }

        Ok(())
    }

    fn duty(&self) -> f64 {
        let w = lock(&self.world);
        match self.channel {
            BrakeChannel::Extend => w.extend_duty,
            BrakeChannel::Retract => w.retract_duty,
        }
    }
}

impl OutputPin for SimEnablePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        lock(&self.world).enabled = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        lock(&self.world).enabled = true;
        Ok(())
    }
}
