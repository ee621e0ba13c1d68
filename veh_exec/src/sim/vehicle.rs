//! Simulated differential drive vehicle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{sync::{Arc, Mutex}, time::Instant};

use eqpt_if::{
    imu::{EulerAngles, Imu, LinAccel},
    motor::{Motor, MotorSide},
    odom::WheelEncoder,
    EqptError,
};
use log::trace;
use serde::Deserialize;
use util::maths::rem_euclid;

use super::lock;
use crate::steer_ctrl::MAX_MOTOR_SPEED;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimVehicleParams {
    /// Units: degrees
    pub initial_heading_deg: f64,

    /// Turn rate per unit of left minus right wheel speed. Positive turns clockwise.
    ///
    /// Units: degrees/second/percent
    pub turn_gain: f64,

    /// Turn rate with both wheels at the same speed.
    ///
    /// Units: degrees/second
    pub drift_deg_s: f64,

    /// Encoder rate per unit of wheel speed.
    ///
    /// Units: pulses/second/percent
    pub pulses_per_speed_s: f64,
}

/// A differential drive vehicle integrated against wall clock time.
///
/// The world is advanced whenever any handle touches it.
#[derive(Clone)]
pub struct SimVehicle {
    world: Arc<Mutex<VehicleWorld>>,
}

pub struct SimImu {
    world: Arc<Mutex<VehicleWorld>>,
}

pub struct SimEncoder {
    world: Arc<Mutex<VehicleWorld>>,
    side: MotorSide,
}

pub struct SimMotor {
    world: Arc<Mutex<VehicleWorld>>,
    side: MotorSide,
}

struct VehicleWorld {
    params: SimVehicleParams,

    heading_deg: f64,

    /// Speed of each wheel, `None` if its motor hasn't been started
    speed: [Option<f64>; 2],

    /// Pulses since the last encoder reset, fractional parts kept between resets
    pulses: [f64; 2],

    last_update: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimVehicleParams {
    fn default() -> Self {
        Self {
            initial_heading_deg: 0.0,
            turn_gain: 0.5,
            drift_deg_s: 2.0,
            pulses_per_speed_s: 20.0,
        }
    }
}

impl SimVehicle {
    pub fn new(params: &SimVehicleParams) -> Self {
        Self {
            world: Arc::new(Mutex::new(VehicleWorld {
                params: params.clone(),
                heading_deg: rem_euclid(params.initial_heading_deg, 360.0),
                speed: [None, None],
                pulses: [0.0, 0.0],
                last_update: Instant::now(),
            }))
        }
    }

    pub fn imu(&self) -> SimImu {
        SimImu { world: self.world.clone() }
    }

    pub fn encoder(&self, side: MotorSide) -> SimEncoder {
        SimEncoder { world: self.world.clone(), side }
    }

    pub fn motor(&self, side: MotorSide) -> SimMotor {
        SimMotor { world: self.world.clone(), side }
    }

    pub fn heading_deg(&self) -> f64 {
        let mut w = lock(&self.world);
        w.update();
        w.heading_deg
    }

    /// Current wheel speeds, zero for a stopped motor.
    pub fn speeds(&self) -> (f64, f64) {
        let w = lock(&self.world);
        (w.speed[0].unwrap_or(0.0), w.speed[1].unwrap_or(0.0))
    }
}

impl VehicleWorld {
    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        let left = self.speed[0].unwrap_or(0.0);
        let right = self.speed[1].unwrap_or(0.0);

        let rate_deg_s = (left - right) * self.params.turn_gain + self.params.drift_deg_s;
        self.heading_deg = rem_euclid(self.heading_deg + rate_deg_s * dt, 360.0);

        // Round-off can land exactly on 360
        if self.heading_deg >= 360.0 {
            self.heading_deg = 0.0;
        }

        self.pulses[0] += left * self.params.pulses_per_speed_s * dt;
        self.pulses[1] += right * self.params.pulses_per_speed_s * dt;
    }
}

fn index(side: MotorSide) -> usize {
    match side {
        MotorSide::Left => 0,
        MotorSide::Right => 1,
    }
}

impl Imu for SimImu {
    fn euler(&mut self) -> Result<EulerAngles, EqptError> {
        let mut w = lock(&self.world);
        w.update();
        trace!("Sim heading {:.3}", w.heading_deg);

        Ok(EulerAngles {
            heading_deg: w.heading_deg,
            ..Default::default()
        })
    }

    /// Wheel speeds change instantly in the simulation, so there's never any acceleration.
    fn lin_accel(&mut self) -> Result<LinAccel, EqptError> {
        Ok(LinAccel::default())
    }
}

impl WheelEncoder for SimEncoder {
    fn pulses(&self) -> i32 {
        let mut w = lock(&self.world);
        w.update();
        w.pulses[index(self.side)] as i32
    }

    fn reset(&mut self) {
        let mut w = lock(&self.world);
        let p = &mut w.pulses[index(self.side)];
        *p -= p.trunc();
    }
}

impl Motor for SimMotor {
    fn start(&mut self, speed: i32) -> Result<(), EqptError> {
        check_speed(speed)?;

        let mut w = lock(&self.world);
        w.update();
        w.speed[index(self.side)] = Some(speed as f64);

        Ok(())
    }

    fn set_output(&mut self, speed: i32) -> Result<(), EqptError> {
        check_speed(speed)?;

        let mut w = lock(&self.world);
        w.update();
        match w.speed.get_mut(index(self.side)) {
            Some(Some(s)) => {
                *s = speed as f64;
                Ok(())
            },
            _ => Err(EqptError::Bus(format!("{:?} motor not started", self.side)))
        }
    }

    fn stop(&mut self) -> Result<(), EqptError> {
        let mut w = lock(&self.world);
        w.update();
        w.speed[index(self.side)] = None;

        Ok(())
    }
}

fn check_speed(speed: i32) -> Result<(), EqptError> {
    if (speed as f64).abs() > MAX_MOTOR_SPEED {
        Err(EqptError::OutOfRange(speed as f64))
    }
    else {
        Ok(())
    }
}
