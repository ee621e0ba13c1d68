//! # Vehicle library.
//!
//! Closed loop actuation and steering for the vehicle. This library allows the executables in
//! this crate to share the control modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Brake control - drives the brake linear actuator to a commanded position
pub mod brake_ctrl;

/// Discrete PID controllers and the loops which run them
pub mod pid;

/// Simulated equipment - stands in for the vehicle hardware
pub mod sim;

/// Steering control - holds the vehicle on its initial heading for the mission distance
pub mod steer_ctrl;
