//! Main vehicle executable entry point.
//!
//! Runs a steering mission: the vehicle is held on the heading it was pointing at when the
//! executable started until the mission distance has been covered, then stopped.
//!
//! The vehicle equipment is simulated, see `veh_lib::sim`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use eqpt_if::{motor::MotorSide, timer::StdTimer};
use log::{info, warn};
use structopt::StructOpt;

// Internal
use util::{
    logger::{logger_init, parse_level, LevelFilter},
    session::Session,
};
use veh_lib::{
    sim::{SimParams, SimVehicle},
    steer_ctrl::{self, Equipment, SteerCtrl, SteerSupervisor},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Hold the vehicle's heading for a set distance.
#[derive(Debug, StructOpt)]
#[structopt(name = "veh_exec")]
struct Opt {
    /// Mission distance in encoder pulses, overriding the parameter file.
    #[structopt(short, long)]
    distance: Option<i64>,

    /// Minimum level of log messages, `info` or more verbose.
    #[structopt(short, long, default_value = "info", parse(try_from_str = parse_level))]
    log_level: LevelFilter,

    /// Steering parameter file, relative to the params directory.
    #[structopt(short, long, default_value = "steer_ctrl.toml")]
    params: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("veh_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &[], &session)
        .wrap_err("Failed to initialise logging")?;

    info!("SLONAV Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut steer_params: steer_ctrl::Params = util::params::load(&opt.params)
        .wrap_err("Could not load steering params")?;

    if let Some(distance) = opt.distance {
        info!("Mission distance set to {} pulses", distance);
        steer_params.mission_distance_pulses = distance;
    }

    let sim_params: SimParams = util::params::load("sim.toml")
        .wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- MODULE INITIALISATION ----

    let ctrl = SteerCtrl::from_params(steer_params)
        .wrap_err("Failed to initialise SteerCtrl")?;

    let sim = SimVehicle::new(&sim_params.vehicle);

    let mut supervisor = SteerSupervisor::new(
        Equipment {
            imu: sim.imu(),
            left_encoder: sim.encoder(MotorSide::Left),
            right_encoder: sim.encoder(MotorSide::Right),
            left_motor: sim.motor(MotorSide::Left),
            right_motor: sim.motor(MotorSide::Right),
            timer: StdTimer::new(),
        },
        ctrl
    );

    info!("Module initialisation complete\n");

    // ---- MISSION ----

    let report = supervisor.run().wrap_err("Steering mission failed")?;

    info!(
        "Held {:.2} deg for {} cycles, finishing {} pulses past the mission distance",
        report.setpoint_deg,
        report.cycles,
        -report.distance_rem
    );

    let final_heading = sim.heading_deg();
    if (final_heading - report.setpoint_deg).abs() > 10.0 {
        warn!("Final heading {:.2} deg is far from the setpoint", final_heading);
    }

    info!("End of execution");

    Ok(())
}
