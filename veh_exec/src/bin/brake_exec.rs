//! Brake exercise executable.
//!
//! Drives the simulated brake actuator through a list of target positions, then stops it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use structopt::StructOpt;

// Internal
use util::{
    logger::{logger_init, parse_level, LevelFilter},
    session::Session,
};
use veh_lib::{
    brake_ctrl::{self, BrakeCtrl, BrakeError},
    sim::{BrakeChannel, SimBrake, SimParams},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Seek the brake actuator to each target position in turn.
#[derive(Debug, StructOpt)]
#[structopt(name = "brake_exec")]
struct Opt {
    /// Target positions as fractions of full travel.
    #[structopt(required = true)]
    targets: Vec<f64>,

    /// Minimum level of log messages, `info` or more verbose.
    #[structopt(short, long, default_value = "info", parse(try_from_str = parse_level))]
    log_level: LevelFilter,

    /// Clear faults and carry on with the next target instead of stopping.
    #[structopt(long)]
    reset_faults: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    let session = Session::new("brake_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &[], &session)
        .wrap_err("Failed to initialise logging")?;

    info!("SLONAV Brake Executable\n");

    let brake_params: brake_ctrl::Params = util::params::load("brake_ctrl.toml")
        .wrap_err("Could not load brake params")?;
    let sim_params: SimParams = util::params::load("sim.toml")
        .wrap_err("Could not load simulation params")?;

    let sim = SimBrake::new(&sim_params.brake);

    let mut brake = BrakeCtrl::new(
        brake_params,
        sim.drive_channel(BrakeChannel::Extend),
        sim.drive_channel(BrakeChannel::Retract),
        sim.enable_pin(),
        sim.sensor()
    ).wrap_err("Failed to initialise BrakeCtrl")?;

    info!("Brake at {:.3}", brake.get_position().wrap_err("Could not read the brake")?);

    let mut result = Ok(());

    for target in opt.targets.iter() {
        match brake.set_position(*target) {
            Ok(report) => info!(
                "Target {:.3}: {:?} from {:.3} to {:.3} in {:.3} s",
                report.target,
                report.motion,
                report.start_position,
                report.final_position,
                report.elapsed_s
            ),
            Err(e @ BrakeError::ActuatorStall { .. })
            | Err(e @ BrakeError::SensorUnavailable(_)) if opt.reset_faults => {
                warn!("Target {:.3} failed: {}", target, e);
                brake.reset_fault().wrap_err("Could not reset the brake fault")?;
            },
            Err(e) => {
                error!("Target {:.3} failed: {}", target, e);
                result = Err(e);
                break;
            }
        }
    }

    brake.stop().wrap_err("Failed to stop the brake")?;

    info!("End of execution");

    result.wrap_err("Brake exercise failed")
}
