//! # Mecha Control Unit
//!
//! Dry-run host for the control core. Loads the robot configuration, builds
//! the robot against inert devices, switches to the requested mode and runs
//! the fixed-period cycle until the cycle limit or Ctrl-C.

use clap::{Parser, ValueEnum};
use mecha_common::config::{ConfigError, LogLevel};
use mecha_common::consts::DEFAULT_CONFIG_PATH;
use mecha_common::robot::config::RobotConfig;
use mecha_common::robot::state::RobotMode;
use mecha_control_unit::config::load_robot_config;
use mecha_control_unit::cycle::CycleRunner;
use mecha_control_unit::event::MonotonicClock;
use mecha_control_unit::inert::inert_robot_hardware;
use mecha_control_unit::params::ConfigurableParams;
use mecha_control_unit::robot::Robot;
use mecha_control_unit::task::Scheduler;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Disabled,
    Autonomous,
    Teleop,
}

impl From<ModeArg> for RobotMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Disabled => Self::Disabled,
            ModeArg::Autonomous => Self::Autonomous,
            ModeArg::Teleop => Self::TeleOp,
        }
    }
}

/// Mecha Control Unit: cooperative robot control core
#[derive(Parser, Debug)]
#[command(name = "mecha_control_unit")]
#[command(version)]
#[command(about = "Dry-run host for the cooperative robot control core")]
struct Args {
    /// Path to the robot configuration TOML. Built-in defaults are used
    /// when the file does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Mode to enter after start-up.
    #[arg(long, value_enum, default_value_t = ModeArg::Autonomous)]
    mode: ModeArg,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Print the drive base tunables and exit.
    #[arg(long)]
    list_params: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Tracing needs the configured log level, so configuration is loaded
    // first and its errors go straight to stderr.
    let (config, from_file) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!("Mecha Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!("Loaded config from {}", args.config.display());
    } else {
        warn!(
            "Config '{}' not found, using built-in defaults",
            args.config.display()
        );
    }

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Mecha Control Unit shutdown complete");
}

/// Load the configuration file, or the validated defaults when it does not
/// exist. The flag reports whether the file was used.
fn load_config(args: &Args) -> Result<(RobotConfig, bool), ConfigError> {
    if args.config.exists() {
        return Ok((load_robot_config(&args.config)?, true));
    }
    let config = RobotConfig::default();
    config.validate()?;
    Ok((config, false))
}

fn run(args: &Args, config: &RobotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = Scheduler::new();
    let robot = Robot::build(
        config,
        inert_robot_hardware(),
        Rc::new(MonotonicClock::new()),
        &mut scheduler,
    )?;

    if args.list_params {
        let drive = robot.drive_base().borrow();
        for desc in drive.param_descriptors() {
            let value = drive.get_param(desc.name)?.to_string();
            let access = if desc.writable { "rw" } else { "ro" };
            println!("{:<10} {access}  {value:<32} {}", desc.name, desc.description);
        }
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = CycleRunner::new(scheduler, robot, config.cycle_time_ms);
    runner.set_mode(args.mode.into());
    info!(
        robot = %config.shared.robot_name,
        cycle_time_ms = config.cycle_time_ms,
        tasks = runner.scheduler().len(),
        "entering cycle loop"
    );

    let cycles = runner.run(args.cycles, &running);
    let pose = runner.handler().drive_base().borrow().pose();
    info!(cycles, x = pose.x, y = pose.y, rotation = pose.rotation, "cycle loop exited");
    println!("{}", runner.stats());
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        Level::DEBUG.as_str().to_ascii_lowercase()
    } else {
        log_level.as_directive().to_string()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
