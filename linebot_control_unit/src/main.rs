//! # Linebot Control Unit
//!
//! Fixed-rate control loop for the linebot line-following vehicle.
//!
//! Loads the vehicle calibration from TOML (falling back to the built-in
//! defaults when the file is absent), performs RT setup, attaches the
//! simulated board, waits for the start signal and enters the control
//! loop. Real hardware boards plug in through the same `Board` trait.

use clap::Parser;
use linebot_common::config::CalibrationConfig;
use linebot_control_unit::config::{ConfigError, load_config};
use linebot_control_unit::cycle::{CycleRunner, rt_setup};
use linebot_hal::SimulatedBoard;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Linebot Control Unit — fixed-rate vehicle control loop
#[derive(Parser, Debug)]
#[command(name = "linebot_control_unit")]
#[command(version)]
#[command(about = "Sensing, policy and ramped-actuation loop for the linebot vehicle")]
struct Args {
    /// Path to the calibration TOML.
    #[arg(default_value = "config/calibration.toml")]
    config: PathBuf,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Linebot Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config(&args.config) {
        Ok(config) => {
            info!("Calibration loaded from {}", args.config.display());
            config
        }
        Err(ConfigError::IoError(e)) => {
            warn!("{e}; using default calibration");
            CalibrationConfig::default()
        }
        Err(e) => return Err(Box::new(e)),
    };

    info!(
        "Calibration OK: cycle_time={}µs, right=[{}, {}], left=[{}, {}]",
        config.cycle_time_us, config.right.stop, config.right.full, config.left.stop,
        config.left.full,
    );

    // RT setup (mlockall, affinity, scheduler).
    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let board = SimulatedBoard::new();
    let mut runner = CycleRunner::new(board, &config);

    runner.start()?;
    info!("Board up and start signal observed, entering control loop");

    // Runs forever; only RT clock failures come back out.
    runner.run()?;

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

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
