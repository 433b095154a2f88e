//! # EGM HAL Binary
//!
//! Runs the EGM hardware adapter under a fixed-rate host loop.
//!
//! # Usage
//!
//! ```bash
//! # Local description, simulated controller
//! egm_hal --config config/egm.toml
//!
//! # Remote mode, description served from a snapshot
//! egm_hal --config config/egm_rws.toml --description config/irb1200_description.toml
//!
//! # Print the controller description as JSON and exit
//! egm_hal --config config/egm.toml --dump-description
//!
//! # Verbose logging, stop after 1000 cycles
//! egm_hal --config config/egm.toml -v --cycles 1000
//! ```

use clap::Parser;
use egm_common::config::{ConfigLoader, LogLevel};
use egm_common::hal::description::ControllerDescription;
use egm_common::hal::driver::{DescriptionProvider, DescriptionRequest, HalError, SystemInterface};
use egm_hal::drivers::simulation::{SnapshotDescriptionProvider, manager_factory};
use egm_hal::{CancellationToken, EgmSystem, HalCore, HostConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// EGM HAL - hardware adapter for ABB Externally Guided Motion
#[derive(Parser, Debug)]
#[command(name = "egm_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Hardware adapter bridging joint interfaces to EGM motion channels")]
#[command(long_about = None)]
struct Args {
    /// Path to host configuration file
    #[arg(short, long, default_value = "/etc/egm/egm.toml")]
    config: PathBuf,

    /// Controller description snapshot served in place of RWS
    #[arg(short, long, value_name = "FILE")]
    description: Option<PathBuf>,

    /// Stop after this many control cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Print the controller description as JSON and exit
    #[arg(long)]
    dump_description: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

/// Provider used when no snapshot is given: remote mode cannot proceed.
struct UnavailableProvider;

impl DescriptionProvider for UnavailableProvider {
    fn fetch_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<ControllerDescription, HalError> {
        Err(HalError::RemoteDescription(format!(
            "no description source for {}:{} (pass --description)",
            request.endpoint.address, request.endpoint.port
        )))
    }
}

fn main() {
    if let Err(e) = run() {
        error!("EGM HAL failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = HostConfig::load(&args.config);
    let log_level = match &config {
        Ok(c) => c.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, log_level);

    let config = config?;
    info!(
        "EGM HAL v{} starting as '{}'...",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let provider: Box<dyn DescriptionProvider> = match &args.description {
        Some(path) => {
            info!("Serving controller description from {:?}", path);
            Box::new(SnapshotDescriptionProvider::load(path)?)
        }
        None => Box::new(UnavailableProvider),
    };

    let cancel = CancellationToken::new();
    let system = EgmSystem::new(provider, manager_factory()).with_cancellation(cancel.clone());

    if args.dump_description {
        return dump_description(system, &config);
    }

    let mut hal_core = HalCore::new(Box::new(system), config)?
        .with_cancellation(cancel.clone())
        .with_max_cycles(args.cycles);

    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        cancel.cancel();
    })?;

    hal_core.init()?;

    // Commands stay at the values seeded on activation.
    let outcome = hal_core.serve(|_, _, _| Ok(()));

    let stats = hal_core.stats();
    info!(
        "{} cycles, avg={}us, max={}us, violations={}",
        stats.cycle_count,
        stats.average_cycle_time_us(),
        stats.max_cycle_time_us,
        stats.timing_violations
    );

    hal_core.shutdown()?;
    outcome?;
    info!("EGM HAL shutdown complete");
    Ok(())
}

/// Initialize the system, print its description and release it.
fn dump_description(
    mut system: EgmSystem,
    config: &HostConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    system.on_init(&config.hardware)?;
    if let Some(description) = system.description() {
        println!("{}", serde_json::to_string_pretty(description)?);
    }
    system.shutdown()?;
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        log_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
