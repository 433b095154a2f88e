//! HAL Core struct and control loop management.
//!
//! `HalCore` plays the hosting framework: it drives a [`SystemInterface`]
//! through init → activate → {read, update, write}* at a fixed cycle rate
//! and tears it down on shutdown.

use crate::cancel::CancellationToken;
use egm_common::config::{ConfigError, SharedConfig};
use egm_common::consts::{DEFAULT_CYCLE_TIME_US, HAL_SERVICE_NAME};
use egm_common::hal::config::HardwareInfo;
use egm_common::hal::driver::{HalError, SystemInterface};
use egm_common::hal::types::{CommandInterface, StateInterface};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Host configuration file.
///
/// # TOML Example
///
/// ```toml
/// cycle_time_us = 4000
///
/// [shared]
/// log_level = "info"
/// service_name = "egm_hal"
///
/// [hardware]
/// name = "irb1200"
///
/// [hardware.parameters]
/// configure_via_rws = "false"
/// egm_port = "6511"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Logging and service identity
    #[serde(default = "default_shared")]
    pub shared: SharedConfig,

    /// Control cycle period in microseconds
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Hardware declaration handed to the system on init
    pub hardware: HardwareInfo,
}

fn default_shared() -> SharedConfig {
    SharedConfig {
        log_level: Default::default(),
        service_name: HAL_SERVICE_NAME.to_string(),
    }
}

fn default_cycle_time_us() -> u32 {
    DEFAULT_CYCLE_TIME_US
}

impl HostConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` for a zero cycle time or an empty
    /// service name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Cycle period as a `Duration`.
    pub fn cycle_time(&self) -> Duration {
        Duration::from_micros(u64::from(self.cycle_time_us))
    }
}

/// Handles exported by the system after init.
#[derive(Debug, Clone, Default)]
pub struct InterfaceSet {
    /// Read handles, canonical order
    pub state: Vec<StateInterface>,
    /// Read-write handles, canonical order
    pub command: Vec<CommandInterface>,
}

/// Timing statistics for control loop monitoring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Number of timing violations (cycle exceeded target)
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
}

impl TimingStats {
    /// Average cycle time, 0 before the first cycle.
    pub fn average_cycle_time_us(&self) -> u64 {
        self.total_cycle_time_us
            .checked_div(self.cycle_count)
            .unwrap_or(0)
    }

    fn record(&mut self, cycle_time_us: u64, target_us: u64) {
        self.cycle_count += 1;
        self.total_cycle_time_us += cycle_time_us;
        self.max_cycle_time_us = self.max_cycle_time_us.max(cycle_time_us);

        if cycle_time_us > target_us {
            self.timing_violations += 1;
            if self.timing_violations <= 10 || self.timing_violations % 1000 == 0 {
                warn!(
                    "Timing violation #{}: cycle took {}us (target {}us)",
                    self.timing_violations, cycle_time_us, target_us
                );
            }
        }
    }
}

/// Drives a system through its lifecycle and the cyclic loop.
pub struct HalCore {
    /// System under control
    system: Box<dyn SystemInterface>,
    /// Hardware declaration passed to `on_init`
    hardware: HardwareInfo,
    /// Handles exported after init
    interfaces: InterfaceSet,
    /// Cycle time from config
    cycle_time: Duration,
    /// Stops the loop (and a pending activation) when cancelled
    cancel: CancellationToken,
    /// Stop after this many cycles
    max_cycles: Option<u64>,
    /// Timing statistics
    stats: TimingStats,
}

impl HalCore {
    /// Create a new HalCore driving `system` with the given configuration.
    ///
    /// # Errors
    /// `HalError::ConfigError` if the configuration does not validate.
    pub fn new(system: Box<dyn SystemInterface>, config: HostConfig) -> Result<Self, HalError> {
        config
            .validate()
            .map_err(|e| HalError::ConfigError(e.to_string()))?;

        info!(
            "HalCore created for system '{}' with {} joints, cycle_time={}us",
            system.name(),
            config.hardware.joints.len(),
            config.cycle_time_us
        );

        Ok(Self {
            system,
            hardware: config.hardware,
            interfaces: InterfaceSet::default(),
            cycle_time: Duration::from_micros(u64::from(config.cycle_time_us)),
            cancel: CancellationToken::new(),
            max_cycles: None,
            stats: TimingStats::default(),
        })
    }

    /// Stop when `token` is cancelled instead of the internal token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stop after `cycles` cycles.
    pub fn with_max_cycles(mut self, cycles: Option<u64>) -> Self {
        self.max_cycles = cycles;
        self
    }

    /// Initialize the system and collect its interfaces.
    ///
    /// # Errors
    /// Propagates the system's init or export error.
    pub fn init(&mut self) -> Result<(), HalError> {
        info!("Initializing HalCore...");
        self.system.on_init(&self.hardware)?;

        self.interfaces = InterfaceSet {
            state: self.system.export_state_interfaces()?,
            command: self.system.export_command_interfaces()?,
        };
        for handle in &self.interfaces.state {
            debug!("Exported state interface {}", handle.name());
        }
        for handle in &self.interfaces.command {
            debug!("Exported command interface {}", handle.name());
        }

        info!(
            "HalCore initialized: {} state / {} command interfaces",
            self.interfaces.state.len(),
            self.interfaces.command.len()
        );
        Ok(())
    }

    /// Activate the system and run the control loop.
    ///
    /// Each cycle calls `read`, then `update` with the exported interfaces,
    /// then `write`. Blocks until the cancellation token fires or the cycle
    /// limit is reached.
    ///
    /// # Errors
    /// Propagates activation failures and errors from read, update or write.
    pub fn run<F>(&mut self, mut update: F) -> Result<(), HalError>
    where
        F: FnMut(&mut dyn SystemInterface, &InterfaceSet, Duration) -> Result<(), HalError>,
    {
        self.system.on_activate()?;

        info!(
            "Starting HalCore control loop (cycle_time={}us)...",
            self.cycle_time.as_micros()
        );
        if detect_rt_mode() {
            info!("Running in real-time mode");
        } else {
            info!("Running in standard (non-RT) mode");
        }

        let target_us = self.cycle_time.as_micros() as u64;
        let mut last_cycle = Instant::now();

        while !self.cancel.is_cancelled() && !self.cycle_limit_reached() {
            let cycle_start = Instant::now();
            let dt = cycle_start.duration_since(last_cycle);
            last_cycle = cycle_start;

            self.system.read(dt)?;
            update(self.system.as_mut(), &self.interfaces, dt)?;
            self.system.write(dt)?;

            self.stats
                .record(cycle_start.elapsed().as_micros() as u64, target_us);

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    "Control loop: {} cycles, avg={}us, max={}us, violations={}",
                    self.stats.cycle_count,
                    self.stats.average_cycle_time_us(),
                    self.stats.max_cycle_time_us,
                    self.stats.timing_violations
                );
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }
        }

        info!(
            "HalCore control loop stopped after {} cycles (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
        Ok(())
    }

    /// [`run`](Self::run) as seen by the process: an activation cancelled
    /// by a shutdown request is a clean stop, every other failure is fatal.
    ///
    /// # Errors
    /// Everything [`run`](Self::run) returns except `HalError::Cancelled`.
    pub fn serve<F>(&mut self, update: F) -> Result<(), HalError>
    where
        F: FnMut(&mut dyn SystemInterface, &InterfaceSet, Duration) -> Result<(), HalError>,
    {
        match self.run(update) {
            Err(HalError::Cancelled) => {
                info!("Activation cancelled by shutdown request");
                Ok(())
            }
            Err(e) => {
                error!("Control loop stopped: {}", e);
                Err(e)
            }
            Ok(()) => Ok(()),
        }
    }

    fn cycle_limit_reached(&self) -> bool {
        self.max_cycles
            .is_some_and(|max| self.stats.cycle_count >= max)
    }

    /// Deactivate (if active) and shut the system down.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutdown requested");
        self.cancel.cancel();

        if let Err(e) = self.system.on_deactivate() {
            debug!("Deactivation skipped: {}", e);
        }
        self.system.shutdown()
    }

    /// Token stopping the loop, for signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Exported interfaces.
    pub fn interfaces(&self) -> &InterfaceSet {
        &self.interfaces
    }

    /// System under control.
    pub fn system(&self) -> &dyn SystemInterface {
        self.system.as_ref()
    }

    /// Get timing statistics.
    pub fn stats(&self) -> TimingStats {
        self.stats
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: sched_getscheduler(0) only queries the calling thread.
        unsafe {
            let policy = sched_getscheduler(0);
            policy == SCHED_FIFO || policy == SCHED_RR
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egm_common::config::ConfigLoader;

    #[test]
    fn test_host_config_defaults() {
        let config = HostConfig::from_toml(
            r#"
[hardware]
name = "irb1200"
"#,
        )
        .unwrap();
        assert_eq!(config.cycle_time_us, 4000);
        assert_eq!(config.shared.service_name, "egm_hal");
        assert_eq!(config.cycle_time(), Duration::from_millis(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_host_config_rejects_zero_cycle() {
        let config = HostConfig::from_toml(
            r#"
cycle_time_us = 0

[hardware]
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_timing_stats() {
        let mut stats = TimingStats::default();
        assert_eq!(stats.average_cycle_time_us(), 0);
        stats.record(100, 4000);
        stats.record(5000, 4000);
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.timing_violations, 1);
        assert_eq!(stats.max_cycle_time_us, 5000);
        assert_eq!(stats.average_cycle_time_us(), 2550);
    }
}
