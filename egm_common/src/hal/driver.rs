//! Error taxonomy, lifecycle and collaborator traits.
//!
//! This module defines:
//! - `HalError` enum - Every failure the adapter can report to its host
//! - `LifecycleState` - Adapter lifecycle states
//! - `SystemInterface` trait - What a host drives once per control cycle
//! - `MotionChannelManager` trait - The external real-time channel owner
//! - `DescriptionProvider` trait - The external controller introspection
//! - `ChannelConfiguration` / `ChannelManagerFactory` - Channel construction

use crate::hal::config::HardwareInfo;
use crate::hal::description::{ControllerDescription, MechanicalUnitGroup};
use crate::hal::types::{CommandInterface, InterfaceKind, InterfaceRole, MotionData, StateInterface};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error types for adapter operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Generic configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Required hardware parameter is absent
    #[error("Missing hardware parameter '{0}'")]
    MissingParameter(String),

    /// Hardware parameter present but not parsable
    #[error("Invalid hardware parameter '{key}' = '{value}': {reason}")]
    InvalidParameter {
        /// Parameter key
        key: String,
        /// Raw value
        value: String,
        /// What was expected
        reason: String,
    },

    /// Joint declares the wrong number of interfaces
    #[error("Joint '{joint}' has {found} {role} interfaces. {expected} expected.")]
    InterfaceCount {
        /// Joint name
        joint: String,
        /// Command or state
        role: InterfaceRole,
        /// Declared count
        found: usize,
        /// Required count
        expected: usize,
    },

    /// Joint declares interfaces in the wrong order or of the wrong kind
    #[error("Joint '{joint}' has '{found}' as {role} interface #{index}. '{expected}' expected.")]
    InterfaceOrder {
        /// Joint name
        joint: String,
        /// Command or state
        role: InterfaceRole,
        /// Zero-based position in the declaration
        index: usize,
        /// Declared interface name
        found: String,
        /// Required kind
        expected: InterfaceKind,
    },

    /// Joint position bound missing or not a number
    #[error("Joint '{joint}': invalid {which} position bound '{value}'")]
    InvalidBound {
        /// Joint name
        joint: String,
        /// "min" or "max" (or "range" for min > max)
        which: &'static str,
        /// Raw value
        value: String,
    },

    /// No channel port configured for a mechanical unit group
    #[error("EGM port for mechanical unit group \"{group}\" not specified in hardware parameters (key '{key}')")]
    MissingGroupPort {
        /// Group name
        group: String,
        /// Expected parameter key
        key: String,
    },

    /// Remote description provider failed
    #[error("Remote description error: {0}")]
    RemoteDescription(String),

    /// Controller description is structurally inconsistent
    #[error("Invalid controller description: {0}")]
    InvalidDescription(String),

    /// Channel manager could not acquire its resources
    #[error("Failed to initialize EGM connection: {0}")]
    ChannelConstruction(String),

    /// No message observed within the connection budget
    #[error("Failed to connect to robot after {attempts} attempts")]
    ConnectionTimeout {
        /// Attempts made
        attempts: u32,
    },

    /// Activation aborted by a shutdown request
    #[error("Activation cancelled by shutdown request")]
    Cancelled,

    /// Lifecycle entry point invoked from the wrong state
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        /// Requested operation
        operation: &'static str,
        /// State the adapter was in
        state: LifecycleState,
    },

    /// Handle does not belong to the current motion data
    #[error("Unknown interface handle: {0}")]
    UnknownHandle(String),
}

impl HalError {
    /// True for errors an operator fixes by editing configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            HalError::ConfigError(_)
                | HalError::MissingParameter(_)
                | HalError::InvalidParameter { .. }
                | HalError::InterfaceCount { .. }
                | HalError::InterfaceOrder { .. }
                | HalError::InvalidBound { .. }
                | HalError::MissingGroupPort { .. }
        )
    }
}

/// Adapter lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Nothing allocated
    #[default]
    Unconfigured,
    /// Description, motion data and channel manager ready
    Initialized,
    /// First message seen, commands seeded
    Activated,
    /// Cyclic I/O in progress
    Running,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unconfigured => "unconfigured",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Activated => "activated",
            LifecycleState::Running => "running",
        };
        f.write_str(name)
    }
}

/// Trait a host drives through the lifecycle and once per control cycle.
///
/// # Lifecycle
///
/// 1. `on_init()` - validate configuration, build description, allocate channels
/// 2. `export_state_interfaces()` / `export_command_interfaces()` - hand out handles
/// 3. `on_activate()` - wait for the first message, seed commands
/// 4. `read()` / `write()` - once per control tick
/// 5. `on_deactivate()` / `shutdown()` - stop I/O, release resources
///
/// # Timing Contracts
///
/// | Operation | Max Duration | RT Constraint |
/// |-----------|--------------|---------------|
/// | `on_init()` | provider dependent | None (pre-RT) |
/// | `on_activate()` | attempts × (timeout + backoff) | None (pre-RT) |
/// | `read()` / `write()` | cycle time | **HARD** |
pub trait SystemInterface: Send {
    /// Returns the system's identifier.
    fn name(&self) -> &'static str;

    /// Current lifecycle state.
    fn lifecycle_state(&self) -> LifecycleState;

    /// Initialize from the host's hardware declaration.
    fn on_init(&mut self, info: &HardwareInfo) -> Result<(), HalError>;

    /// Read handles for every joint's measured position and velocity.
    fn export_state_interfaces(&self) -> Result<Vec<StateInterface>, HalError>;

    /// Read-write handles for every joint's commanded position and velocity.
    fn export_command_interfaces(&self) -> Result<Vec<CommandInterface>, HalError>;

    /// Connect to the controller and seed commands from measured state.
    fn on_activate(&mut self) -> Result<(), HalError>;

    /// Stop cyclic I/O, keeping configuration.
    fn on_deactivate(&mut self) -> Result<(), HalError>;

    /// Refresh measured state. A cycle without fresh data is not an error.
    fn read(&mut self, period: Duration) -> Result<(), HalError>;

    /// Transmit current commands.
    fn write(&mut self, period: Duration) -> Result<(), HalError>;

    /// Value behind a state handle.
    fn state_value(&self, handle: &StateInterface) -> Result<f64, HalError>;

    /// Value behind a command handle.
    fn command_value(&self, handle: &CommandInterface) -> Result<f64, HalError>;

    /// Store a new command value.
    fn set_command(&mut self, handle: &CommandInterface, value: f64) -> Result<(), HalError>;

    /// Release every owned resource and return to `Unconfigured`.
    fn shutdown(&mut self) -> Result<(), HalError>;
}

/// Network endpoint serving one mechanical unit group's real-time traffic.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfiguration {
    /// Local UDP port the controller streams to
    pub port: u16,
    /// Group topology served by this channel
    pub group: MechanicalUnitGroup,
}

/// Owner of the real-time sessions with the controller.
///
/// Implementations own all buffering and timeout discipline; `read` and
/// `write` must return within a small bounded time and may be partial.
pub trait MotionChannelManager: Send {
    /// Block up to `timeout` for a message on any channel.
    fn wait_for_message(&mut self, timeout: Duration) -> bool;

    /// Copy the latest measured state into `motion`.
    fn read(&mut self, motion: &mut MotionData);

    /// Send the commands held in `motion`.
    fn write(&mut self, motion: &MotionData);
}

/// Builds a channel manager from the ordered per-group configurations.
pub type ChannelManagerFactory =
    Box<dyn Fn(&[ChannelConfiguration]) -> Result<Box<dyn MotionChannelManager>, HalError> + Send>;

/// RWS server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RwsEndpoint {
    /// Controller IP or hostname
    pub address: String,
    /// HTTP port
    pub port: u16,
}

/// RWS login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub user: String,
    /// Password
    pub password: String,
}

/// Everything a description provider needs to introspect a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionRequest {
    /// Where to connect
    pub endpoint: RwsEndpoint,
    /// How to log in
    pub credentials: Credentials,
    /// Robot model used to standardize joint names
    pub robot_model: String,
    /// Keep retrying the connection instead of timing out
    pub no_connection_timeout: bool,
}

/// Remote introspection of the controller's configuration.
pub trait DescriptionProvider: Send {
    /// Fetch the full controller description.
    fn fetch_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<ControllerDescription, HalError>;
}
