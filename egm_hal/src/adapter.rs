//! EGM hardware adapter.
//!
//! `EgmSystem` implements [`SystemInterface`] on top of two collaborators:
//! a [`DescriptionProvider`] (remote controller introspection) and a
//! [`ChannelManagerFactory`] building the real-time channel owner.
//!
//! # Lifecycle
//!
//! ```text
//! Unconfigured --on_init--> Initialized --on_activate--> Activated
//!                                ^                           |
//!                                |                     read / write
//!                                +------on_deactivate--- Running
//! ```
//!
//! `shutdown` returns to `Unconfigured` from any state. Every entry point
//! called from the wrong state fails with `HalError::InvalidTransition`.

use crate::cancel::CancellationToken;
use crate::channel::configure_channels;
use crate::description::build_description;
use crate::validator::validate_joint_interfaces;
use egm_common::consts::{CONNECTION_ATTEMPTS, CONNECTION_BACKOFF, CONNECTION_WAIT_TIMEOUT};
use egm_common::hal::config::{HardwareInfo, HardwareParams};
use egm_common::hal::description::ControllerDescription;
use egm_common::hal::driver::{
    ChannelManagerFactory, DescriptionProvider, HalError, LifecycleState, MotionChannelManager,
    SystemInterface,
};
use egm_common::hal::types::{CommandInterface, MotionData, StateInterface};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Bounded retry budget used while waiting for the first message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// Number of wait attempts
    pub attempts: u32,
    /// Wait per attempt
    pub wait_timeout: Duration,
    /// Sleep between attempts that saw no message
    pub backoff: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            attempts: CONNECTION_ATTEMPTS,
            wait_timeout: CONNECTION_WAIT_TIMEOUT,
            backoff: CONNECTION_BACKOFF,
        }
    }
}

/// Resources allocated by a successful `on_init`.
struct Session {
    description: ControllerDescription,
    motion: MotionData,
    manager: Box<dyn MotionChannelManager>,
}

/// Hardware adapter for ABB controllers streaming over EGM.
pub struct EgmSystem {
    state: LifecycleState,
    provider: Box<dyn DescriptionProvider>,
    factory: ChannelManagerFactory,
    policy: ConnectionPolicy,
    cancel: CancellationToken,
    session: Option<Session>,
}

impl EgmSystem {
    /// Create an unconfigured adapter.
    pub fn new(provider: Box<dyn DescriptionProvider>, factory: ChannelManagerFactory) -> Self {
        Self {
            state: LifecycleState::Unconfigured,
            provider,
            factory,
            policy: ConnectionPolicy::default(),
            cancel: CancellationToken::new(),
            session: None,
        }
    }

    /// Replace the activation retry budget.
    pub fn with_connection_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Abort activation when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Controller description built by `on_init`, if initialized.
    pub fn description(&self) -> Option<&ControllerDescription> {
        self.session.as_ref().map(|s| &s.description)
    }

    /// Motion data mirror, if initialized.
    pub fn motion_data(&self) -> Option<&MotionData> {
        self.session.as_ref().map(|s| &s.motion)
    }

    fn guard(&self, operation: &'static str, allowed: &[LifecycleState]) -> Result<(), HalError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(HalError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    fn session(&self, operation: &'static str) -> Result<&Session, HalError> {
        self.session.as_ref().ok_or(HalError::InvalidTransition {
            operation,
            state: self.state,
        })
    }

    fn session_mut(&mut self, operation: &'static str) -> Result<&mut Session, HalError> {
        let state = self.state;
        self.session
            .as_mut()
            .ok_or(HalError::InvalidTransition { operation, state })
    }

    fn initialize(&self, info: &HardwareInfo) -> Result<Session, HalError> {
        validate_joint_interfaces(&info.joints)?;
        let params = HardwareParams::from_parameters(&info.parameters)?;

        let description = build_description(info, &params, self.provider.as_ref())?;
        info!("Robot controller description:\n{}", description);

        let motion = MotionData::from_description(&description)?;
        warn_on_unknown_joints(info, &motion);

        let configs = configure_channels(&description, &params)?;
        let manager = (self.factory)(&configs).map_err(|e| match e {
            HalError::ChannelConstruction(_) => e,
            other => HalError::ChannelConstruction(other.to_string()),
        })?;

        Ok(Session {
            description,
            motion,
            manager,
        })
    }

    /// Wait for the first message within the retry budget.
    fn connect(&mut self) -> Result<(), HalError> {
        let policy = self.policy;
        let cancel = self.cancel.clone();
        let session = self.session_mut("activate")?;

        for attempt in 1..=policy.attempts {
            if cancel.is_cancelled() {
                warn!("Activation cancelled after {} attempts", attempt - 1);
                return Err(HalError::Cancelled);
            }

            info!("Connecting to robot... (attempt {}/{})", attempt, policy.attempts);
            if session.manager.wait_for_message(policy.wait_timeout) {
                info!("Connected to robot");
                return Ok(());
            }

            if attempt < policy.attempts && !policy.backoff.is_zero() {
                std::thread::sleep(policy.backoff);
            }
        }

        Err(HalError::ConnectionTimeout {
            attempts: policy.attempts,
        })
    }

    /// Activated becomes Running on the first cyclic call.
    fn enter_running(&mut self) {
        if self.state == LifecycleState::Activated {
            debug!("First cycle, entering running state");
            self.state = LifecycleState::Running;
        }
    }
}

/// Warn about exported joint names the host did not declare.
fn warn_on_unknown_joints(info: &HardwareInfo, motion: &MotionData) {
    for joint in motion.joints() {
        let exported = joint.interface_name();
        if !info.joints.iter().any(|j| j.name == exported) {
            warn!(
                "Controller joint '{}' is exported as '{}', which is not declared by the host",
                joint.name(),
                exported
            );
        }
    }
}

const CYCLIC: &[LifecycleState] = &[LifecycleState::Activated, LifecycleState::Running];

impl SystemInterface for EgmSystem {
    fn name(&self) -> &'static str {
        "egm"
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.state
    }

    fn on_init(&mut self, info: &HardwareInfo) -> Result<(), HalError> {
        self.guard("initialize", &[LifecycleState::Unconfigured])?;
        info!("Initializing EGM hardware '{}' with {} joints", info.name, info.joints.len());

        match self.initialize(info) {
            Ok(session) => {
                self.session = Some(session);
                self.state = LifecycleState::Initialized;
                info!("EGM hardware initialized");
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize EGM hardware: {}", e);
                self.session = None;
                self.state = LifecycleState::Unconfigured;
                Err(e)
            }
        }
    }

    fn export_state_interfaces(&self) -> Result<Vec<StateInterface>, HalError> {
        Ok(self.session("export state interfaces")?.motion.state_interfaces())
    }

    fn export_command_interfaces(&self) -> Result<Vec<CommandInterface>, HalError> {
        Ok(self.session("export command interfaces")?.motion.command_interfaces())
    }

    fn on_activate(&mut self) -> Result<(), HalError> {
        self.guard("activate", &[LifecycleState::Initialized])?;

        if let Err(e) = self.connect() {
            error!("Failed to activate EGM hardware: {}", e);
            return Err(e);
        }

        let session = self.session_mut("activate")?;
        session.manager.read(&mut session.motion);
        session.motion.seed_commands_from_state();

        self.state = LifecycleState::Activated;
        info!("EGM hardware activated");
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), HalError> {
        self.guard("deactivate", CYCLIC)?;
        self.state = LifecycleState::Initialized;
        info!("EGM hardware deactivated");
        Ok(())
    }

    fn read(&mut self, _period: Duration) -> Result<(), HalError> {
        self.guard("read", CYCLIC)?;
        let session = self.session_mut("read")?;
        session.manager.read(&mut session.motion);
        self.enter_running();
        Ok(())
    }

    fn write(&mut self, _period: Duration) -> Result<(), HalError> {
        self.guard("write", CYCLIC)?;
        let session = self.session_mut("write")?;
        session.manager.write(&session.motion);
        self.enter_running();
        Ok(())
    }

    fn state_value(&self, handle: &StateInterface) -> Result<f64, HalError> {
        self.session("read state")?.motion.state_value(handle)
    }

    fn command_value(&self, handle: &CommandInterface) -> Result<f64, HalError> {
        self.session("read command")?.motion.command_value(handle)
    }

    fn set_command(&mut self, handle: &CommandInterface, value: f64) -> Result<(), HalError> {
        self.session_mut("set command")?.motion.set_command(handle, value)
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        if self.session.take().is_some() {
            info!("EGM hardware shut down, channels released");
        }
        self.state = LifecycleState::Unconfigured;
        Ok(())
    }
}
