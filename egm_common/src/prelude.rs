//! Prelude module for common re-exports.
//!
//! ```rust
//! use egm_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::hal::config::{ComponentInfo, HardwareInfo, HardwareParams, InterfaceInfo};

// ─── Controller description ─────────────────────────────────────────
pub use crate::hal::description::{
    ControllerDescription, MechanicalUnit, MechanicalUnitGroup, StandardizedJoint,
};

// ─── Lifecycle & collaborators ──────────────────────────────────────
pub use crate::hal::driver::{
    ChannelConfiguration, ChannelManagerFactory, DescriptionProvider, DescriptionRequest,
    HalError, LifecycleState, MotionChannelManager, SystemInterface,
};

// ─── Motion data ────────────────────────────────────────────────────
pub use crate::hal::types::{CommandInterface, InterfaceKind, MotionData, StateInterface};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CONNECTION_ATTEMPTS, DEFAULT_CYCLE_TIME_US};
