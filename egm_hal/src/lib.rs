//! # EGM HAL Library
//!
//! Hardware adapter bridging per-joint position/velocity interfaces to the
//! real-time motion channels of an ABB robot controller (EGM), with the
//! controller description taken from remote introspection (RWS) or
//! synthesized from the local joint declaration.
//!
//! # Module Structure
//!
//! - [`validator`] - Per-joint interface shape checks
//! - [`description`] - Controller description building (remote / local)
//! - [`channel`] - Per-group channel configuration
//! - [`adapter`] - `EgmSystem`, the lifecycle state machine
//! - [`cancel`] - Cooperative shutdown token
//! - [`core`] - `HalCore`, the fixed-rate host loop
//! - [`drivers`] - Collaborator backends (simulation)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          egm_hal                                  │
//! │  ┌─────────────┐    ┌──────────────┐    ┌──────────────────────┐  │
//! │  │  HalCore    │───►│  EgmSystem   │───►│ DescriptionProvider  │  │
//! │  │ (host loop) │    │ (lifecycle)  │    │ (RWS / snapshot)     │  │
//! │  └─────────────┘    └──────┬───────┘    └──────────────────────┘  │
//! │                            │                                      │
//! │                            ▼                                      │
//! │                 ┌──────────────────────┐                          │
//! │                 │ MotionChannelManager │ (trait object)           │
//! │                 └──────────────────────┘                          │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod adapter;
pub mod cancel;
pub mod channel;
pub mod core;
pub mod description;
pub mod drivers;
pub mod validator;

// Re-export key types for convenience
pub use crate::adapter::{ConnectionPolicy, EgmSystem};
pub use crate::cancel::CancellationToken;
pub use crate::core::{HalCore, HostConfig, InterfaceSet, TimingStats};
