//! Collaborator backends.
//!
//! This module contains implementations of the adapter's external
//! collaborators:
//!
//! - [`simulation`] - Ideal-servo channel manager and snapshot description
//!   provider for development and testing without a controller
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `MotionChannelManager` and/or `DescriptionProvider` from
//!    `egm_common::hal::driver`
//! 3. Expose a factory function matching `ChannelManagerFactory`

pub mod simulation;
