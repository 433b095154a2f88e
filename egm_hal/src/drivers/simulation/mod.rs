//! Simulation backend.
//!
//! Stands in for the controller side: a channel manager that servos ideally
//! to the last command, and a description provider reading a snapshot file.

mod manager;
mod provider;

pub use manager::SimulatedChannelManager;
pub use provider::SnapshotDescriptionProvider;

use egm_common::hal::driver::{ChannelConfiguration, ChannelManagerFactory, HalError, MotionChannelManager};

/// Factory function building a simulated channel manager.
pub fn create_manager(
    configs: &[ChannelConfiguration],
) -> Result<Box<dyn MotionChannelManager>, HalError> {
    Ok(Box::new(SimulatedChannelManager::new(configs)?))
}

/// Boxed [`create_manager`], ready to hand to the adapter.
pub fn manager_factory() -> ChannelManagerFactory {
    Box::new(create_manager)
}
