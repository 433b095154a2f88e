//! Interface shape validation.
//!
//! Every declared joint must expose exactly `[position, velocity]` as
//! command interfaces and the same list as state interfaces, in that order.
//! The first violation aborts initialization.

use egm_common::hal::config::{ComponentInfo, InterfaceInfo};
use egm_common::hal::driver::HalError;
use egm_common::hal::types::{InterfaceKind, InterfaceRole};
use tracing::error;

/// Interface layout every joint must declare.
pub const EXPECTED_INTERFACES: [InterfaceKind; 2] = [InterfaceKind::Position, InterfaceKind::Velocity];

/// Check the interface declaration of every joint.
///
/// # Errors
/// `HalError::InterfaceCount` or `HalError::InterfaceOrder` naming the joint.
pub fn validate_joint_interfaces(joints: &[ComponentInfo]) -> Result<(), HalError> {
    for joint in joints {
        check_interfaces(&joint.name, InterfaceRole::Command, &joint.command_interfaces)
            .and_then(|_| check_interfaces(&joint.name, InterfaceRole::State, &joint.state_interfaces))
            .inspect_err(|e| error!("{}", e))?;
    }
    Ok(())
}

fn check_interfaces(
    joint: &str,
    role: InterfaceRole,
    interfaces: &[InterfaceInfo],
) -> Result<(), HalError> {
    if interfaces.len() != EXPECTED_INTERFACES.len() {
        return Err(HalError::InterfaceCount {
            joint: joint.to_string(),
            role,
            found: interfaces.len(),
            expected: EXPECTED_INTERFACES.len(),
        });
    }

    for (index, (interface, expected)) in interfaces.iter().zip(EXPECTED_INTERFACES).enumerate() {
        if interface.name != expected.as_str() {
            return Err(HalError::InterfaceOrder {
                joint: joint.to_string(),
                role,
                index,
                found: interface.name.clone(),
                expected,
            });
        }
    }

    Ok(())
}
