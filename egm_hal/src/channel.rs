//! Per-group channel configuration.

use egm_common::hal::config::HardwareParams;
use egm_common::hal::description::ControllerDescription;
use egm_common::hal::driver::{ChannelConfiguration, HalError};
use tracing::{error, info};

/// Pair each mechanical unit group with its configured port, in
/// description order.
///
/// # Errors
/// `HalError::MissingGroupPort` naming the first group without a port.
pub fn configure_channels(
    description: &ControllerDescription,
    params: &HardwareParams,
) -> Result<Vec<ChannelConfiguration>, HalError> {
    description
        .mechanical_units_groups
        .iter()
        .map(|group| {
            let key = HardwareParams::egm_port_key(&group.name);
            let Some(&port) = params.egm_ports.get(&group.name) else {
                let err = HalError::MissingGroupPort {
                    group: group.name.clone(),
                    key,
                };
                error!("{}", err);
                return Err(err);
            };

            info!(
                "Configuring EGM for mechanical unit group '{}' on port {}",
                group.name, port
            );
            Ok(ChannelConfiguration {
                port,
                group: group.clone(),
            })
        })
        .collect()
}
