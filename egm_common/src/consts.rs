//! System-wide constants for the EGM workspace.
//!
//! Single source of truth for connection budgets, parameter keys and
//! defaults. Imported by all crates, never duplicated.

use static_assertions::const_assert;
use std::time::Duration;

/// Canonical service name (used for logging).
pub const HAL_SERVICE_NAME: &str = "egm_hal";

/// Default host cycle time in microseconds (250 Hz, the EGM update rate).
pub const DEFAULT_CYCLE_TIME_US: u32 = 4000;

/// Number of wait-for-message attempts made during activation.
pub const CONNECTION_ATTEMPTS: u32 = 100;

/// Time each activation attempt waits for an inbound message.
pub const CONNECTION_WAIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Sleep between activation attempts that saw no message.
pub const CONNECTION_BACKOFF: Duration = Duration::from_millis(500);

/// Suffix appended to a mechanical unit group name to form its port key.
pub const EGM_PORT_SUFFIX: &str = "egm_port";

/// Sentinel value meaning "RWS address not configured".
pub const RWS_IP_UNSET: &str = "None";

/// Default RWS user.
pub const DEFAULT_RWS_USER: &str = "Default User";

/// Default RWS password.
pub const DEFAULT_RWS_PASSWORD: &str = "robotics";

/// Default robot model passed to the description provider.
pub const DEFAULT_ROBOT_MODEL: &str = "IRB1200";

/// Literal marking where exported joint names begin.
pub const JOINT_NAME_MARKER: &str = "joint";

/// Name of the synthesized robot unit in local mode.
pub const LOCAL_ROBOT_UNIT_NAME: &str = "ROB_1";

/// RobotWare version reported for locally synthesized descriptions
/// (OmniCore controllers run RobotWare >= 7.0.0).
pub const LOCAL_ROBOT_WARE_VERSION: (u32, u32, u32) = (7, 3, 2);

const_assert!(CONNECTION_ATTEMPTS > 0);
const_assert!(DEFAULT_CYCLE_TIME_US > 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_budget_matches_controller_handshake() {
        assert_eq!(CONNECTION_ATTEMPTS, 100);
        assert_eq!(CONNECTION_WAIT_TIMEOUT, Duration::from_millis(500));
        assert_eq!(CONNECTION_BACKOFF, Duration::from_millis(500));
    }

    #[test]
    fn local_version_is_omnicore() {
        assert!(LOCAL_ROBOT_WARE_VERSION.0 >= 7);
    }
}
