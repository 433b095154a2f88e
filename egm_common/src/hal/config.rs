//! Hardware declaration and typed hardware parameters.
//!
//! This module contains:
//! - `HardwareInfo` - The host's declaration of the hardware (joints + parameters)
//! - `ComponentInfo` / `InterfaceInfo` - Per-joint interface declarations
//! - `HardwareParams` - Typed view of the string-keyed parameter map
//!
//! Parameters arrive as strings, the way a hosting framework hands them over.
//! [`HardwareParams::from_parameters`] is the only place they are interpreted:
//! every recognized key, its type and its default is listed here.

use crate::consts::{
    DEFAULT_ROBOT_MODEL, DEFAULT_RWS_PASSWORD, DEFAULT_RWS_USER, EGM_PORT_SUFFIX, RWS_IP_UNSET,
};
use crate::hal::driver::{Credentials, HalError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Key selecting remote (RWS) or local description building.
pub const PARAM_CONFIGURE_VIA_RWS: &str = "configure_via_rws";
/// Key of the RWS address.
pub const PARAM_RWS_IP: &str = "rws_ip";
/// Key of the RWS port.
pub const PARAM_RWS_PORT: &str = "rws_port";
/// Key of the RWS user.
pub const PARAM_RWS_USER: &str = "rws_user";
/// Key of the RWS password.
pub const PARAM_RWS_PASSWORD: &str = "rws_password";
/// Key of the robot model.
pub const PARAM_ROBOT_MODEL: &str = "robot_model";
/// Per-joint key selecting revolute or prismatic motion.
pub const JOINT_PARAM_TYPE: &str = "type";

/// Host declaration of the hardware.
///
/// # TOML Example
///
/// ```toml
/// name = "irb1200"
///
/// [parameters]
/// configure_via_rws = "false"
/// egm_port = "6511"
///
/// [[joints]]
/// name = "joint_1"
/// command_interfaces = [
///     { name = "position", min = "-2.87", max = "2.87" },
///     { name = "velocity" },
/// ]
/// state_interfaces = [{ name = "position" }, { name = "velocity" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HardwareInfo {
    /// Hardware component name
    #[serde(default)]
    pub name: String,

    /// String-keyed hardware parameters
    #[serde(default)]
    pub parameters: HashMap<String, String>,

    /// Joints in declaration order
    #[serde(default)]
    pub joints: Vec<ComponentInfo>,
}

/// Declaration of one joint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentInfo {
    /// Joint name as used by the host
    pub name: String,

    /// Component type reported by the host (informational)
    #[serde(default = "default_component_type")]
    pub component_type: String,

    /// Per-joint parameters (e.g. `type = "prismatic"`)
    #[serde(default)]
    pub parameters: HashMap<String, String>,

    /// Command interfaces in declaration order
    #[serde(default)]
    pub command_interfaces: Vec<InterfaceInfo>,

    /// State interfaces in declaration order
    #[serde(default)]
    pub state_interfaces: Vec<InterfaceInfo>,
}

fn default_component_type() -> String {
    "joint".to_string()
}

/// Declaration of one interface.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InterfaceInfo {
    /// Interface name (`position`, `velocity`, ...)
    pub name: String,

    /// Lower limit, unparsed
    #[serde(default)]
    pub min: Option<String>,

    /// Upper limit, unparsed
    #[serde(default)]
    pub max: Option<String>,
}

/// RWS connection settings for remote description building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RwsSettings {
    /// Controller address, `None` when unset or given as the `None` sentinel
    pub ip: Option<String>,
    /// HTTP port, required once the address is used
    pub port: Option<u16>,
    /// Login
    pub credentials: Credentials,
    /// Robot model passed to the provider
    pub robot_model: String,
}

/// Typed view of [`HardwareInfo::parameters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareParams {
    /// Build the description via RWS (default) or from the joint declaration
    pub configure_via_rws: bool,
    /// RWS connection settings
    pub rws: RwsSettings,
    /// Channel port per mechanical unit group name
    pub egm_ports: BTreeMap<String, u16>,
}

impl HardwareParams {
    /// Interpret the string-keyed parameter map.
    ///
    /// | key | type | default |
    /// |-----|------|---------|
    /// | `configure_via_rws` | bool | `true` |
    /// | `rws_ip` | string, `None` = unset | unset |
    /// | `rws_port` | u16, remote mode only | unset |
    /// | `rws_user` | string | `Default User` |
    /// | `rws_password` | string | `robotics` |
    /// | `robot_model` | string | `IRB1200` |
    /// | `<group>egm_port` | u16, non-zero | none |
    ///
    /// Unrecognized keys are logged and ignored.
    ///
    /// # Errors
    /// `HalError::InvalidParameter` for a value of the wrong type.
    pub fn from_parameters(parameters: &HashMap<String, String>) -> Result<Self, HalError> {
        let get = |key: &str| parameters.get(key).map(|v| v.trim());

        let configure_via_rws = match get(PARAM_CONFIGURE_VIA_RWS) {
            None => true,
            Some(v) => parse_bool(PARAM_CONFIGURE_VIA_RWS, v)?,
        };

        let ip = get(PARAM_RWS_IP)
            .filter(|v| !v.is_empty() && *v != RWS_IP_UNSET)
            .map(str::to_string);

        // Only parsed in remote mode.
        let port = match get(PARAM_RWS_PORT) {
            Some(v) if configure_via_rws => Some(parse_port(PARAM_RWS_PORT, v)?),
            _ => None,
        };

        let rws = RwsSettings {
            ip,
            port,
            credentials: Credentials {
                user: get(PARAM_RWS_USER).unwrap_or(DEFAULT_RWS_USER).to_string(),
                password: get(PARAM_RWS_PASSWORD)
                    .unwrap_or(DEFAULT_RWS_PASSWORD)
                    .to_string(),
            },
            robot_model: get(PARAM_ROBOT_MODEL)
                .unwrap_or(DEFAULT_ROBOT_MODEL)
                .to_string(),
        };

        let mut egm_ports = BTreeMap::new();
        for (key, value) in parameters {
            if let Some(group) = key.strip_suffix(EGM_PORT_SUFFIX) {
                egm_ports.insert(group.to_string(), parse_port(key, value.trim())?);
            } else if !is_recognized(key) {
                warn!("Ignoring unrecognized hardware parameter '{}'", key);
            }
        }

        Ok(Self {
            configure_via_rws,
            rws,
            egm_ports,
        })
    }

    /// Parameter key carrying the channel port of `group`.
    pub fn egm_port_key(group: &str) -> String {
        format!("{group}{EGM_PORT_SUFFIX}")
    }
}

fn is_recognized(key: &str) -> bool {
    matches!(
        key,
        PARAM_CONFIGURE_VIA_RWS
            | PARAM_RWS_IP
            | PARAM_RWS_PORT
            | PARAM_RWS_USER
            | PARAM_RWS_PASSWORD
            | PARAM_ROBOT_MODEL
    )
}

fn parse_bool(key: &str, value: &str) -> Result<bool, HalError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(HalError::InvalidParameter {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        })
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, HalError> {
    match value.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(HalError::InvalidParameter {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a port number in 1..=65535".to_string(),
        }),
    }
}
