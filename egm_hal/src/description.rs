//! Controller description building.
//!
//! Two mutually exclusive modes, selected by `configure_via_rws`:
//! - remote: ask a [`DescriptionProvider`] to introspect the controller
//! - local: synthesize a single-group, single-robot description from the
//!   joint declaration (axis count, bounds, revolute/prismatic flag)
//!
//! Both outputs pass [`ControllerDescription::validate`] before use.

use egm_common::consts::{LOCAL_ROBOT_UNIT_NAME, LOCAL_ROBOT_WARE_VERSION};
use egm_common::hal::config::{ComponentInfo, HardwareInfo, HardwareParams, JOINT_PARAM_TYPE};
use egm_common::hal::description::{
    ControllerDescription, Header, MechanicalUnit, MechanicalUnitGroup, RobotWareVersion,
    StandardizedJoint, SystemIndicators, SystemOptions, UnitMode, UnitType,
};
use egm_common::hal::driver::{DescriptionProvider, DescriptionRequest, HalError, RwsEndpoint};
use egm_common::hal::types::InterfaceKind;
use tracing::{error, info, warn};

/// Joint `type` value marking a linear joint.
pub const PRISMATIC_MARKER: &str = "prismatic";

/// Joint `type` value marking a revolute joint.
pub const REVOLUTE_MARKER: &str = "revolute";

/// Build the controller description in the mode selected by `params`.
///
/// # Errors
/// - `HalError::ConfigError` / `MissingParameter` if RWS is selected but not configured
/// - `HalError::RemoteDescription` if the provider fails
/// - `HalError::InvalidBound` if a local joint bound does not parse
/// - `HalError::InvalidDescription` if the result is inconsistent
pub fn build_description(
    info: &HardwareInfo,
    params: &HardwareParams,
    provider: &dyn DescriptionProvider,
) -> Result<ControllerDescription, HalError> {
    let description = if params.configure_via_rws {
        info!("Generating robot controller description from RWS");
        let request = description_request(params)?;
        provider.fetch_description(&request).map_err(|e| match e {
            HalError::RemoteDescription(_) => e,
            other => HalError::RemoteDescription(other.to_string()),
        })?
    } else {
        info!("Generating robot controller description from hardware info");
        synthesize_local(&info.joints)?
    };

    description.validate()?;
    Ok(description)
}

/// Assemble the provider request from the RWS parameters.
pub fn description_request(params: &HardwareParams) -> Result<DescriptionRequest, HalError> {
    let Some(address) = params.rws.ip.clone() else {
        error!("RWS IP not specified");
        return Err(HalError::ConfigError("RWS IP not specified".to_string()));
    };
    let port = params
        .rws
        .port
        .ok_or_else(|| HalError::MissingParameter("rws_port".to_string()))?;

    Ok(DescriptionRequest {
        endpoint: RwsEndpoint { address, port },
        credentials: params.rws.credentials.clone(),
        robot_model: params.rws.robot_model.clone(),
        no_connection_timeout: true,
    })
}

/// Synthesize a description from the joint declaration.
///
/// One unnamed group holding one activated TCP robot whose joints follow
/// declaration order.
pub fn synthesize_local(joints: &[ComponentInfo]) -> Result<ControllerDescription, HalError> {
    let standardized_joints = joints
        .iter()
        .map(standardize_joint)
        .collect::<Result<Vec<_>, _>>()?;

    let (major, minor, patch) = LOCAL_ROBOT_WARE_VERSION;

    Ok(ControllerDescription {
        header: Header {
            robot_ware_version: RobotWareVersion { major, minor, patch },
        },
        system_indicators: SystemIndicators {
            options: SystemOptions::EGM,
        },
        mechanical_units_groups: vec![MechanicalUnitGroup {
            name: String::new(),
            units: vec![MechanicalUnit {
                name: LOCAL_ROBOT_UNIT_NAME.to_string(),
                unit_type: UnitType::TcpRobot,
                mode: UnitMode::Activated,
                axes_total: standardized_joints.len() as u32,
                standardized_joints,
            }],
        }],
    })
}

fn standardize_joint(joint: &ComponentInfo) -> Result<StandardizedJoint, HalError> {
    let rotating_move = is_revolute(joint);
    let (min, max) = position_bounds(joint)?;

    info!(
        "Configured component {} of type {} with range [{:.3}, {:.3}]",
        joint.name, joint.component_type, min, max
    );

    Ok(StandardizedJoint {
        standardized_name: joint.name.clone(),
        lower_joint_bound: min,
        upper_joint_bound: max,
        rotating_move,
    })
}

/// Revolute when the joint's `type` parameter is absent or `revolute`,
/// linear for any other value.
fn is_revolute(joint: &ComponentInfo) -> bool {
    match joint.parameters.get(JOINT_PARAM_TYPE).map(|t| t.trim()) {
        None | Some(REVOLUTE_MARKER) => true,
        Some(PRISMATIC_MARKER) => false,
        Some(other) => {
            warn!(
                "Joint '{}' has type '{}', treating it as linear",
                joint.name, other
            );
            false
        }
    }
}

/// Bounds of the joint's position command interface.
fn position_bounds(joint: &ComponentInfo) -> Result<(f64, f64), HalError> {
    let interface = joint
        .command_interfaces
        .iter()
        .find(|i| i.name == InterfaceKind::Position.as_str())
        .ok_or_else(|| HalError::ConfigError(format!(
            "Joint '{}' has no position command interface",
            joint.name
        )))?;

    let parse = |which: &'static str, raw: &Option<String>| {
        raw.as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| HalError::InvalidBound {
                joint: joint.name.clone(),
                which,
                value: raw.clone().unwrap_or_default(),
            })
    };

    let min = parse("min", &interface.min)?;
    let max = parse("max", &interface.max)?;
    if min > max {
        return Err(HalError::InvalidBound {
            joint: joint.name.clone(),
            which: "range",
            value: format!("[{min}, {max}]"),
        });
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use egm_common::hal::config::InterfaceInfo;
    use egm_common::hal::driver::Credentials;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    fn joint(name: &str, min: &str, max: &str) -> ComponentInfo {
        ComponentInfo {
            name: name.to_string(),
            component_type: "joint".to_string(),
            parameters: HashMap::new(),
            command_interfaces: vec![
                InterfaceInfo {
                    name: "position".to_string(),
                    min: Some(min.to_string()),
                    max: Some(max.to_string()),
                },
                InterfaceInfo {
                    name: "velocity".to_string(),
                    ..Default::default()
                },
            ],
            state_interfaces: Vec::new(),
        }
    }

    fn local_params() -> HardwareParams {
        HardwareParams::from_parameters(&HashMap::from([(
            "configure_via_rws".to_string(),
            "false".to_string(),
        )]))
        .unwrap()
    }

    fn remote_params(ip: Option<&str>, port: Option<u16>) -> HardwareParams {
        HardwareParams {
            configure_via_rws: true,
            rws: egm_common::hal::config::RwsSettings {
                ip: ip.map(str::to_string),
                port,
                credentials: Credentials {
                    user: "Default User".to_string(),
                    password: "robotics".to_string(),
                },
                robot_model: "IRB1200".to_string(),
            },
            egm_ports: BTreeMap::new(),
        }
    }

    /// Records requests and replays a fixed answer.
    struct RecordingProvider {
        answer: Result<ControllerDescription, HalError>,
        requests: Mutex<Vec<DescriptionRequest>>,
    }

    impl DescriptionProvider for RecordingProvider {
        fn fetch_description(
            &self,
            request: &DescriptionRequest,
        ) -> Result<ControllerDescription, HalError> {
            self.requests.lock().unwrap().push(request.clone());
            self.answer.clone()
        }
    }

    fn provider(answer: Result<ControllerDescription, HalError>) -> RecordingProvider {
        RecordingProvider {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_single_joint_example() {
        let d = synthesize_local(&[joint("joint_1", "-3.14", "3.14")]).unwrap();
        assert!(d.validate().is_ok());
        assert_eq!(d.mechanical_units_groups.len(), 1);
        let group = &d.mechanical_units_groups[0];
        assert_eq!(group.name, "");
        assert_eq!(group.units.len(), 1);
        let unit = &group.units[0];
        assert_eq!(unit.unit_type, UnitType::TcpRobot);
        assert_eq!(unit.mode, UnitMode::Activated);
        assert_eq!(unit.axes_total, 1);
        let j = &unit.standardized_joints[0];
        assert_eq!(j.standardized_name, "joint_1");
        assert_eq!(j.lower_joint_bound, -3.14);
        assert_eq!(j.upper_joint_bound, 3.14);
        assert!(j.rotating_move);
        assert!(d.system_indicators.options.contains(SystemOptions::EGM));
        assert_eq!(d.header.robot_ware_version.major, 7);
    }

    #[test]
    fn test_local_is_deterministic_and_ordered() {
        let joints: Vec<_> = (1..=6)
            .map(|i| joint(&format!("joint_{i}"), &format!("-{i}.5"), &format!("{i}.5")))
            .collect();
        let a = synthesize_local(&joints).unwrap();
        let b = synthesize_local(&joints).unwrap();
        assert_eq!(a, b);

        let unit = &a.mechanical_units_groups[0].units[0];
        assert_eq!(unit.axes_total, 6);
        for (i, j) in unit.standardized_joints.iter().enumerate() {
            assert_eq!(j.standardized_name, format!("joint_{}", i + 1));
            assert_eq!(j.upper_joint_bound, i as f64 + 1.5);
            assert_eq!(j.lower_joint_bound, -(i as f64 + 1.5));
        }
    }

    #[test]
    fn test_joint_type_marker() {
        let mut linear = joint("joint_7", "0.0", "2.0");
        linear.parameters.insert("type".into(), "prismatic".into());
        let mut revolute = joint("joint_1", "-1", "1");
        revolute.parameters.insert("type".into(), "revolute".into());
        let mut fixed = joint("joint_2", "-1", "1");
        fixed.parameters.insert("type".into(), "fixed".into());
        let mut capitalized = joint("joint_3", "-1", "1");
        capitalized.parameters.insert("type".into(), "Prismatic".into());
        let untyped = joint("joint_4", "-1", "1");

        let d = synthesize_local(&[linear, revolute, fixed, capitalized, untyped]).unwrap();
        let flags: Vec<_> = d.mechanical_units_groups[0].units[0]
            .standardized_joints
            .iter()
            .map(|j| j.rotating_move)
            .collect();
        assert_eq!(flags, [false, true, false, false, true]);
    }

    #[test]
    fn test_unparsable_bound_is_fatal() {
        let err = synthesize_local(&[joint("joint_3", "-1.0", "abc")]).unwrap_err();
        match err {
            HalError::InvalidBound { joint, which, value } => {
                assert_eq!(joint, "joint_3");
                assert_eq!(which, "max");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut missing = joint("joint_4", "-1.0", "1.0");
        missing.command_interfaces[0].min = None;
        assert!(matches!(
            synthesize_local(&[missing]),
            Err(HalError::InvalidBound { which: "min", .. })
        ));

        assert!(matches!(
            synthesize_local(&[joint("joint_5", "2.0", "1.0")]),
            Err(HalError::InvalidBound { which: "range", .. })
        ));
    }

    #[test]
    fn test_local_mode_without_joints_is_invalid() {
        let info = HardwareInfo::default();
        let p = provider(Err(HalError::RemoteDescription("unused".into())));
        assert!(matches!(
            build_description(&info, &local_params(), &p),
            Err(HalError::InvalidDescription(_))
        ));
        assert!(p.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_requires_address() {
        let p = provider(Ok(synthesize_local(&[joint("joint_1", "-1", "1")]).unwrap()));
        let info = HardwareInfo::default();

        let err = build_description(&info, &remote_params(None, Some(80)), &p).unwrap_err();
        assert!(err.is_configuration_error());

        let err = build_description(&info, &remote_params(Some("10.0.0.2"), None), &p).unwrap_err();
        assert!(matches!(err, HalError::MissingParameter(key) if key == "rws_port"));
        assert!(p.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_forwards_request() {
        let expected = synthesize_local(&[joint("joint_1", "-1", "1")]).unwrap();
        let p = provider(Ok(expected.clone()));
        let d = build_description(
            &HardwareInfo::default(),
            &remote_params(Some("192.168.125.1"), Some(80)),
            &p,
        )
        .unwrap();
        assert_eq!(d, expected);

        let requests = p.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].endpoint.address, "192.168.125.1");
        assert_eq!(requests[0].endpoint.port, 80);
        assert_eq!(requests[0].robot_model, "IRB1200");
        assert!(requests[0].no_connection_timeout);
    }

    #[test]
    fn test_remote_failure_is_remote_error() {
        let p = provider(Err(HalError::ConfigError("login refused".into())));
        let err = build_description(
            &HardwareInfo::default(),
            &remote_params(Some("192.168.125.1"), Some(80)),
            &p,
        )
        .unwrap_err();
        assert!(matches!(err, HalError::RemoteDescription(msg) if msg.contains("login refused")));
    }

    #[test]
    fn test_remote_invalid_description_is_rejected() {
        let p = provider(Ok(ControllerDescription::default()));
        let err = build_description(
            &HardwareInfo::default(),
            &remote_params(Some("192.168.125.1"), Some(80)),
            &p,
        )
        .unwrap_err();
        assert!(matches!(err, HalError::InvalidDescription(_)));
    }
}
