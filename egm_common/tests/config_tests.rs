//! Hardware declaration loading tests.
//!
//! Tests that a hardware TOML file deserializes into `HardwareInfo` with
//! joint order, interface order, bounds and parameters preserved, and that
//! the typed parameter layer accepts what a real cell file contains.

use egm_common::config::{ConfigError, ConfigLoader};
use egm_common::hal::config::{HardwareInfo, HardwareParams};
use std::fs;
use tempfile::TempDir;

const CELL_TOML: &str = r#"
name = "irb1200_cell"

[parameters]
configure_via_rws = "False"
rws_ip = "None"
egm_port = "6511"

[[joints]]
name = "joint_1"
command_interfaces = [
    { name = "position", min = "-2.87", max = "2.87" },
    { name = "velocity" },
]
state_interfaces = [{ name = "position" }, { name = "velocity" }]

[[joints]]
name = "joint_2"
parameters = { type = "prismatic" }
command_interfaces = [
    { name = "position", min = "0.0", max = "1.2" },
    { name = "velocity" },
]
state_interfaces = [{ name = "position" }, { name = "velocity" }]
"#;

#[test]
fn test_hardware_info_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hardware.toml");
    fs::write(&path, CELL_TOML).unwrap();

    let info = HardwareInfo::load(&path).unwrap();
    assert_eq!(info.name, "irb1200_cell");
    assert_eq!(info.joints.len(), 2);
    assert_eq!(info.joints[0].name, "joint_1");
    assert_eq!(info.joints[0].component_type, "joint");
    assert_eq!(info.joints[0].command_interfaces[0].name, "position");
    assert_eq!(info.joints[0].command_interfaces[0].min.as_deref(), Some("-2.87"));
    assert_eq!(info.joints[0].command_interfaces[1].min, None);
    assert_eq!(
        info.joints[1].parameters.get("type").map(String::as_str),
        Some("prismatic")
    );
}

#[test]
fn test_cell_parameters_are_typed() {
    let info = HardwareInfo::from_toml(CELL_TOML).unwrap();
    let params = HardwareParams::from_parameters(&info.parameters).unwrap();

    assert!(!params.configure_via_rws);
    assert_eq!(params.rws.ip, None);
    assert_eq!(params.egm_ports.len(), 1);
    assert_eq!(params.egm_ports[""], 6511);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let result = HardwareInfo::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn test_joint_without_name_is_rejected() {
    let result = HardwareInfo::from_toml(
        r#"
[[joints]]
command_interfaces = [{ name = "position" }]
"#,
    );
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}
