//! Canonical robot controller description.
//!
//! A versioned, hierarchical view of the controller: header, system
//! capability flags and an ordered list of mechanical unit groups. Produced
//! either by a remote description provider or synthesized from the local
//! joint declaration; its group → unit → joint order is the canonical joint
//! ordering used everywhere downstream.

use crate::hal::driver::HalError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Full controller description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ControllerDescription {
    /// Controller software version
    #[serde(default)]
    pub header: Header,
    /// Installed options
    #[serde(default)]
    pub system_indicators: SystemIndicators,
    /// Groups in canonical order
    #[serde(default)]
    pub mechanical_units_groups: Vec<MechanicalUnitGroup>,
}

/// Description header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Header {
    /// RobotWare version of the controller
    pub robot_ware_version: RobotWareVersion,
}

/// Semantic RobotWare version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RobotWareVersion {
    /// Major number
    pub major: u32,
    /// Minor number
    pub minor: u32,
    /// Patch number
    pub patch: u32,
}

bitflags! {
    /// Controller options relevant to motion streaming.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SystemOptions: u32 {
        /// Externally Guided Motion
        const EGM = 1 << 0;
        /// Several coordinated mechanical units
        const MULTI_MOVE = 1 << 1;
        /// Robot Web Services
        const RWS = 1 << 2;
    }
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Capability flags of the controller system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SystemIndicators {
    /// Installed options
    #[serde(default)]
    pub options: SystemOptions,
}

/// Named collection of units sharing one real-time channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MechanicalUnitGroup {
    /// Unique within the description; empty for single-group systems
    #[serde(default)]
    pub name: String,
    /// Units in canonical order
    #[serde(default)]
    pub units: Vec<MechanicalUnit>,
}

impl MechanicalUnitGroup {
    /// Joints of all units, in canonical order.
    pub fn joints(&self) -> impl Iterator<Item = &StandardizedJoint> {
        self.units.iter().flat_map(|u| u.standardized_joints.iter())
    }
}

/// Kind of mechanical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Robot with a tool center point
    #[default]
    TcpRobot,
    /// Robot without a tool center point
    Robot,
    /// Single external axis unit
    Single,
}

/// Activation mode of a mechanical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitMode {
    /// Unit participates in motion
    #[default]
    Activated,
    /// Unit is deactivated on the controller
    Deactivated,
}

/// One controllable kinematic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MechanicalUnit {
    /// Controller-side unit name (e.g. ROB_1)
    #[serde(default)]
    pub name: String,
    /// Unit kind
    #[serde(default)]
    pub unit_type: UnitType,
    /// Activation mode
    #[serde(default)]
    pub mode: UnitMode,
    /// Total number of axes
    pub axes_total: u32,
    /// Joints in canonical order
    #[serde(default)]
    pub standardized_joints: Vec<StandardizedJoint>,
}

/// Canonical per-joint descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedJoint {
    /// Controller-side joint name
    pub standardized_name: String,
    /// Lower position bound (rad or m)
    pub lower_joint_bound: f64,
    /// Upper position bound (rad or m)
    pub upper_joint_bound: f64,
    /// True for revolute joints, false for linear ones
    pub rotating_move: bool,
}

impl ControllerDescription {
    /// Check structural consistency.
    ///
    /// # Validation Rules
    /// 1. At least one mechanical unit group
    /// 2. Group names unique
    /// 3. At least one unit per group
    /// 4. `axes_total` equals the number of standardized joints of the unit
    /// 5. At least one joint overall
    pub fn validate(&self) -> Result<(), HalError> {
        if self.mechanical_units_groups.is_empty() {
            return Err(HalError::InvalidDescription(
                "no mechanical unit groups".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for group in &self.mechanical_units_groups {
            if !names.insert(group.name.as_str()) {
                return Err(HalError::InvalidDescription(format!(
                    "duplicate mechanical unit group \"{}\"",
                    group.name
                )));
            }

            if group.units.is_empty() {
                return Err(HalError::InvalidDescription(format!(
                    "mechanical unit group \"{}\" has no units",
                    group.name
                )));
            }

            for unit in &group.units {
                if unit.axes_total as usize != unit.standardized_joints.len() {
                    return Err(HalError::InvalidDescription(format!(
                        "unit '{}' in group \"{}\" reports {} axes but describes {} joints",
                        unit.name,
                        group.name,
                        unit.axes_total,
                        unit.standardized_joints.len()
                    )));
                }
            }
        }

        if self.joint_count() == 0 {
            return Err(HalError::InvalidDescription(
                "description contains no joints".to_string(),
            ));
        }

        Ok(())
    }

    /// Total number of standardized joints across all groups and units.
    pub fn joint_count(&self) -> usize {
        self.mechanical_units_groups
            .iter()
            .map(|g| g.joints().count())
            .sum()
    }
}

impl fmt::Display for ControllerDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.header.robot_ware_version;
        writeln!(f, "RobotWare: {}.{}.{}", v.major, v.minor, v.patch)?;
        writeln!(f, "Options: {:?}", self.system_indicators.options)?;
        for group in &self.mechanical_units_groups {
            writeln!(f, "Mechanical unit group \"{}\":", group.name)?;
            for unit in &group.units {
                writeln!(
                    f,
                    "  Unit '{}' ({:?}, {:?}, {} axes):",
                    unit.name, unit.unit_type, unit.mode, unit.axes_total
                )?;
                for joint in &unit.standardized_joints {
                    writeln!(
                        f,
                        "    {} [{:.3}, {:.3}] {}",
                        joint.standardized_name,
                        joint.lower_joint_bound,
                        joint.upper_joint_bound,
                        if joint.rotating_move { "rotating" } else { "linear" }
                    )?;
                }
            }
        }
        Ok(())
    }
}
