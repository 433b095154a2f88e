//! Motion data mirror and interface handles.
//!
//! This module defines the runtime data exchanged each control cycle:
//! - `MotionData` - Groups → units → joints, allocated once from a description
//! - `JointMotion` / `JointValues` - Per-joint command and measured state
//! - `StateInterface` / `CommandInterface` - Handles bound to a stable slot
//! - `InterfaceKind` / `InterfaceRole` - Interface naming

use crate::consts::JOINT_NAME_MARKER;
use crate::hal::description::ControllerDescription;
use crate::hal::driver::HalError;
use std::fmt;

/// Kind of value an interface exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    /// Joint position (rad or m)
    Position,
    /// Joint velocity (rad/s or m/s)
    Velocity,
}

impl InterfaceKind {
    /// Canonical interface name.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceKind::Position => "position",
            InterfaceKind::Velocity => "velocity",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an interface is commanded or measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceRole {
    /// Written by the host
    Command,
    /// Read by the host
    State,
}

impl fmt::Display for InterfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceRole::Command => f.write_str("command"),
            InterfaceRole::State => f.write_str("state"),
        }
    }
}

/// Joint name as exported to the host: the controller name starting at the
/// first `joint` literal, or the full name when it has none.
pub fn interface_joint_name(controller_name: &str) -> &str {
    controller_name
        .find(JOINT_NAME_MARKER)
        .map_or(controller_name, |pos| &controller_name[pos..])
}

/// Position/velocity pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointValues {
    /// Position in rad or m
    pub position: f64,
    /// Velocity in rad/s or m/s
    pub velocity: f64,
}

impl JointValues {
    /// Value of the given kind.
    pub fn get(&self, kind: InterfaceKind) -> f64 {
        match kind {
            InterfaceKind::Position => self.position,
            InterfaceKind::Velocity => self.velocity,
        }
    }

    /// Set the value of the given kind.
    pub fn set(&mut self, kind: InterfaceKind, value: f64) {
        match kind {
            InterfaceKind::Position => self.position = value,
            InterfaceKind::Velocity => self.velocity = value,
        }
    }
}

/// Command and measured state of one joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMotion {
    name: String,
    /// Setpoint sent to the controller
    pub command: JointValues,
    /// Last measured state
    pub state: JointValues,
}

impl JointMotion {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            command: JointValues::default(),
            state: JointValues::default(),
        }
    }

    /// Controller-side joint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Joint name as exported to the host.
    pub fn interface_name(&self) -> &str {
        interface_joint_name(&self.name)
    }
}

/// Joints of one mechanical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionUnit {
    name: String,
    joints: Vec<JointMotion>,
}

impl MotionUnit {
    /// Controller-side unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Joints in canonical order.
    pub fn joints(&self) -> &[JointMotion] {
        &self.joints
    }

    /// Mutable joints; the slice cannot be resized.
    pub fn joints_mut(&mut self) -> &mut [JointMotion] {
        &mut self.joints
    }
}

/// Units of one mechanical unit group.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionGroup {
    name: String,
    units: Vec<MotionUnit>,
}

impl MotionGroup {
    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units in canonical order.
    pub fn units(&self) -> &[MotionUnit] {
        &self.units
    }

    /// Joints of all units in canonical order.
    pub fn joints_mut(&mut self) -> impl Iterator<Item = &mut JointMotion> {
        self.units.iter_mut().flat_map(|u| u.joints.iter_mut())
    }
}

/// Position of a joint inside [`MotionData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotPath {
    group: usize,
    unit: usize,
    joint: usize,
}

/// Runtime mirror of every mechanical unit's joints.
///
/// Allocated once from a [`ControllerDescription`] and never resized: the
/// channel manager fills `state` on read and sends `command` on write, the
/// host reads and writes through slot-bound handles.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionData {
    groups: Vec<MotionGroup>,
    slots: Vec<SlotPath>,
}

impl MotionData {
    /// Build the mirror, preserving group → unit → joint order.
    ///
    /// # Errors
    /// `HalError::InvalidDescription` if the description is inconsistent.
    pub fn from_description(description: &ControllerDescription) -> Result<Self, HalError> {
        description.validate()?;

        let mut slots = Vec::with_capacity(description.joint_count());
        let groups = description
            .mechanical_units_groups
            .iter()
            .enumerate()
            .map(|(g, group)| MotionGroup {
                name: group.name.clone(),
                units: group
                    .units
                    .iter()
                    .enumerate()
                    .map(|(u, unit)| MotionUnit {
                        name: unit.name.clone(),
                        joints: unit
                            .standardized_joints
                            .iter()
                            .enumerate()
                            .map(|(j, joint)| {
                                slots.push(SlotPath { group: g, unit: u, joint: j });
                                JointMotion::new(&joint.standardized_name)
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self { groups, slots })
    }

    /// Groups in canonical order.
    pub fn groups(&self) -> &[MotionGroup] {
        &self.groups
    }

    /// Total number of joints.
    pub fn joint_count(&self) -> usize {
        self.slots.len()
    }

    /// Joint at a canonical slot.
    pub fn joint(&self, slot: usize) -> Option<&JointMotion> {
        let p = self.slots.get(slot)?;
        Some(&self.groups[p.group].units[p.unit].joints[p.joint])
    }

    /// Mutable joint at a canonical slot.
    pub fn joint_mut(&mut self, slot: usize) -> Option<&mut JointMotion> {
        let p = *self.slots.get(slot)?;
        Some(&mut self.groups[p.group].units[p.unit].joints[p.joint])
    }

    /// All joints in canonical order.
    pub fn joints(&self) -> impl Iterator<Item = &JointMotion> {
        self.groups
            .iter()
            .flat_map(|g| g.units.iter())
            .flat_map(|u| u.joints.iter())
    }

    /// All joints in canonical order, mutable.
    pub fn joints_mut(&mut self) -> impl Iterator<Item = &mut JointMotion> {
        self.groups.iter_mut().flat_map(|g| g.joints_mut())
    }

    /// Hold the measured position: command position = state position,
    /// command velocity = 0.
    pub fn seed_commands_from_state(&mut self) {
        for joint in self.joints_mut() {
            joint.command.position = joint.state.position;
            joint.command.velocity = 0.0;
        }
    }

    /// One position and one velocity state handle per joint, canonical order.
    pub fn state_interfaces(&self) -> Vec<StateInterface> {
        self.handles()
            .map(|(slot, joint, kind)| StateInterface(Handle::new(joint, kind, slot)))
            .collect()
    }

    /// One position and one velocity command handle per joint, canonical order.
    pub fn command_interfaces(&self) -> Vec<CommandInterface> {
        self.handles()
            .map(|(slot, joint, kind)| CommandInterface(Handle::new(joint, kind, slot)))
            .collect()
    }

    fn handles(&self) -> impl Iterator<Item = (usize, &str, InterfaceKind)> {
        self.joints().enumerate().flat_map(|(slot, joint)| {
            [InterfaceKind::Position, InterfaceKind::Velocity]
                .into_iter()
                .map(move |kind| (slot, joint.interface_name(), kind))
        })
    }

    /// Resolve a handle to its joint, checking it was issued for this data.
    fn resolve(&self, handle: &Handle) -> Result<&JointMotion, HalError> {
        self.joint(handle.slot)
            .filter(|j| j.interface_name() == handle.joint_name)
            .ok_or_else(|| HalError::UnknownHandle(handle.name()))
    }

    /// Measured value behind a state handle.
    pub fn state_value(&self, handle: &StateInterface) -> Result<f64, HalError> {
        Ok(self.resolve(&handle.0)?.state.get(handle.0.kind))
    }

    /// Commanded value behind a command handle.
    pub fn command_value(&self, handle: &CommandInterface) -> Result<f64, HalError> {
        Ok(self.resolve(&handle.0)?.command.get(handle.0.kind))
    }

    /// Store a commanded value through a command handle.
    pub fn set_command(&mut self, handle: &CommandInterface, value: f64) -> Result<(), HalError> {
        self.resolve(&handle.0)?;
        if let Some(joint) = self.joint_mut(handle.0.slot) {
            joint.command.set(handle.0.kind, value);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Handle {
    joint_name: String,
    kind: InterfaceKind,
    slot: usize,
}

impl Handle {
    fn new(joint_name: &str, kind: InterfaceKind, slot: usize) -> Self {
        Self {
            joint_name: joint_name.to_string(),
            kind,
            slot,
        }
    }

    fn name(&self) -> String {
        format!("{}/{}", self.joint_name, self.kind)
    }
}

macro_rules! interface_handle {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $ty(Handle);

        impl $ty {
            /// Exported joint name.
            pub fn joint_name(&self) -> &str {
                &self.0.joint_name
            }

            /// Interface kind.
            pub fn kind(&self) -> InterfaceKind {
                self.0.kind
            }

            /// Canonical slot in the motion data.
            pub fn slot(&self) -> usize {
                self.0.slot
            }

            /// Full interface name, `<joint>/<kind>`.
            pub fn name(&self) -> String {
                self.0.name()
            }
        }
    };
}

interface_handle!(
    /// Read handle on a joint's measured position or velocity.
    StateInterface
);
interface_handle!(
    /// Read-write handle on a joint's commanded position or velocity.
    CommandInterface
);
