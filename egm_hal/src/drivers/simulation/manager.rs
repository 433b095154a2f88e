//! Simulated motion channel manager.
//!
//! Behaves like a perfectly tracking servo: every `write` latches the
//! commanded position (clamped to the joint bounds) and velocity, and the
//! next `read` reports them as measured state. A message is always pending.

use egm_common::hal::driver::{ChannelConfiguration, HalError, MotionChannelManager};
use egm_common::hal::types::{JointValues, MotionData};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Latched state of one simulated joint.
#[derive(Debug, Clone, PartialEq)]
struct SimulatedJoint {
    lower: f64,
    upper: f64,
    values: JointValues,
}

/// Channel manager emulating an ideal controller.
#[derive(Debug, Clone)]
pub struct SimulatedChannelManager {
    ports: Vec<u16>,
    joints: Vec<SimulatedJoint>,
    messages: u64,
}

impl SimulatedChannelManager {
    /// Create a manager serving `configs` in order.
    ///
    /// # Errors
    /// `HalError::ChannelConstruction` for an empty set, port 0 or a port
    /// used by two groups.
    pub fn new(configs: &[ChannelConfiguration]) -> Result<Self, HalError> {
        if configs.is_empty() {
            return Err(HalError::ChannelConstruction(
                "no channel configurations".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for config in configs {
            if config.port == 0 {
                return Err(HalError::ChannelConstruction(format!(
                    "group \"{}\": port 0 is not bindable",
                    config.group.name
                )));
            }
            if !seen.insert(config.port) {
                return Err(HalError::ChannelConstruction(format!(
                    "group \"{}\": port {} already in use",
                    config.group.name, config.port
                )));
            }
        }

        let joints: Vec<_> = configs
            .iter()
            .flat_map(|c| c.group.joints())
            .map(|j| SimulatedJoint {
                lower: j.lower_joint_bound,
                upper: j.upper_joint_bound,
                values: JointValues {
                    position: limit(0.0, j.lower_joint_bound, j.upper_joint_bound),
                    velocity: 0.0,
                },
            })
            .collect();

        let ports: Vec<u16> = configs.iter().map(|c| c.port).collect();
        info!(
            "Simulated EGM channels on ports {:?} serving {} joints",
            ports,
            joints.len()
        );

        Ok(Self {
            ports,
            joints,
            messages: 0,
        })
    }

    /// Start every joint at `positions` (canonical order, clamped to bounds).
    /// Extra values are ignored, missing ones keep their default.
    pub fn with_initial_positions(mut self, positions: &[f64]) -> Self {
        for (joint, &p) in self.joints.iter_mut().zip(positions) {
            joint.values.position = limit(p, joint.lower, joint.upper);
        }
        self
    }

    /// Ports in configuration order.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Number of `read` calls served.
    pub fn messages_served(&self) -> u64 {
        self.messages
    }
}

/// Clamp without panicking on inverted bounds.
fn limit(value: f64, lower: f64, upper: f64) -> f64 {
    value.max(lower).min(upper)
}

impl MotionChannelManager for SimulatedChannelManager {
    fn wait_for_message(&mut self, _timeout: Duration) -> bool {
        true
    }

    fn read(&mut self, motion: &mut MotionData) {
        for (joint, sim) in motion.joints_mut().zip(&self.joints) {
            joint.state = sim.values;
        }
        self.messages += 1;
    }

    fn write(&mut self, motion: &MotionData) {
        for (sim, joint) in self.joints.iter_mut().zip(motion.joints()) {
            let position = limit(joint.command.position, sim.lower, sim.upper);
            if position != joint.command.position {
                debug!(
                    "Command for '{}' clamped from {:.4} to {:.4}",
                    joint.name(),
                    joint.command.position,
                    position
                );
            }
            sim.values = JointValues {
                position,
                velocity: joint.command.velocity,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egm_common::hal::description::{
        ControllerDescription, MechanicalUnit, MechanicalUnitGroup, StandardizedJoint,
    };

    fn group(name: &str, bounds: &[(f64, f64)]) -> MechanicalUnitGroup {
        MechanicalUnitGroup {
            name: name.to_string(),
            units: vec![MechanicalUnit {
                name: "ROB_1".to_string(),
                axes_total: bounds.len() as u32,
                standardized_joints: bounds
                    .iter()
                    .enumerate()
                    .map(|(i, &(lo, hi))| StandardizedJoint {
                        standardized_name: format!("{name}joint_{}", i + 1),
                        lower_joint_bound: lo,
                        upper_joint_bound: hi,
                        rotating_move: true,
                    })
                    .collect(),
                ..Default::default()
            }],
        }
    }

    fn setup(groups: Vec<MechanicalUnitGroup>) -> (Vec<ChannelConfiguration>, MotionData) {
        let description = ControllerDescription {
            mechanical_units_groups: groups.clone(),
            ..Default::default()
        };
        let configs = groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| ChannelConfiguration {
                port: 6511 + i as u16,
                group,
            })
            .collect();
        (configs, MotionData::from_description(&description).unwrap())
    }

    #[test]
    fn test_rejects_bad_configurations() {
        assert!(matches!(
            SimulatedChannelManager::new(&[]),
            Err(HalError::ChannelConstruction(_))
        ));

        let (mut configs, _) = setup(vec![group("rob1_", &[(-1.0, 1.0)])]);
        configs[0].port = 0;
        assert!(SimulatedChannelManager::new(&configs).is_err());

        let (mut configs, _) = setup(vec![
            group("rob1_", &[(-1.0, 1.0)]),
            group("rob2_", &[(-1.0, 1.0)]),
        ]);
        configs[1].port = configs[0].port;
        let err = SimulatedChannelManager::new(&configs).unwrap_err();
        assert!(err.to_string().contains("rob2_"));
    }

    #[test]
    fn test_ideal_servo_clamps_to_bounds() {
        let (configs, mut motion) = setup(vec![group("", &[(-1.0, 1.0), (0.0, 2.0)])]);
        let mut manager = SimulatedChannelManager::new(&configs).unwrap();
        assert!(manager.wait_for_message(Duration::ZERO));

        for joint in motion.joints_mut() {
            joint.command.position = 5.0;
            joint.command.velocity = 0.25;
        }
        manager.write(&motion);
        manager.read(&mut motion);

        let states: Vec<_> = motion.joints().map(|j| j.state).collect();
        assert_eq!(states[0], JointValues { position: 1.0, velocity: 0.25 });
        assert_eq!(states[1], JointValues { position: 2.0, velocity: 0.25 });
        assert_eq!(manager.messages_served(), 1);
    }

    #[test]
    fn test_initial_positions_span_groups() {
        let (configs, mut motion) = setup(vec![
            group("rob1_", &[(-1.0, 1.0)]),
            group("rob2_", &[(-3.0, 3.0)]),
        ]);
        let mut manager = SimulatedChannelManager::new(&configs)
            .unwrap()
            .with_initial_positions(&[0.5, -4.0]);
        assert_eq!(manager.ports(), [6511, 6512]);

        manager.read(&mut motion);
        let positions: Vec<_> = motion.joints().map(|j| j.state.position).collect();
        assert_eq!(positions, [0.5, -3.0]);
    }
}
