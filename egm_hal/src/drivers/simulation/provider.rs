//! Snapshot description provider.

use egm_common::config::{ConfigError, ConfigLoader};
use egm_common::hal::description::ControllerDescription;
use egm_common::hal::driver::{DescriptionProvider, DescriptionRequest, HalError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Serves a controller description captured in a TOML snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotDescriptionProvider {
    source: PathBuf,
    description: ControllerDescription,
}

impl SnapshotDescriptionProvider {
    /// Load the snapshot at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let description = ControllerDescription::load(path)?;
        Ok(Self {
            source: path.to_path_buf(),
            description,
        })
    }

    /// Wrap an in-memory description.
    pub fn from_description(description: ControllerDescription) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            description,
        }
    }
}

impl DescriptionProvider for SnapshotDescriptionProvider {
    fn fetch_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<ControllerDescription, HalError> {
        info!(
            "Serving description of {}:{} ({}) from snapshot {}",
            request.endpoint.address,
            request.endpoint.port,
            request.robot_model,
            self.source.display()
        );
        Ok(self.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egm_common::hal::driver::{Credentials, RwsEndpoint};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"
[header.robot_ware_version]
major = 7
minor = 10
patch = 0

[[mechanical_units_groups]]
name = "rob1_"

[[mechanical_units_groups.units]]
name = "ROB_1"
axes_total = 1

[[mechanical_units_groups.units.standardized_joints]]
standardized_name = "rob1_joint_1"
lower_joint_bound = -2.87
upper_joint_bound = 2.87
rotating_move = true
"#;

    fn request() -> DescriptionRequest {
        DescriptionRequest {
            endpoint: RwsEndpoint {
                address: "192.168.125.1".to_string(),
                port: 80,
            },
            credentials: Credentials {
                user: "Default User".to_string(),
                password: "robotics".to_string(),
            },
            robot_model: "IRB1200".to_string(),
            no_connection_timeout: true,
        }
    }

    #[test]
    fn test_load_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let provider = SnapshotDescriptionProvider::load(file.path()).unwrap();
        let d = provider.fetch_description(&request()).unwrap();
        assert_eq!(d.header.robot_ware_version.minor, 10);
        assert_eq!(d.mechanical_units_groups[0].name, "rob1_");
    }

    #[test]
    fn test_missing_snapshot() {
        let result = SnapshotDescriptionProvider::load(Path::new("/nonexistent/snapshot.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
