//! Static service declarations.

use crate::error::{Result, SupervisorError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One child service to supervise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Source tree; also the working directory of the launched binary
    pub path: PathBuf,
    /// Port handed to the child as `PORT`
    pub port: String,
    #[serde(default)]
    pub description: String,
    /// Name of the build artifact written into `path`
    pub binary_name: String,
}

impl ServiceDescriptor {
    pub fn new(
        path: impl Into<PathBuf>,
        port: impl Into<String>,
        binary_name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            port: port.into(),
            description: String::new(),
            binary_name: binary_name.into(),
        }
    }

    /// Set the human-readable description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Location of the build artifact on disk.
    pub fn binary_path(&self) -> PathBuf {
        self.path.join(&self.binary_name)
    }

    /// Path used to identify the service in log lines.
    pub fn display_path(&self) -> std::path::Display<'_> {
        self.path.display()
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.binary_name.as_str();
        let is_plain_file_name = !name.is_empty()
            && name != "."
            && name != ".."
            && Path::new(name).file_name().map(|f| f == name).unwrap_or(false)
            && !name.contains('\\');
        if !is_plain_file_name {
            return Err(SupervisorError::Config(format!(
                "service {}: binary_name {:?} is not a valid executable name",
                self.display_path(),
                name
            )));
        }
        if self.port.trim().is_empty() {
            return Err(SupervisorError::Config(format!(
                "service {}: port must not be empty",
                self.display_path()
            )));
        }
        Ok(())
    }
}

/// Validate each descriptor and reject duplicate ports.
pub fn validate_all(descriptors: &[ServiceDescriptor]) -> Result<()> {
    let mut ports = HashSet::new();
    for descriptor in descriptors {
        descriptor.validate()?;
        if !ports.insert(descriptor.port.as_str()) {
            return Err(SupervisorError::Config(format!(
                "port {} is assigned to more than one service",
                descriptor.port
            )));
        }
    }
    Ok(())
}

/// The built-in service list used when no config file is given.
pub fn default_services() -> Vec<ServiceDescriptor> {
    vec![ServiceDescriptor::new("../wf-ceo/", "8081", "wf-ceo")
        .description("Workflow General Manager")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let svc = ServiceDescriptor::new("../wf-gen/", "8082", "wf-gen")
            .description("Workflow Generator Service");

        assert_eq!(svc.port, "8082");
        assert_eq!(svc.description, "Workflow Generator Service");
        assert_eq!(svc.binary_path(), PathBuf::from("../wf-gen/wf-gen"));
        assert!(svc.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_binary_names() {
        for name in ["", ".", "..", "bin/wf-gen", "../wf-gen"] {
            let svc = ServiceDescriptor::new("../wf-gen/", "8082", name);
            assert!(
                matches!(svc.validate(), Err(SupervisorError::Config(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_ports() {
        let services = vec![
            ServiceDescriptor::new("../a/", "9001", "a"),
            ServiceDescriptor::new("../b/", "9001", "b"),
        ];
        let err = validate_all(&services).unwrap_err();
        assert!(err.to_string().contains("9001"));
    }

    #[test]
    fn test_default_services() {
        let services = default_services();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].binary_name, "wf-ceo");
        assert_eq!(services[0].port, "8081");
        assert!(validate_all(&services).is_ok());
    }
}
