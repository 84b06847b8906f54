use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::supervisor::builder::Toolchain;
use crate::supervisor::descriptor::{self, ServiceDescriptor};

/// Declared services and the toolchain used to build them.
///
/// ```toml
/// [toolchain]
/// program = "go"
/// args = ["build", "-o", "{binary}"]
///
/// [[service]]
/// path = "../wf-ceo/"
/// port = "8081"
/// description = "Workflow General Manager"
/// binary_name = "wf-ceo"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub toolchain: Toolchain,
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceDescriptor>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            toolchain: Toolchain::default(),
            services: descriptor::default_services(),
        }
    }
}

impl ServicesConfig {
    /// Load from `path`, or fall back to the built-in service list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::trace!("No services config given, using built-in list");
            return Ok(Self::default());
        };

        tracing::trace!(path = %path.display(), "Loading services config");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        tracing::debug!(services = config.services.len(), "Services config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        descriptor::validate_all(&config.services)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServicesConfig::load(None).unwrap();
        assert_eq!(config.toolchain, Toolchain::default());
        assert_eq!(config.services, descriptor::default_services());
    }

    #[test]
    fn test_parse_services() {
        let config = ServicesConfig::parse(
            r#"
            [toolchain]
            program = "sh"
            args = ["-c", "make {binary}"]

            [[service]]
            path = "../wf-ceo/"
            port = "9001"
            binary_name = "wf-ceo"

            [[service]]
            path = "../wf-gen/"
            port = "9002"
            description = "Workflow Generator Service"
            binary_name = "wf-gen"
            "#,
        )
        .unwrap();

        assert_eq!(config.toolchain.program, "sh");
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].description, "");
        assert_eq!(config.services[1].port, "9002");
    }

    #[test]
    fn test_missing_toolchain_uses_go() {
        let config = ServicesConfig::parse("").unwrap();
        assert_eq!(config.toolchain.program, "go");
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_duplicate_ports_rejected() {
        let err = ServicesConfig::parse(
            r#"
            [[service]]
            path = "a"
            port = "9001"
            binary_name = "a"

            [[service]]
            path = "b"
            port = "9001"
            binary_name = "b"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("9001"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = ServicesConfig::load(Some(Path::new("/nonexistent/services.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
