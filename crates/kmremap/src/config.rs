//! Remapping configuration (`kmremap.toml`)

use crate::header::METADATA_DESCRIPTOR;
use crate::version::MetadataVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Settings for rewriting metadata annotations
///
/// ```toml
/// annotation-descriptor = "Lkotlin/Metadata;"
/// report-size-drift = true
/// source-namespace = "named"
/// target-namespace = "intermediary"
///
/// [metadata-version]
/// major = 2
/// minor = 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RemapConfig {
    /// Descriptor of the annotation carrying metadata
    pub annotation_descriptor: String,

    /// Metadata version to compare class files against
    pub metadata_version: MetadataVersion,

    /// Whether to report `d2` size changes after rewriting
    pub report_size_drift: bool,

    /// Mapping file namespace names are read from
    pub source_namespace: String,

    /// Mapping file namespace names are mapped to
    pub target_namespace: String,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            annotation_descriptor: METADATA_DESCRIPTOR.to_string(),
            metadata_version: MetadataVersion::CURRENT,
            report_size_drift: true,
            source_namespace: "named".to_string(),
            target_namespace: "intermediary".to_string(),
        }
    }
}

impl RemapConfig {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a config from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: RemapConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let descriptor = &self.annotation_descriptor;
        if !(descriptor.len() > 2 && descriptor.starts_with('L') && descriptor.ends_with(';')) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid annotation descriptor: {descriptor}. Must look like Lpkg/Name;"
            )));
        }

        if self.source_namespace.is_empty() || self.target_namespace.is_empty() {
            return Err(ConfigError::ValidationError(
                "Mapping namespaces cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RemapConfig::from_str("").unwrap();
        assert_eq!(config, RemapConfig::default());
        assert_eq!(config.annotation_descriptor, "Lkotlin/Metadata;");
        assert_eq!(config.metadata_version, MetadataVersion::new(2, 1, 0));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
annotation-descriptor = "Lkotlin/Metadata;"
report-size-drift = false
source-namespace = "intermediary"
target-namespace = "named"

[metadata-version]
major = 1
minor = 9
"#;

        let config = RemapConfig::from_str(toml).unwrap();
        assert!(!config.report_size_drift);
        assert_eq!(config.metadata_version, MetadataVersion::new(1, 9, 0));
        assert_eq!(config.source_namespace, "intermediary");
        assert_eq!(config.target_namespace, "named");
    }

    #[test]
    fn test_invalid_descriptor() {
        let result = RemapConfig::from_str(r#"annotation-descriptor = "kotlin.Metadata""#);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unparseable_config() {
        let result = RemapConfig::from_str("report-size-drift = \"sometimes\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
