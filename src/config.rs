//! Configuration for template loading
//!
//! Settings can be built in code or read from a TOML file:
//!
//! ```toml
//! marker_attribute = "template-id"
//! max_source_bytes = 1048576
//! base_path = "assets"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Attribute that marks a placeholder element
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "template-id";

/// Upper bound for a single content source (32 MiB)
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 32 * 1024 * 1024;

/// Errors that can occur when loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration options for loading and filling templates
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Name of the attribute carrying the marker id
    pub marker_attribute: String,

    /// Maximum number of bytes read from any content source
    pub max_source_bytes: u64,

    /// Directory that relative file sources are read from
    pub base_path: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            base_path: None,
        }
    }
}

impl TemplateConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: TemplateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the marker attribute name
    pub fn with_marker_attribute(mut self, name: impl Into<String>) -> Self {
        self.marker_attribute = name.into();
        self
    }

    /// Set the per-source size limit
    pub fn with_max_source_bytes(mut self, limit: u64) -> Self {
        self.max_source_bytes = limit;
        self
    }

    /// Set the directory relative file sources are resolved against
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Check that the values can be used to load a template
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_attribute.is_empty() {
            return Err(ConfigError::Invalid(
                "marker_attribute must not be empty".to_string(),
            ));
        }
        if self
            .marker_attribute
            .chars()
            .any(|c| c.is_whitespace() || c == '=' || c == '"' || c == '\'')
        {
            return Err(ConfigError::Invalid(format!(
                "marker_attribute '{}' is not a valid attribute name",
                self.marker_attribute
            )));
        }
        if self.max_source_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_source_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a file source path against the base path
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
