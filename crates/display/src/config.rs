//! Configuration loading for the display.
//!
//! All display settings can be loaded from a TOML configuration file.

use scene_events::GraphicsKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete display configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Standard visualizer settings
    #[serde(default)]
    pub visualizers: VisualizerConfig,
    /// General display settings
    #[serde(default)]
    pub display: GeneralConfig,
}

impl DisplayConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::TomlError)
    }

    /// Serializes the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, TomlSerializeError> {
        toml::to_string_pretty(self).map_err(TomlSerializeError)
    }
}

/// Which standard visualizers the default factory builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Graphics kinds to visualize, in update order
    pub enabled: Vec<GraphicsKind>,
    /// Positions kept per path trail
    pub max_path_samples: usize,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            enabled: GraphicsKind::ALL.to_vec(),
            max_path_samples: 64,
        }
    }
}

/// General display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Name given to the always-present default data source
    pub default_source_name: String,
    /// Log a summary of every frame at debug level
    pub log_frame_reports: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_source_name: "default".to_string(),
            log_frame_reports: false,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    IoError(std::io::Error),
    /// Error parsing TOML config
    TomlError(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::TomlError(e) => Some(e),
        }
    }
}

/// Error that can occur during TOML serialization.
#[derive(Debug)]
pub struct TomlSerializeError(pub toml::ser::Error);

impl std::fmt::Display for TomlSerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TOML serialize error: {}", self.0)
    }
}

impl std::error::Error for TomlSerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Display Configuration

[visualizers]
enabled = ["billboard", "geometry", "label", "model", "point", "path", "polyline"]
max_path_samples = 64

[display]
default_source_name = "default"
log_frame_reports = false
"#
    .to_string()
}
