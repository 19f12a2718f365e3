//! Configuration for BEATwatch parsing.

use crate::parser::{Parser, ParserError, DEFAULT_FORMAT_VERSION};
use crate::plot::DEFAULT_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration for the `beatwatch` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timezone of the recordings (IANA name or "UTC")
    pub timezone: String,

    /// File format version written by the device firmware
    pub format_version: f64,

    /// Plot width in pixels
    pub plot_width: u32,

    /// Plot height in pixels
    pub plot_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            format_version: DEFAULT_FORMAT_VERSION,
            plot_width: DEFAULT_SIZE.0,
            plot_height: DEFAULT_SIZE.1,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, or defaults if it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("beatwatch-process")
            .join("config.json")
    }

    /// Build a parser for this configuration.
    pub fn parser(&self) -> Result<Parser, ParserError> {
        Ok(Parser::new(&self.timezone)?.with_format_version(self.format_version))
    }

    pub fn plot_size(&self) -> (u32, u32) {
        (self.plot_width, self.plot_height)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.format_version, 0.1);
        assert_eq!(config.plot_size(), (1000, 400));
        assert!(config.parser().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"timezone": "America/Toronto"}"#).unwrap();
        assert_eq!(config.timezone, "America/Toronto");
        assert_eq!(config.format_version, 0.1);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            timezone: "Europe/Berlin".to_string(),
            format_version: 0.2,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_default_parser_scales_legacy_confidence() {
        let parser = Config::default().parser().unwrap();
        let (bundle, _) = parser.parse_str("0,70,950,1,2\n");

        let hr = bundle.hr.expect("legacy hr row kept");
        assert_eq!(hr[0].confidence, 95);
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bad_timezone_rejected_by_parser() {
        let config = Config {
            timezone: "Nowhere/Special".to_string(),
            ..Config::default()
        };
        assert!(config.parser().is_err());
    }
}
