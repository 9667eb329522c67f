//! Configuration file handling for `~/.terraload/config.ini`.
//!
//! A missing file is not an error: every knob has a default.

use super::settings::TerraloadConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A key holds a value that cannot be used
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl From<ini::Error> for ConfigFileError {
    fn from(err: ini::Error) -> Self {
        match err {
            ini::Error::Io(err) => Self::Io(err),
            ini::Error::Parse(err) => Self::Parse(err.to_string()),
        }
    }
}

impl TerraloadConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&default_config_path())
    }

    /// Loads configuration from `path`, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = ini::Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini =
            ini::Ini::load_from_str(content).map_err(|e| ConfigFileError::Parse(e.to_string()))?;
        super::parser::parse_ini(&ini)
    }
}

/// Directory holding the config file (`~/.terraload`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".terraload")
}

/// Path of the config file (`~/.terraload/config.ini`).
pub fn default_config_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_path_ends_with_config_ini() {
        let path = default_config_path();
        assert!(path.ends_with(".terraload/config.ini"));
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerraloadConfig::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, TerraloadConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\nmax_requests = 12\n\n[tiles]\nmax_level = 7").unwrap();

        let config = TerraloadConfig::load_from(file.path()).unwrap();
        assert_eq!(config.scheduler.max_requests, 12);
        assert_eq!(config.tiles.max_level, 7);
    }

    #[test]
    fn test_invalid_value_error_message() {
        let err = ConfigFileError::InvalidValue {
            section: "scheduler".to_string(),
            key: "max_requests".to_string(),
            value: "lots".to_string(),
            reason: "must be a non-negative integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration: scheduler.max_requests = 'lots' - must be a non-negative integer"
        );
    }
}
