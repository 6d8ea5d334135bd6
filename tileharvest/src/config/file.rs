//! Reading and writing `~/.tileharvest/config.ini`.
//!
//! Parsing lives in [`super::parser`] and the commented output format in
//! [`super::writer`]; this module only deals with paths and files.

use ini::Ini;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use super::settings::*;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Directory under the home directory that holds the config file.
const CONFIG_DIR_NAME: &str = ".tileharvest";

const CONFIG_FILE_NAME: &str = "config.ini";

impl ConfigFile {
    /// Reads `~/.tileharvest/config.ini`, falling back to defaults when it is absent.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Reads the config at `path`. A missing file yields the defaults; any
    /// other read or parse failure is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match Ini::load_from_file(path) {
            Ok(ini) => super::parser::parse_ini(&ini),
            Err(ini::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the commented INI form of this config, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, super::writer::to_config_string(self))
            .map_err(|e| ConfigFileError::WriteError(format!("{}: {}", path.display(), e)))
    }

    /// Writes a default config at `path` unless a file is already there.
    ///
    /// Returns `true` when the file was created. An existing file is never
    /// touched.
    pub fn create_default_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().write_to(path)?;
        Ok(true)
    }
}

/// `~/.tileharvest`, or `./.tileharvest` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// `~/.tileharvest/config.ini`
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.harvest.output_dir, PathBuf::from("property_visuals"));
        assert_eq!(config.harvest.zoom, 19);
        assert_eq!(config.harvest.workers, DEFAULT_WORKERS);
        assert_eq!(config.harvest.jpeg_quality, 95);
        assert!(config.harvest.stop_on_persistence_error);
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.user_agent, "GeospatialResearchBot/1.1");
        assert_eq!(config.provider.timeout, 12);
        assert_eq!(config.input.lat_column, "lat");
        assert_eq!(config.input.lon_column, "long");
        assert!(config.input.id_column.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.harvest.output_dir = PathBuf::from("/data/visuals");
        config.harvest.zoom = 17;
        config.harvest.workers = 4;
        config.harvest.stop_on_persistence_error = false;
        config.provider.user_agent = "Survey/2.0".to_string();
        config.provider.timeout = 30;
        config.input.id_column = Some("parcel_id".to_string());
        config.logging.file = PathBuf::from("/var/log/tileharvest.log");

        config.write_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[harvest]\nzoom = nineteen\n").unwrap();

        let result = ConfigFile::load_from(&config_path);
        assert!(matches!(result, Err(ConfigFileError::InvalidValue { .. })));
    }

    #[test]
    fn test_create_default_keeps_existing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join(".tileharvest").join("config.ini");

        assert!(ConfigFile::create_default_at(&config_path).unwrap());
        assert_eq!(
            ConfigFile::load_from(&config_path).unwrap(),
            ConfigFile::default()
        );

        std::fs::write(&config_path, "[harvest]\nzoom = 15\n").unwrap();
        assert!(!ConfigFile::create_default_at(&config_path).unwrap());
        assert_eq!(ConfigFile::load_from(&config_path).unwrap().harvest.zoom, 15);
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".tileharvest/config.ini"));
    }
}
