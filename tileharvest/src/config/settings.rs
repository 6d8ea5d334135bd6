//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Harvest run settings
    pub harvest: HarvestSettings,
    /// Tile endpoint settings
    pub provider: ProviderSettings,
    /// CSV column mapping
    pub input: InputSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Harvest run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    /// Directory artifacts are written to
    pub output_dir: PathBuf,
    /// Zoom level for every item of a run
    pub zoom: u8,
    /// Items harvested concurrently
    pub workers: usize,
    /// JPEG quality of written artifacts (1-100)
    pub jpeg_quality: u8,
    /// Stop starting new items after a local write failure
    pub stop_on_persistence_error: bool,
}

/// Tile endpoint configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Base URL; `/{zoom}/{y}/{x}` is appended
    pub base_url: String,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Timeout in seconds for HTTP requests.
    pub timeout: u64,
}

/// Input CSV column names.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSettings {
    pub lat_column: String,
    pub lon_column: String,
    /// Identifier column; the row index is used when unset
    pub id_column: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
