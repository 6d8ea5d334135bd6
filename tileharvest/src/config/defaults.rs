//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::path::PathBuf;
use std::time::Duration;

use super::settings::*;
use crate::imagery::DEFAULT_JPEG_QUALITY as IMAGERY_JPEG_QUALITY;
use crate::provider::WORLD_IMAGERY_URL;

// =============================================================================
// Harvest defaults
// =============================================================================

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "property_visuals";

/// Default zoom level (roughly 0.3 m/pixel at the equator).
pub const DEFAULT_ZOOM: u8 = 19;

/// Default number of items harvested concurrently.
/// One reproduces strictly sequential harvesting.
pub const DEFAULT_WORKERS: usize = 1;

/// Upper bound on concurrent items.
/// Public imagery endpoints throttle well before this.
pub const MAX_WORKERS: usize = 64;

/// Default JPEG quality of written artifacts.
pub const DEFAULT_JPEG_QUALITY: u8 = IMAGERY_JPEG_QUALITY;

/// Stop starting new items after a local write failure.
pub const DEFAULT_STOP_ON_PERSISTENCE_ERROR: bool = true;

// =============================================================================
// Provider defaults
// =============================================================================

/// Default tile endpoint.
pub const DEFAULT_BASE_URL: &str = WORLD_IMAGERY_URL;

/// Default `User-Agent` sent with every tile request.
pub const DEFAULT_USER_AGENT: &str = "GeospatialResearchBot/1.1";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 12;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

// =============================================================================
// Input defaults
// =============================================================================

/// Default latitude column of the input CSV.
pub const DEFAULT_LAT_COLUMN: &str = "lat";

/// Default longitude column of the input CSV.
pub const DEFAULT_LON_COLUMN: &str = "long";

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log file name, placed in the config directory.
pub const DEFAULT_LOG_FILE: &str = "tileharvest.log";

/// Clamp a worker count into `1..=MAX_WORKERS`.
pub fn clamp_workers(workers: usize) -> usize {
    workers.clamp(1, MAX_WORKERS)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            harvest: HarvestSettings::default(),
            provider: ProviderSettings::default(),
            input: InputSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            zoom: DEFAULT_ZOOM,
            workers: DEFAULT_WORKERS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            stop_on_persistence_error: DEFAULT_STOP_ON_PERSISTENCE_ERROR,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            lat_column: DEFAULT_LAT_COLUMN.to_string(),
            lon_column: DEFAULT_LON_COLUMN.to_string(),
            id_column: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: super::file::config_directory().join(DEFAULT_LOG_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_workers() {
        assert_eq!(clamp_workers(0), 1);
        assert_eq!(clamp_workers(8), 8);
        assert_eq!(clamp_workers(10_000), MAX_WORKERS);
    }

    #[test]
    fn test_default_timeout_matches_secs() {
        assert_eq!(DEFAULT_TIMEOUT.as_secs(), DEFAULT_TIMEOUT_SECS);
    }
}
