//! Harvest run configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::*;
use super::settings::ConfigFile;

/// Everything a [`TileHarvester`](crate::harvest::TileHarvester) needs for a run.
///
/// Built once and never mutated while a batch runs. The zoom level in
/// particular is fixed for the whole run so every item of a batch is
/// addressed on the same grid.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tileharvest::config::HarvestConfig;
///
/// // Using defaults
/// let config = HarvestConfig::default();
/// assert_eq!(config.zoom(), 19);
/// assert_eq!(config.timeout(), Duration::from_secs(12));
/// assert_eq!(config.workers(), 1);
///
/// // Custom configuration
/// let config = HarvestConfig::new()
///     .with_output_dir("/data/visuals")
///     .with_zoom(18)
///     .with_workers(4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Directory artifacts are written to
    output_dir: PathBuf,
    /// Zoom level for every item
    zoom: u8,
    /// Tile endpoint, without trailing slash
    base_url: String,
    /// `User-Agent` header value
    user_agent: String,
    /// Extra headers sent with every request
    headers: Vec<(String, String)>,
    /// Bound on a single fetch
    timeout: Duration,
    /// JPEG quality of written artifacts
    jpeg_quality: u8,
    /// Items harvested concurrently
    workers: usize,
    /// Stop starting new items after a persistence failure
    stop_on_persistence_error: bool,
}

impl HarvestConfig {
    /// Create a new harvest configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the `[harvest]` and `[provider]` sections
    /// of a config file.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        Self::new()
            .with_output_dir(&file.harvest.output_dir)
            .with_zoom(file.harvest.zoom)
            .with_workers(file.harvest.workers)
            .with_jpeg_quality(file.harvest.jpeg_quality)
            .with_stop_on_persistence_error(file.harvest.stop_on_persistence_error)
            .with_base_url(&file.provider.base_url)
            .with_user_agent(&file.provider.user_agent)
            .with_timeout(Duration::from_secs(file.provider.timeout))
    }

    /// Set the output directory. Default: `property_visuals`.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the zoom level. Default: 19.
    ///
    /// Not validated here; an unsupported zoom fails every item with an
    /// addressing error and is rejected up front by the harvester.
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the tile endpoint. Trailing slashes are dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the `User-Agent` header. Default: `GeospatialResearchBot/1.1`.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the per-request timeout. Default: 12 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the JPEG quality, clamped to 1..=100. Default: 95.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set how many items run at once, clamped to `1..=MAX_WORKERS`.
    ///
    /// Default: 1, which processes items strictly one after another.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = clamp_workers(workers);
        self
    }

    /// Whether a local write failure stops new items from starting.
    /// Default: true.
    pub fn with_stop_on_persistence_error(mut self, stop: bool) -> Self {
        self.stop_on_persistence_error = stop;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Extra headers, in insertion order. `User-Agent` is not included.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stop_on_persistence_error(&self) -> bool {
        self.stop_on_persistence_error
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            zoom: DEFAULT_ZOOM,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            workers: DEFAULT_WORKERS,
            stop_on_persistence_error: DEFAULT_STOP_ON_PERSISTENCE_ERROR,
        }
    }
}
