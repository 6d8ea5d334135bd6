//! Configuration for harvest runs.
//!
//! Two layers, kept apart:
//!
//! - [`ConfigFile`]: the user's `~/.tileharvest/config.ini`, parsed with
//!   defaults for anything missing.
//! - [`HarvestConfig`]: the immutable settings a single run uses, built
//!   from defaults, a config file, or command-line overrides.
//!
//! # Example
//!
//! ```
//! use tileharvest::config::{ConfigFile, HarvestConfig};
//!
//! let file = ConfigFile::default();
//! let config = HarvestConfig::from_config_file(&file).with_workers(4);
//! assert_eq!(config.workers(), 4);
//! ```

mod defaults;
mod file;
mod harvest;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use harvest::HarvestConfig;
pub use settings::{ConfigFile, HarvestSettings, InputSettings, LoggingSettings, ProviderSettings};
