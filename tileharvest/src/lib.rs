//! tileharvest - Satellite imagery tile harvesting
//!
//! This library downloads one imagery tile per geographic coordinate from
//! a slippy-map tile service and stores it as a JPEG named after the item,
//! skipping items whose tile is already on disk.
//!
//! # High-Level API
//!
//! ```ignore
//! use tileharvest::config::HarvestConfig;
//! use tileharvest::harvest::TileHarvester;
//! use tileharvest::input::{read_requests, InputColumns};
//! use tileharvest::provider::create_provider;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = HarvestConfig::new().with_output_dir("property_visuals");
//! let harvester = TileHarvester::new(config.clone(), create_provider(&config)?)?;
//!
//! let input = read_requests(Path::new("houses.csv"), &InputColumns::default())?;
//! let report = harvester
//!     .harvest_batch(input.requests, &CancellationToken::new())
//!     .await;
//! println!("{}/{} tiles", report.succeeded, report.total);
//! ```

pub mod config;
pub mod coord;
pub mod harvest;
pub mod imagery;
pub mod input;
pub mod logging;
pub mod provider;
pub mod store;

/// Version of the tileharvest library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
