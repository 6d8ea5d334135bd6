//! Tile harvesting.
//!
//! [`TileHarvester`] turns [`HarvestRequest`]s into JPEG artifacts in an
//! output directory:
//!
//! 1. address the coordinate at the configured zoom
//! 2. return `Cached` if `tile_id_{identifier}.jpg` already exists
//! 3. download the tile once, bounded by the configured timeout
//! 4. re-encode as RGB JPEG and write it atomically
//!
//! Every failure is returned as a [`HarvestError`] that keeps its cause;
//! [`TileHarvester::harvest_batch`] records them per item in a
//! [`BatchReport`] and keeps going.

mod error;
mod harvester;
mod locks;
mod outcome;
mod request;
mod stats;

pub use error::{ErrorKind, HarvestError};
pub use harvester::{HarvestProgressCallback, SetupError, TileHarvester};
pub use locks::{IdentifierGuard, IdentifierLocks};
pub use outcome::{BatchReport, ItemOutcome, ItemReport, TileOutcome};
pub use request::{HarvestRequest, Identifier, IdentifierError};
pub use stats::{HarvestStats, HarvestStatsSnapshot};
