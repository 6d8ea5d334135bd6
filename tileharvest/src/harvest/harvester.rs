//! The fetch / cache / persist pipeline.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{ErrorKind, HarvestError};
use super::locks::IdentifierLocks;
use super::outcome::{BatchReport, ItemOutcome, ItemReport, TileOutcome};
use super::request::{HarvestRequest, Identifier};
use super::stats::{HarvestStats, HarvestStatsSnapshot};
use crate::config::HarvestConfig;
use crate::coord::{coordinate_to_tile, TileCoord, MAX_ZOOM};
use crate::imagery::{JpegReencoder, TileEncoder};
use crate::provider::AsyncProvider;
use crate::store::{StoreError, TileStore};

/// Log a progress line every this many finished items.
const PROGRESS_INTERVAL: u64 = 100;

/// Called after every finished item with the batch counters so far and
/// the batch size. Items skipped after a stop do not trigger it.
pub type HarvestProgressCallback = Arc<dyn Fn(HarvestStatsSnapshot, usize) + Send + Sync>;

/// Errors that prevent a harvester from being built.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("zoom level {zoom} not supported by {provider} (supported: {min}-{max})")]
    UnsupportedZoom {
        zoom: u8,
        provider: String,
        min: u8,
        max: u8,
    },
}

/// Harvests one tile per item into the output directory.
///
/// For each item the harvester computes the tile address, checks for an
/// existing artifact, downloads the tile when missing, re-encodes it as
/// JPEG and writes it atomically. Failures are returned per item and never
/// abort a batch.
///
/// # Example
///
/// ```ignore
/// let config = HarvestConfig::new().with_output_dir("property_visuals");
/// let provider = create_provider(&config)?;
/// let harvester = TileHarvester::new(config, provider)?;
///
/// let report = harvester.harvest_batch(requests, &CancellationToken::new()).await;
/// println!("{}/{} tiles", report.succeeded, report.total);
/// ```
pub struct TileHarvester<P: AsyncProvider> {
    config: HarvestConfig,
    provider: P,
    store: TileStore,
    encoder: Arc<dyn TileEncoder>,
    locks: IdentifierLocks,
    progress: Option<HarvestProgressCallback>,
}

impl<P: AsyncProvider> TileHarvester<P> {
    /// Creates a harvester and its output directory.
    ///
    /// Creating the directory is idempotent. The zoom level is checked
    /// against the provider here so a bad configuration fails once instead
    /// of once per item.
    pub fn new(config: HarvestConfig, provider: P) -> Result<Self, SetupError> {
        let zoom = config.zoom();
        if zoom > MAX_ZOOM || !provider.supports_zoom(zoom) {
            return Err(SetupError::UnsupportedZoom {
                zoom,
                provider: provider.name().to_string(),
                min: provider.min_zoom(),
                max: provider.max_zoom().min(MAX_ZOOM),
            });
        }

        let store = TileStore::open(config.output_dir())?;
        let encoder = Arc::new(JpegReencoder::new(config.jpeg_quality()));

        info!(
            output_dir = %config.output_dir().display(),
            zoom,
            provider = provider.name(),
            workers = config.workers(),
            "Tile harvester ready"
        );

        Ok(Self {
            config,
            provider,
            store,
            encoder,
            locks: IdentifierLocks::new(),
            progress: None,
        })
    }

    /// Replaces the image encoder. Its output is written as the `.jpg`
    /// artifact unchanged.
    pub fn with_encoder(mut self, encoder: Arc<dyn TileEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Reports batch progress after each finished item.
    pub fn with_progress(mut self, callback: HarvestProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Harvests a single item.
    ///
    /// Returns `Cached` without any request when the artifact exists,
    /// `Fetched` after a successful download and write, or the failure
    /// with its cause. A failure never leaves a file at the artifact path.
    pub async fn harvest_one(&self, request: &HarvestRequest) -> Result<TileOutcome, HarvestError> {
        self.harvest_item(request).await.1
    }

    /// Harvests every item and reports per-item outcomes in input order.
    ///
    /// Up to `workers` items run at once. No item failure stops the batch.
    /// Once `cancel` fires, items that have not started are reported as
    /// `Skipped` while in-flight items finish (each bounded by the fetch
    /// timeout). A persistence failure stops the batch the same way when
    /// `stop_on_persistence_error` is set; the caller's token is left
    /// untouched.
    pub async fn harvest_batch<I>(&self, requests: I, cancel: &CancellationToken) -> BatchReport
    where
        I: IntoIterator<Item = HarvestRequest>,
    {
        let requests: Vec<HarvestRequest> = requests.into_iter().collect();
        let total = requests.len();
        let stop = cancel.child_token();
        let stats = HarvestStats::new();

        info!(total, workers = self.config.workers(), "Starting harvest");

        let mut results: Vec<(usize, ItemReport)> = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| {
                let stop = &stop;
                let stats = &stats;
                async move { (index, self.run_item(request, total, stop, stats).await) }
            })
            .buffer_unordered(self.config.workers())
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);
        let items = results.into_iter().map(|(_, item)| item).collect();

        let snapshot = stats.snapshot();
        let report = BatchReport::new(total, &snapshot, stop.is_cancelled(), items);

        if report.persistence_failures > 0 {
            error!(
                kind = "persistence",
                persistence_failures = report.persistence_failures,
                "Harvest hit local write failures"
            );
        }
        info!(
            total = report.total,
            succeeded = report.succeeded,
            cached = report.cached,
            fetched = report.fetched,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Harvest finished"
        );

        report
    }

    async fn run_item(
        &self,
        request: HarvestRequest,
        total: usize,
        stop: &CancellationToken,
        stats: &HarvestStats,
    ) -> ItemReport {
        if stop.is_cancelled() {
            stats.record_skipped();
            debug!(identifier = %request.identifier, "Harvest stopped, item skipped");
            return ItemReport {
                identifier: request.identifier,
                tile: None,
                outcome: ItemOutcome::Skipped,
            };
        }

        let (tile, result) = self.harvest_item(&request).await;
        stats.record(&result);

        if let Err(e) = &result {
            if e.is_persistence() && self.config.stop_on_persistence_error() && !stop.is_cancelled()
            {
                error!(
                    identifier = %request.identifier,
                    kind = "persistence",
                    error = %e,
                    "Stopping harvest after persistence failure"
                );
                stop.cancel();
            }
        }

        let snapshot = stats.snapshot();
        if let Some(progress) = &self.progress {
            progress(snapshot, total);
        }
        let processed = snapshot.processed();
        if processed % PROGRESS_INTERVAL == 0 {
            info!(processed, total, "Harvest progress");
        }

        ItemReport {
            identifier: request.identifier,
            tile,
            outcome: result.into(),
        }
    }

    async fn harvest_item(
        &self,
        request: &HarvestRequest,
    ) -> (Option<TileCoord>, Result<TileOutcome, HarvestError>) {
        let identifier = &request.identifier;

        let tile = match coordinate_to_tile(&request.coordinate, self.config.zoom()) {
            Ok(tile) => tile,
            Err(e) => {
                warn!(
                    identifier = %identifier,
                    coordinate = %request.coordinate,
                    kind = "addressing",
                    error = %e,
                    "Cannot address tile"
                );
                return (None, Err(e.into()));
            }
        };

        let result = self.fetch_and_store(identifier, &tile).await;
        match &result {
            Ok(outcome) => {
                debug!(identifier = %identifier, tile = %tile, outcome = ?outcome, "Item done")
            }
            Err(e) if e.is_persistence() => error!(
                identifier = %identifier,
                tile = %tile,
                kind = "persistence",
                error = %e,
                "Failed to persist tile"
            ),
            Err(e) if e.kind() == ErrorKind::Internal => error!(
                identifier = %identifier,
                tile = %tile,
                kind = "internal",
                error = %e,
                "Internal failure while harvesting tile"
            ),
            Err(e) => warn!(
                identifier = %identifier,
                tile = %tile,
                kind = e.kind().as_str(),
                error = %e,
                "Tile harvest failed"
            ),
        }

        (Some(tile), result)
    }

    // Cache check, fetch and write run under the identifier's lock so two
    // items naming the same artifact never both download it.
    async fn fetch_and_store(
        &self,
        identifier: &Identifier,
        tile: &TileCoord,
    ) -> Result<TileOutcome, HarvestError> {
        let _guard = self.locks.lock(identifier).await;

        if self.store.contains(identifier.as_str()).await? {
            debug!(identifier = %identifier, "Artifact exists, skipping download");
            return Ok(TileOutcome::Cached);
        }

        let url = self.provider.tile_url(tile);
        let timeout = self.config.timeout();
        debug!(identifier = %identifier, url = %url, "Downloading tile");

        let data = match tokio::time::timeout(timeout, self.provider.download_tile(tile)).await {
            Ok(Ok(data)) => data,
            Ok(Err(e)) => return Err(HarvestError::from_provider(&url, e, timeout)),
            Err(_) => return Err(HarvestError::Timeout { url, timeout }),
        };

        let encoder = Arc::clone(&self.encoder);
        let jpeg = tokio::task::spawn_blocking(move || encoder.reencode(&data))
            .await
            .map_err(|e| HarvestError::Task(e.to_string()))?
            .map_err(|source| HarvestError::Decode {
                url: url.clone(),
                source,
            })?;

        let path = self.store.write(identifier.as_str(), &jpeg).await?;
        debug!(
            identifier = %identifier,
            path = %path.display(),
            bytes = jpeg.len(),
            "Tile written"
        );

        Ok(TileOutcome::Fetched { bytes: jpeg.len() })
    }
}
