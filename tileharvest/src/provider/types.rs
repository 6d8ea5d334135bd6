//! Provider types and traits

use crate::coord::TileCoord;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Network-layer failure (connection refused, DNS, reset, body read)
    #[error("transport error: {0}")]
    Transport(String),
    /// The request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The server answered with something other than 200 OK
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },
    /// Zoom level not supported by this provider
    #[error("zoom level {0} not supported by provider")]
    UnsupportedZoom(u8),
    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl ProviderError {
    /// Returns true when the failure is a non-200 answer rather than a
    /// network-layer problem.
    pub fn is_status(&self) -> bool {
        matches!(self, ProviderError::HttpStatus { .. })
    }
}

/// Async trait for imagery tile providers.
///
/// A provider knows how to turn a [`TileCoord`] into a remote locator and
/// fetch the raw (still compressed) image bytes from it.
pub trait AsyncProvider: Send + Sync {
    /// Builds the remote locator for a tile.
    fn tile_url(&self, tile: &TileCoord) -> String;

    /// Downloads one tile image asynchronously.
    ///
    /// Exactly one request is made; retries are the caller's business.
    ///
    /// # Returns
    ///
    /// Raw image data as served (JPEG, PNG, ...) or an error.
    fn download_tile(
        &self,
        tile: &TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}
