//! ArcGIS MapServer tile provider.
//!
//! Fetches tiles from an ArcGIS REST `MapServer/tile` endpoint, by default
//! Esri World Imagery. No API key is required.
//!
//! # URL Pattern
//!
//! `{base_url}/{zoom}/{y}/{x}`
//!
//! The row (`y`) precedes the column (`x`) in the path. This ordering is part
//! of the ArcGIS REST protocol and differs from the usual XYZ `{z}/{x}/{y}`.

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, AsyncProvider, ProviderError};

/// Esri World Imagery tile endpoint.
pub const WORLD_IMAGERY_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile";

/// Deepest level published by World Imagery.
const ARCGIS_MAX_ZOOM: u8 = 23;

/// Async ArcGIS tile provider.
///
/// Every request carries the configured header set (a descriptive
/// `User-Agent` at minimum).
///
/// # Example
///
/// ```ignore
/// use tileharvest::provider::{ArcGisProvider, AsyncReqwestClient};
///
/// let client = AsyncReqwestClient::new()?;
/// let provider = ArcGisProvider::new(client)
///     .with_header("User-Agent", "GeospatialResearchBot/1.1");
/// ```
pub struct ArcGisProvider<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl<C: AsyncHttpClient> ArcGisProvider<C> {
    /// Creates a provider pointed at Esri World Imagery.
    pub fn new(http_client: C) -> Self {
        Self::with_base_url(http_client, WORLD_IMAGERY_URL)
    }

    /// Creates a provider for any ArcGIS-style `MapServer/tile` endpoint.
    ///
    /// A trailing `/` on `base_url` is ignored.
    pub fn with_base_url(http_client: C, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http_client,
            base_url,
            headers: Vec::new(),
        }
    }

    /// Adds a header sent with every tile request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers sent with every tile request.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Returns the endpoint tiles are requested from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl<C: AsyncHttpClient> AsyncProvider for ArcGisProvider<C> {
    fn tile_url(&self, tile: &TileCoord) -> String {
        format!("{}/{}/{}/{}", self.base_url, tile.zoom, tile.y, tile.x)
    }

    async fn download_tile(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        if !self.supports_zoom(tile.zoom) {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }

        let url = self.tile_url(tile);
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        self.http_client.get_with_headers(&url, &headers).await
    }

    fn name(&self) -> &str {
        "ArcGIS"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        ARCGIS_MAX_ZOOM
    }
}
