//! Provider construction from a harvest configuration.
//!
//! Keeps CLI code free of HTTP client and header wiring.

use super::arcgis::ArcGisProvider;
use super::http::AsyncReqwestClient;
use super::types::ProviderError;
use crate::config::HarvestConfig;

/// Header carrying the client identifier.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Creates the production provider described by `config`.
///
/// The HTTP client enforces `config.timeout()` on every request, and every
/// request carries the configured `User-Agent` followed by any extra
/// headers.
pub fn create_provider(
    config: &HarvestConfig,
) -> Result<ArcGisProvider<AsyncReqwestClient>, ProviderError> {
    let client = AsyncReqwestClient::with_timeout(config.timeout())?;
    Ok(with_config_headers(
        ArcGisProvider::with_base_url(client, config.base_url()),
        config,
    ))
}

/// Applies the configured headers to an already built provider.
pub fn with_config_headers<C: super::AsyncHttpClient>(
    provider: ArcGisProvider<C>,
    config: &HarvestConfig,
) -> ArcGisProvider<C> {
    provider
        .with_header(USER_AGENT_HEADER, config.user_agent())
        .with_headers(config.headers().iter().cloned())
}
