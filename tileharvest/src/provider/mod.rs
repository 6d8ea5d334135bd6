//! Imagery provider abstraction
//!
//! This module provides the traits that separate the harvester from the
//! network: [`AsyncHttpClient`] is the raw transport and [`AsyncProvider`]
//! turns a tile address into a remote request.
//!
//! ```ignore
//! use tileharvest::provider::{ArcGisProvider, AsyncReqwestClient};
//!
//! let http_client = AsyncReqwestClient::with_timeout(Duration::from_secs(12))?;
//! let provider = ArcGisProvider::new(http_client);
//! ```

mod arcgis;
mod factory;
mod http;
mod types;

pub use arcgis::{ArcGisProvider, WORLD_IMAGERY_URL};
pub use factory::{create_provider, with_config_headers, USER_AGENT_HEADER};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT};
pub use types::{AsyncProvider, ProviderError};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
