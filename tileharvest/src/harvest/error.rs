//! Error taxonomy for harvesting a single item.
//!
//! Every failure keeps its cause. The batch loop converts these into
//! per-item `Failed` outcomes; only [`ErrorKind::Persistence`] may stop a
//! batch, and only when configured to.

use crate::coord::CoordError;
use crate::imagery::ImageryError;
use crate::provider::ProviderError;
use crate::store::StoreError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Coarse failure class, for counting and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The coordinate cannot be turned into a tile address
    Addressing,
    /// Network-layer failure, including timeouts
    Transport,
    /// The server answered with a status other than 200
    RemoteStatus,
    /// The body was not a decodable image, or re-encoding failed
    Decode,
    /// The artifact could not be checked or written locally
    Persistence,
    /// A fault inside the harvester itself, unrelated to the item
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Addressing => "addressing",
            ErrorKind::Transport => "transport",
            ErrorKind::RemoteStatus => "remote_status",
            ErrorKind::Decode => "decode",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why harvesting one item failed.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("cannot address tile: {0}")]
    Addressing(#[from] CoordError),

    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("fetching {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP {status} from {url}")]
    RemoteStatus { url: String, status: u16 },

    #[error("invalid image from {url}: {source}")]
    Decode { url: String, source: ImageryError },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// The blocking re-encode task panicked or was cancelled. The payload
    /// was never judged, so this is not a decode failure.
    #[error("re-encode task failed: {0}")]
    Task(String),
}

impl HarvestError {
    /// Returns the failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarvestError::Addressing(_) => ErrorKind::Addressing,
            HarvestError::Transport { .. } | HarvestError::Timeout { .. } => ErrorKind::Transport,
            HarvestError::RemoteStatus { .. } => ErrorKind::RemoteStatus,
            HarvestError::Decode { .. } => ErrorKind::Decode,
            HarvestError::Persistence(_) => ErrorKind::Persistence,
            HarvestError::Task(_) => ErrorKind::Internal,
        }
    }

    /// Persistence failures point at the environment (disk full,
    /// permissions) rather than at the item.
    pub fn is_persistence(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    /// Maps a provider failure for `url` into the harvest taxonomy.
    pub(crate) fn from_provider(url: &str, error: ProviderError, timeout: Duration) -> Self {
        match error {
            ProviderError::HttpStatus { status, .. } => HarvestError::RemoteStatus {
                url: url.to_string(),
                status,
            },
            ProviderError::Timeout(_) => HarvestError::Timeout {
                url: url.to_string(),
                timeout,
            },
            ProviderError::UnsupportedZoom(zoom) => {
                HarvestError::Addressing(CoordError::InvalidZoom(zoom))
            }
            ProviderError::Transport(message) | ProviderError::ClientBuild(message) => {
                HarvestError::Transport {
                    url: url.to_string(),
                    message,
                }
            }
        }
    }
}
