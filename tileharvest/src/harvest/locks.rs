//! Per-identifier mutual exclusion.
//!
//! Two items sharing an identifier map to the same artifact path. Holding
//! the identifier's lock across cache check, fetch and write makes that
//! sequence atomic per path: the second holder finds the artifact and
//! reports `Cached` instead of fetching it again.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::request::Identifier;

/// Lazily created async locks keyed by identifier.
///
/// Entries are removed when their last holder releases them, so the map
/// only ever holds identifiers currently in flight.
#[derive(Debug, Default)]
pub struct IdentifierLocks {
    locks: DashMap<Identifier, Arc<Mutex<()>>>,
}

/// Held lock on one identifier. Releases on drop.
#[derive(Debug)]
pub struct IdentifierGuard<'a> {
    locks: &'a DashMap<Identifier, Arc<Mutex<()>>>,
    identifier: Identifier,
    guard: Option<OwnedMutexGuard<()>>,
}

impl IdentifierLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `identifier`.
    pub async fn lock(&self, identifier: &Identifier) -> IdentifierGuard<'_> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let mutex = Arc::clone(self.locks.entry(identifier.clone()).or_default().value());
        let guard = mutex.lock_owned().await;

        IdentifierGuard {
            locks: &self.locks,
            identifier: identifier.clone(),
            guard: Some(guard),
        }
    }

    /// Number of identifiers currently locked or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for IdentifierGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map's Arc is the only one left if no one waits.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.identifier, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
