//! Batch-wide harvest counters.
//!
//! Workers update these concurrently; every update is a single atomic
//! increment so no count is ever lost.

use std::sync::atomic::{AtomicU64, Ordering};

use super::error::HarvestError;
use super::outcome::TileOutcome;

/// Thread-safe counters for one batch.
#[derive(Debug, Default)]
pub struct HarvestStats {
    cached: AtomicU64,
    fetched: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    persistence_failures: AtomicU64,
    bytes_written: AtomicU64,
}

/// Snapshot of harvest statistics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStatsSnapshot {
    pub cached: u64,
    pub fetched: u64,
    pub failed: u64,
    pub skipped: u64,
    /// Subset of `failed`
    pub persistence_failures: u64,
    pub bytes_written: u64,
}

impl HarvestStatsSnapshot {
    /// Items that reached a terminal cached, fetched or failed state.
    pub fn processed(&self) -> u64 {
        self.cached + self.fetched + self.failed
    }

    pub fn succeeded(&self) -> u64 {
        self.cached + self.fetched
    }
}

impl HarvestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of one `harvest_one` call.
    pub fn record(&self, result: &Result<TileOutcome, HarvestError>) {
        match result {
            Ok(TileOutcome::Cached) => {
                self.cached.fetch_add(1, Ordering::Relaxed);
            }
            Ok(TileOutcome::Fetched { bytes }) => {
                self.fetched.fetch_add(1, Ordering::Relaxed);
                self.bytes_written
                    .fetch_add(*bytes as u64, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if e.is_persistence() {
                    self.persistence_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Record an item that was never started.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> HarvestStatsSnapshot {
        HarvestStatsSnapshot {
            cached: self.cached.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}
