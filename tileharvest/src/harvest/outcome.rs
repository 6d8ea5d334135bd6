//! Per-item outcomes and the batch report.

use super::error::{ErrorKind, HarvestError};
use super::request::Identifier;
use super::stats::HarvestStatsSnapshot;
use crate::coord::TileCoord;

/// Successful result of harvesting one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    /// The artifact already existed; no request was made
    Cached,
    /// The tile was downloaded and written; `bytes` is the artifact size
    Fetched { bytes: usize },
}

/// Terminal state of one item in a batch.
#[derive(Debug)]
pub enum ItemOutcome {
    Cached,
    Fetched { bytes: usize },
    Failed(HarvestError),
    /// Never started because the batch was cancelled
    Skipped,
}

impl ItemOutcome {
    /// True for `Cached` and `Fetched`.
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Cached | ItemOutcome::Fetched { .. })
    }

    /// The failure, if this item failed.
    pub fn error(&self) -> Option<&HarvestError> {
        match self {
            ItemOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Short label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Cached => "cached",
            ItemOutcome::Fetched { .. } => "fetched",
            ItemOutcome::Failed(_) => "failed",
            ItemOutcome::Skipped => "skipped",
        }
    }
}

impl From<Result<TileOutcome, HarvestError>> for ItemOutcome {
    fn from(result: Result<TileOutcome, HarvestError>) -> Self {
        match result {
            Ok(TileOutcome::Cached) => ItemOutcome::Cached,
            Ok(TileOutcome::Fetched { bytes }) => ItemOutcome::Fetched { bytes },
            Err(e) => ItemOutcome::Failed(e),
        }
    }
}

/// What happened to one input item.
#[derive(Debug)]
pub struct ItemReport {
    pub identifier: Identifier,
    /// `None` when the coordinate could not be addressed or the item was skipped
    pub tile: Option<TileCoord>,
    pub outcome: ItemOutcome,
}

/// Result of a batch run.
///
/// `succeeded` counts `Cached` and `Fetched` items, `processed` adds
/// `Failed` ones, and `total` further adds items skipped after
/// cancellation. `items` is in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub cached: usize,
    pub fetched: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Subset of `failed` caused by local write failures
    pub persistence_failures: usize,
    /// Bytes of artifacts written during this run
    pub bytes_written: u64,
    /// Whether the run was stopped before every item started
    pub cancelled: bool,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub(crate) fn new(
        total: usize,
        stats: &HarvestStatsSnapshot,
        cancelled: bool,
        items: Vec<ItemReport>,
    ) -> Self {
        let cached = stats.cached as usize;
        let fetched = stats.fetched as usize;
        let failed = stats.failed as usize;
        Self {
            total,
            processed: cached + fetched + failed,
            succeeded: cached + fetched,
            cached,
            fetched,
            failed,
            skipped: stats.skipped as usize,
            persistence_failures: stats.persistence_failures as usize,
            bytes_written: stats.bytes_written,
            cancelled,
            items,
        }
    }

    /// Items that failed, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed(_)))
    }

    /// Number of failures of the given kind.
    pub fn failures_of(&self, kind: ErrorKind) -> usize {
        self.failures()
            .filter(|item| item.outcome.error().map(|e| e.kind()) == Some(kind))
            .count()
    }

    /// True when every item succeeded.
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoordError;

    #[test]
    fn test_outcome_from_result() {
        assert!(matches!(
            ItemOutcome::from(Ok(TileOutcome::Cached)),
            ItemOutcome::Cached
        ));
        assert!(matches!(
            ItemOutcome::from(Ok(TileOutcome::Fetched { bytes: 10 })),
            ItemOutcome::Fetched { bytes: 10 }
        ));

        let failed = ItemOutcome::from(Err(HarvestError::from(CoordError::InvalidLatitude(
            90.0,
        ))));
        assert!(!failed.is_success());
        assert_eq!(failed.error().map(|e| e.kind()), Some(ErrorKind::Addressing));
        assert_eq!(failed.label(), "failed");
    }

    #[test]
    fn test_report_counts() {
        let snapshot = HarvestStatsSnapshot {
            cached: 2,
            fetched: 3,
            failed: 1,
            skipped: 4,
            persistence_failures: 0,
            bytes_written: 300,
        };
        let items = vec![ItemReport {
            identifier: Identifier::from_index(0),
            tile: None,
            outcome: ItemOutcome::Failed(HarvestError::from(CoordError::InvalidLatitude(-90.0))),
        }];

        let report = BatchReport::new(10, &snapshot, true, items);
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.processed, 6);
        assert_eq!(report.skipped, 4);
        assert!(report.cancelled);
        assert!(!report.is_complete());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.failures_of(ErrorKind::Addressing), 1);
        assert_eq!(report.failures_of(ErrorKind::Transport), 0);
    }
}
