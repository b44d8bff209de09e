use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one collection's `sync_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: u32,
    pub failed: u32,
    pub skipped: u32,
    pub session_expired: bool,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        self.failed == 0 && !self.session_expired
    }

    pub fn record_success(&mut self) {
        self.synced += 1;
    }

    pub fn record_failure(&mut self, context: String) {
        self.failed += 1;
        self.errors.push(context);
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionOutcome {
    pub collection: String,
    pub report: SyncReport,
}

/// Aggregate of one coordinator run across all collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRunSummary {
    pub collections: Vec<CollectionOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl SyncRunSummary {
    pub fn new(collections: Vec<CollectionOutcome>) -> Self {
        Self {
            collections,
            finished_at: Utc::now(),
        }
    }

    pub fn synced_total(&self) -> u32 {
        self.collections.iter().map(|c| c.report.synced).sum()
    }

    pub fn failed_total(&self) -> u32 {
        self.collections.iter().map(|c| c.report.failed).sum()
    }

    pub fn session_expired(&self) -> bool {
        self.collections.iter().any(|c| c.report.session_expired)
    }

    pub fn success(&self) -> bool {
        self.collections.iter().all(|c| c.report.success())
    }

    /// User-facing aggregate, never a raw error chain.
    pub fn message(&self) -> String {
        if self.session_expired() {
            return format!(
                "Session expired: {} synced, {} could not be sent. Sign in again to finish syncing.",
                self.synced_total(),
                self.failed_total()
            );
        }
        format!(
            "{} synced, {} failed",
            self.synced_total(),
            self.failed_total()
        )
    }
}

/// Snapshot of outstanding work, for UI badges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingCounts {
    pub per_collection: Vec<(String, u64)>,
    pub total: u64,
}
