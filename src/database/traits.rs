//! Database trait abstractions
//!
//! Each area of the report engine talks to storage through one trait:
//! the classification source, the snapshot store, the dirty-period queue
//! and statistics. `Database` implements all of them; tests substitute
//! their own implementations where a failing source is needed.

use crate::database::statistics::DatabaseStats;
use crate::errors::AppResult;
use crate::types::{ActivityRecord, DeltaDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Customer activity history - the classification source
pub trait ActivityOperations {
    /// Append activity records in one transaction, returning the number written
    fn insert_activity_batch(&mut self, records: &[ActivityRecord]) -> AppResult<usize>;

    /// Latest metrics document per customer effective at or before `at_or_before_ms`
    ///
    /// Ties on `activity_at` resolve to the most recently recorded row.
    fn latest_metrics_at(
        &self,
        owner_id: &str,
        at_or_before_ms: i64,
    ) -> AppResult<HashMap<String, Value>>;

    /// Full history of one customer, oldest first
    fn customer_history(&self, owner_id: &str, customer_id: &str) -> AppResult<Vec<ActivityRecord>>;

    /// Distinct owners with any activity
    fn list_owners(&self) -> AppResult<Vec<String>>;

    /// Timestamp of the owner's first activity, `None` when there is none
    fn earliest_activity_at(&self, owner_id: &str) -> AppResult<Option<i64>>;
}

/// Delta snapshot persistence
pub trait SnapshotOperations {
    /// Insert or replace the document for its key, stamping computed/updated time
    /// and keeping the original created time; returns the stored document
    fn upsert_snapshot(&self, document: &DeltaDocument) -> AppResult<DeltaDocument>;

    /// A single snapshot, `None` when absent
    fn get_snapshot(
        &self,
        report_key: &str,
        period_key: &str,
        owner_id: &str,
    ) -> AppResult<Option<DeltaDocument>>;

    /// Snapshots with period keys in `[from_key, to_key]`, ascending by period key
    fn find_snapshots(
        &self,
        report_key: &str,
        owner_id: &str,
        from_key: &str,
        to_key: &str,
    ) -> AppResult<Vec<DeltaDocument>>;
}

/// A period waiting for recomputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirtyPeriod {
    pub report_key: String,
    pub period_key: String,
    pub owner_id: String,
    /// Unix milliseconds
    pub marked_at: i64,
}

/// Dirty-period queue
pub trait DirtyPeriodOperations {
    /// Mark a period dirty; re-marking an already processed period re-queues it
    fn mark_dirty(&self, report_key: &str, period_key: &str, owner_id: &str) -> AppResult<()>;

    /// Pending periods, oldest mark first
    fn unprocessed_dirty_periods(&self, limit: usize) -> AppResult<Vec<DirtyPeriod>>;

    /// Mark a claimed period processed
    ///
    /// Returns false when the period was marked again after it was claimed;
    /// it then stays pending for the next run.
    fn set_dirty_processed(&self, period: &DirtyPeriod) -> AppResult<bool>;

    fn count_unprocessed_dirty_periods(&self) -> AppResult<u64>;
}

/// Statistics and reporting operations
pub trait StatisticsOperations {
    fn get_database_stats(&self) -> AppResult<DatabaseStats>;
}
