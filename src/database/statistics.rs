//! Statistics and reporting operations.

use crate::database::query_helper::QueryHelper;
use crate::database::traits::StatisticsOperations;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use serde::Serialize;

/// Database statistics for reporting
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub activity_records: usize,
    pub distinct_customers: usize,
    pub owners: usize,
    /// Unix milliseconds
    pub earliest_activity_at: Option<i64>,
    pub latest_activity_at: Option<i64>,
    pub snapshots: usize,
    /// `(report key, snapshot count, share of all snapshots)`
    pub snapshots_by_report: Vec<(String, usize, f64)>,
    pub dirty_pending: usize,
    pub dirty_processed: usize,
}

impl DatabaseStats {
    pub fn has_pending_work(&self) -> bool {
        self.dirty_pending > 0
    }
}

impl StatisticsOperations for Database {
    fn get_database_stats(&self) -> AppResult<DatabaseStats> {
        let conn = self.connection();

        let activity_records = conn.count_rows("customer_activity", None)? as usize;

        let distinct_customers: usize = conn
            .query_row(
                "SELECT COUNT(*) FROM (SELECT DISTINCT owner_id, customer_id FROM customer_activity)",
                [],
                |row| row.get(0),
            )
            .map_err(AppError::Database)?;

        let owners: usize = conn
            .query_row(
                "SELECT COUNT(DISTINCT owner_id) FROM customer_activity",
                [],
                |row| row.get(0),
            )
            .map_err(AppError::Database)?;

        let earliest_activity_at: Option<i64> = conn
            .query_row(
                "SELECT MIN(activity_at) FROM customer_activity",
                [],
                |row| -> rusqlite::Result<Option<i64>> { row.get(0) },
            )
            .map_err(AppError::Database)?;

        let latest_activity_at: Option<i64> = conn
            .query_row(
                "SELECT MAX(activity_at) FROM customer_activity",
                [],
                |row| -> rusqlite::Result<Option<i64>> { row.get(0) },
            )
            .map_err(AppError::Database)?;

        let snapshots = conn.count_rows("report_snapshots", None)? as usize;
        let snapshots_by_report = conn.query_grouped_percentages(
            "SELECT report_key, COUNT(*) FROM report_snapshots GROUP BY report_key ORDER BY report_key",
        )?;

        let dirty_pending =
            conn.count_rows("report_dirty_periods", Some("processed_at IS NULL"))? as usize;
        let dirty_processed =
            conn.count_rows("report_dirty_periods", Some("processed_at IS NOT NULL"))? as usize;

        Ok(DatabaseStats {
            activity_records,
            distinct_customers,
            owners,
            earliest_activity_at,
            latest_activity_at,
            snapshots,
            snapshots_by_report,
            dirty_pending,
            dirty_processed,
        })
    }
}
