//! Dirty-period queue operations.
//!
//! A period is pending while `processed_at IS NULL`. Marking always resets
//! `processed_at` and moves `marked_at` forward; clearing only succeeds if
//! nobody re-marked the period after the worker claimed it.

use crate::database::traits::{DirtyPeriod, DirtyPeriodOperations};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::utils::time::now_millis;
use rusqlite::params;
use tracing::debug;

impl DirtyPeriodOperations for Database {
    fn mark_dirty(&self, report_key: &str, period_key: &str, owner_id: &str) -> AppResult<()> {
        // max() keeps marked_at monotonic when two marks land in the same millisecond
        self.connection()
            .execute(
                r#"
                INSERT INTO report_dirty_periods
                    (report_key, period_key, owner_id, marked_at, processed_at)
                VALUES (?1, ?2, ?3, ?4, NULL)
                ON CONFLICT (report_key, period_key, owner_id) DO UPDATE SET
                    marked_at = max(excluded.marked_at, report_dirty_periods.marked_at + 1),
                    processed_at = NULL
                "#,
                params![report_key, period_key, owner_id, now_millis()],
            )
            .map_err(AppError::Database)?;

        debug!("Marked {}/{} dirty for {}", report_key, period_key, owner_id);
        Ok(())
    }

    fn unprocessed_dirty_periods(&self, limit: usize) -> AppResult<Vec<DirtyPeriod>> {
        let mut stmt = self
            .connection()
            .prepare(
                r#"
                SELECT report_key, period_key, owner_id, marked_at
                FROM report_dirty_periods
                WHERE processed_at IS NULL
                ORDER BY marked_at ASC, report_key, period_key, owner_id
                LIMIT ?1
                "#,
            )
            .map_err(AppError::Database)?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(DirtyPeriod {
                    report_key: row.get(0)?,
                    period_key: row.get(1)?,
                    owner_id: row.get(2)?,
                    marked_at: row.get(3)?,
                })
            })
            .map_err(AppError::Database)?;

        let mut periods = Vec::new();
        for row in rows {
            periods.push(row.map_err(AppError::Database)?);
        }
        Ok(periods)
    }

    fn set_dirty_processed(&self, period: &DirtyPeriod) -> AppResult<bool> {
        let updated = self
            .connection()
            .execute(
                r#"
                UPDATE report_dirty_periods
                SET processed_at = ?5
                WHERE report_key = ?1 AND period_key = ?2 AND owner_id = ?3
                  AND processed_at IS NULL
                  AND marked_at <= ?4
                "#,
                params![
                    period.report_key,
                    period.period_key,
                    period.owner_id,
                    period.marked_at,
                    now_millis()
                ],
            )
            .map_err(AppError::Database)?;

        Ok(updated > 0)
    }

    fn count_unprocessed_dirty_periods(&self) -> AppResult<u64> {
        let count: i64 = self
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM report_dirty_periods WHERE processed_at IS NULL",
                [],
                |row| row.get(0),
            )
            .map_err(AppError::Database)?;
        Ok(count as u64)
    }
}
