//! Query helper utilities for common database patterns
//!
//! Consolidates the aggregate and collection patterns used by the
//! statistics queries:
//! - Row counts with an optional filter
//! - Aggregates where NULL falls back to a default
//! - Multi-row collection with a row mapper
//! - Grouped counts with percentages

use crate::errors::AppResult;
use crate::utils::math::safe_percentage;
use rusqlite::{Connection, Row};

/// Helper trait for common database query patterns
///
/// ```ignore
/// use crate::database::QueryHelper;
///
/// let pending = conn.count_rows("report_dirty_periods", Some("processed_at IS NULL"))?;
/// let latest = conn.safe_aggregate::<i64>("SELECT MAX(activity_at) FROM customer_activity", 0)?;
/// let per_report = conn.query_grouped_percentages(
///     "SELECT report_key, COUNT(*) FROM report_snapshots GROUP BY report_key"
/// )?;
/// ```
pub trait QueryHelper {
    /// `COUNT(*)` over a table, optionally filtered by a WHERE condition
    fn count_rows(&self, table: &str, where_clause: Option<&str>) -> AppResult<i64>;

    /// Single aggregate value; NULL (empty result set) becomes `default`
    fn safe_aggregate<T>(&self, sql: &str, default: T) -> AppResult<T>
    where
        T: rusqlite::types::FromSql + Copy;

    /// prepare() + query_map() + collect() in one call
    fn query_collect<T, F>(&self, sql: &str, mapper: F) -> AppResult<Vec<T>>
    where
        F: FnMut(&Row) -> rusqlite::Result<T>;

    /// `(category, count)` rows with each count's share of the total
    fn query_grouped_percentages(&self, sql: &str) -> AppResult<Vec<(String, usize, f64)>>;
}

impl QueryHelper for Connection {
    fn count_rows(&self, table: &str, where_clause: Option<&str>) -> AppResult<i64> {
        let sql = if let Some(where_part) = where_clause {
            format!("SELECT COUNT(*) FROM {} WHERE {}", table, where_part)
        } else {
            format!("SELECT COUNT(*) FROM {}", table)
        };

        self.query_row(&sql, [], |row| row.get(0))
            .map_err(Into::into)
    }

    fn safe_aggregate<T>(&self, sql: &str, default: T) -> AppResult<T>
    where
        T: rusqlite::types::FromSql + Copy,
    {
        let result: Option<T> = self.query_row(sql, [], |row| row.get(0))?;
        Ok(result.unwrap_or(default))
    }

    fn query_collect<T, F>(&self, sql: &str, mut mapper: F) -> AppResult<Vec<T>>
    where
        F: FnMut(&Row) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare(sql)?;
        let results = stmt
            .query_map([], &mut mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn query_grouped_percentages(&self, sql: &str) -> AppResult<Vec<(String, usize, f64)>> {
        // First pass: collect all rows and calculate total
        let mut stmt = self.prepare(sql)?;
        let rows: Vec<(String, i64)> = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let total: i64 = rows.iter().map(|(_, count)| count).sum();

        // Second pass: convert to results with percentages
        let results = rows
            .into_iter()
            .map(|(category, count)| {
                let percentage = safe_percentage(count as usize, total as usize);
                (category, count as usize, percentage)
            })
            .collect();

        Ok(results)
    }
}
