//! Activity history operations.
//!
//! Rows are append-only. The state of a customer at time T is the metrics
//! document of its latest row with `activity_at <= T`; ties on
//! `activity_at` go to the row recorded last (highest `id`).

use crate::database::traits::ActivityOperations;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::types::ActivityRecord;
use rusqlite::params;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

fn parse_metrics(column: usize, json: &str) -> rusqlite::Result<Value> {
    serde_json::from_str(json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl ActivityOperations for Database {
    fn insert_activity_batch(&mut self, records: &[ActivityRecord]) -> AppResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.execute_transaction(|tx| {
            let mut stmt = tx.prepare_cached(
                r#"INSERT INTO customer_activity
                   (owner_id, customer_id, activity_at, metrics_json)
                   VALUES (?1, ?2, ?3, ?4)"#,
            )?;

            for record in records {
                let metrics_json = serde_json::to_string(&record.metrics)?;
                stmt.execute(params![
                    record.owner_id,
                    record.customer_id,
                    record.activity_at,
                    metrics_json
                ])?;
            }

            debug!("Inserted batch of {} activity records", records.len());
            Ok(records.len())
        })
    }

    fn latest_metrics_at(
        &self,
        owner_id: &str,
        at_or_before_ms: i64,
    ) -> AppResult<HashMap<String, Value>> {
        let mut stmt = self
            .connection()
            .prepare(
                r#"
                SELECT customer_id, metrics_json
                FROM (
                    SELECT customer_id, metrics_json,
                           ROW_NUMBER() OVER (
                               PARTITION BY customer_id
                               ORDER BY activity_at DESC, id DESC
                           ) AS rn
                    FROM customer_activity
                    WHERE owner_id = ?1 AND activity_at <= ?2
                )
                WHERE rn = 1
                "#,
            )
            .map_err(AppError::Database)?;

        let rows = stmt
            .query_map(params![owner_id, at_or_before_ms], |row| {
                let customer_id: String = row.get(0)?;
                let json: String = row.get(1)?;
                Ok((customer_id, parse_metrics(1, &json)?))
            })
            .map_err(AppError::Database)?;

        let mut states = HashMap::new();
        for row in rows {
            let (customer_id, metrics) = row.map_err(AppError::Database)?;
            states.insert(customer_id, metrics);
        }

        debug!(
            "Loaded {} customer states for {} at {}",
            states.len(),
            owner_id,
            at_or_before_ms
        );
        Ok(states)
    }

    fn customer_history(&self, owner_id: &str, customer_id: &str) -> AppResult<Vec<ActivityRecord>> {
        let mut stmt = self
            .connection()
            .prepare(
                r#"
                SELECT owner_id, customer_id, activity_at, metrics_json
                FROM customer_activity
                WHERE owner_id = ?1 AND customer_id = ?2
                ORDER BY activity_at ASC, id ASC
                "#,
            )
            .map_err(AppError::Database)?;

        let rows = stmt
            .query_map(params![owner_id, customer_id], |row| {
                let json: String = row.get(3)?;
                Ok(ActivityRecord {
                    owner_id: row.get(0)?,
                    customer_id: row.get(1)?,
                    activity_at: row.get(2)?,
                    metrics: parse_metrics(3, &json)?,
                })
            })
            .map_err(AppError::Database)?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row.map_err(AppError::Database)?);
        }
        Ok(history)
    }

    fn list_owners(&self) -> AppResult<Vec<String>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT DISTINCT owner_id FROM customer_activity ORDER BY owner_id")
            .map_err(AppError::Database)?;

        let owners = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(AppError::Database)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(owners)
    }

    fn earliest_activity_at(&self, owner_id: &str) -> AppResult<Option<i64>> {
        self.connection()
            .query_row(
                "SELECT MIN(activity_at) FROM customer_activity WHERE owner_id = ?1",
                params![owner_id],
                |row| -> rusqlite::Result<Option<i64>> { row.get(0) },
            )
            .map_err(AppError::Database)
    }
}
