//! Snapshot store operations.
//!
//! The flows body is stored as JSON next to its SHA-256 fingerprint. An
//! upsert is one `INSERT ... ON CONFLICT DO UPDATE` statement, so concurrent
//! writers for the same key never observe a half-replaced row and the first
//! `created_at` survives every recomputation.

use crate::database::traits::SnapshotOperations;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::types::{DeltaDocument, PeriodFlows};
use crate::utils::time::now_seconds;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

const SELECT_COLUMNS: &str = "report_key, period_key, owner_id, metrics_json, content_hash, \
                              computed_at, created_at, updated_at";

fn document_from_row(row: &Row) -> rusqlite::Result<DeltaDocument> {
    let json: String = row.get(3)?;
    let flows: PeriodFlows = serde_json::from_str(&json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(DeltaDocument {
        report_key: row.get(0)?,
        period_key: row.get(1)?,
        owner_id: row.get(2)?,
        flows,
        content_hash: row.get(4)?,
        computed_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl SnapshotOperations for Database {
    fn upsert_snapshot(&self, document: &DeltaDocument) -> AppResult<DeltaDocument> {
        let metrics_json = serde_json::to_string(&document.flows)?;
        let content_hash = document.flows.fingerprint()?;
        let now = now_seconds();

        self.connection()
            .execute(
                r#"
                INSERT INTO report_snapshots
                    (report_key, period_key, owner_id, metrics_json, content_hash,
                     computed_at, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?6)
                ON CONFLICT (report_key, period_key, owner_id) DO UPDATE SET
                    metrics_json = excluded.metrics_json,
                    content_hash = excluded.content_hash,
                    computed_at = excluded.computed_at,
                    updated_at = excluded.updated_at
                "#,
                params![
                    document.report_key,
                    document.period_key,
                    document.owner_id,
                    metrics_json,
                    content_hash,
                    now
                ],
            )
            .map_err(AppError::Database)?;

        debug!(
            "Upserted snapshot {}/{} for {} ({})",
            document.report_key, document.period_key, document.owner_id, content_hash
        );

        self.get_snapshot(&document.report_key, &document.period_key, &document.owner_id)?
            .ok_or_else(|| {
                AppError::InvalidData(format!(
                    "snapshot {}/{} for {} missing after upsert",
                    document.report_key, document.period_key, document.owner_id
                ))
            })
    }

    fn get_snapshot(
        &self,
        report_key: &str,
        period_key: &str,
        owner_id: &str,
    ) -> AppResult<Option<DeltaDocument>> {
        let sql = format!(
            "SELECT {} FROM report_snapshots
             WHERE report_key = ?1 AND period_key = ?2 AND owner_id = ?3",
            SELECT_COLUMNS
        );

        self.connection()
            .query_row(&sql, params![report_key, period_key, owner_id], document_from_row)
            .optional()
            .map_err(AppError::Database)
    }

    fn find_snapshots(
        &self,
        report_key: &str,
        owner_id: &str,
        from_key: &str,
        to_key: &str,
    ) -> AppResult<Vec<DeltaDocument>> {
        let sql = format!(
            "SELECT {} FROM report_snapshots
             WHERE report_key = ?1 AND owner_id = ?2
               AND period_key >= ?3 AND period_key <= ?4
             ORDER BY period_key ASC",
            SELECT_COLUMNS
        );

        let mut stmt = self.connection().prepare(&sql).map_err(AppError::Database)?;
        let rows = stmt
            .query_map(params![report_key, owner_id, from_key, to_key], document_from_row)
            .map_err(AppError::Database)?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row.map_err(AppError::Database)?);
        }
        Ok(documents)
    }
}
