//! Report database schema
//!
//! ## Tables
//!
//! - `customer_activity`: append-only classification history. Each row is the
//!   metrics document of one customer effective from `activity_at` (Unix ms).
//! - `report_snapshots`: one delta document per (report key, period key, owner).
//!   Rows are replaced whole on recomputation, never merged.
//! - `report_dirty_periods`: periods whose source data changed since their
//!   snapshot was computed. `processed_at IS NULL` means pending.

use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use tracing::debug;

/// Current schema version written to `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// Create all tables and indexes if they do not exist
pub fn setup_schema(connection: &Connection) -> AppResult<()> {
    connection
        .execute_batch(
            r#"
        PRAGMA user_version = 1;

        -- ═══════════════════════════════════════════════════════════════════
        -- CLASSIFICATION SOURCE
        -- ═══════════════════════════════════════════════════════════════════

        CREATE TABLE IF NOT EXISTS customer_activity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            customer_id TEXT NOT NULL,
            activity_at INTEGER NOT NULL,
            metrics_json TEXT NOT NULL,
            recorded_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_activity_owner_customer_time
            ON customer_activity(owner_id, customer_id, activity_at);
        CREATE INDEX IF NOT EXISTS idx_activity_owner_time
            ON customer_activity(owner_id, activity_at);

        -- ═══════════════════════════════════════════════════════════════════
        -- DELTA SNAPSHOTS
        -- ═══════════════════════════════════════════════════════════════════

        CREATE TABLE IF NOT EXISTS report_snapshots (
            report_key TEXT NOT NULL,
            period_key TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            metrics_json TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            computed_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (report_key, period_key, owner_id)
        );

        CREATE INDEX IF NOT EXISTS idx_snapshots_owner_range
            ON report_snapshots(report_key, owner_id, period_key);

        -- ═══════════════════════════════════════════════════════════════════
        -- DIRTY PERIOD QUEUE
        -- ═══════════════════════════════════════════════════════════════════

        CREATE TABLE IF NOT EXISTS report_dirty_periods (
            report_key TEXT NOT NULL,
            period_key TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            marked_at INTEGER NOT NULL,
            processed_at INTEGER,
            PRIMARY KEY (report_key, period_key, owner_id)
        );

        CREATE INDEX IF NOT EXISTS idx_dirty_pending
            ON report_dirty_periods(processed_at, marked_at);
        "#,
        )
        .map_err(AppError::Database)?;

    debug!("Schema version {} ready", SCHEMA_VERSION);
    Ok(())
}
