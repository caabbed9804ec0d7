//! Report Pipeline Integration Test
//!
//! Imports a week of activity from CSV, lets the dirty worker build every
//! snapshot it queued, then reads balances, trends and transitions back and
//! renders each of them in every output format.

use crate::common::clock::{at, end_of_day, JAN_06};
use crate::common::database::TestEngine;
use crate::common::fixtures::{activity, OWNER};
use crate::common::scenario::{CUSTOMERS, TOTAL_LTV};
use customer_flow_report::analysis::{BalanceStrategy, OutputFormat, ReportFormatter};
use customer_flow_report::database::{DirtyPeriodOperations, StatisticsOperations};
use customer_flow_report::processor::{ActivityImporter, DirtyWorker, ImportConfig};
use customer_flow_report::types::{ActivityRecord, BalanceSource, Dimension};
use std::path::Path;

fn week_of_activity() -> Vec<ActivityRecord> {
    vec![
        activity("c1", at(0, 10), "new", "active", 100.0),
        activity("c4", at(0, 11), "low", "active", 200.0),
        activity("c2", at(1, 10), "low", "active", 300.0),
        activity("c1", at(2, 10), "vip", "active", 5_000.0),
        activity("c3", at(3, 10), "vip", "inactive", 8_000.0),
        activity("c4", at(4, 10), "medium", "active", 200.0),
        activity("c4", at(4, 18), "low", "active", 200.0),
    ]
}

/// Write records in the import layout; the first row's timestamp is in seconds
fn write_activity_csv(path: &Path, records: &[ActivityRecord]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record(["owner_id", "customer_id", "activity_at", "metrics"])
        .unwrap();
    for (i, record) in records.iter().enumerate() {
        let activity_at = if i == 0 {
            record.activity_at / 1000
        } else {
            record.activity_at
        };
        writer
            .write_record([
                record.owner_id.clone(),
                record.customer_id.clone(),
                activity_at.to_string(),
                record.metrics.to_string(),
            ])
            .unwrap();
    }
    writer.flush().unwrap();
}

fn import(engine: &mut TestEngine, records: &[ActivityRecord]) -> customer_flow_report::processor::ImportStats {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("activity.csv");
    write_activity_csv(&csv_path, records);

    let config = ImportConfig {
        csv_path,
        batch_size: 2,
        progress_interval: 100,
        mark_dirty: true,
        strict: true,
    };
    ActivityImporter::new(config, &mut engine.engine)
        .unwrap()
        .import_file()
        .unwrap()
}

#[test]
fn test_import_worker_and_reports() {
    let mut engine = TestEngine::new("pipeline_full").unwrap();

    let stats = import(&mut engine, &week_of_activity());
    assert_eq!(stats.imported, 7);
    assert_eq!(stats.malformed, 0);
    assert_eq!(stats.batches, 4);
    // Five distinct days, four reports each
    assert_eq!(stats.dirty_marked, 20);
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 8);

    let run = DirtyWorker::new(&engine.engine, 3).run_once().unwrap();
    assert_eq!(run.recomputed, 8);
    assert_eq!(run.failed, 0);

    // The worker built the weekly snapshot, so the summed balance uses it
    let summed = engine
        .get_balance(
            OWNER,
            end_of_day(6),
            BalanceStrategy::Summed {
                from_ms: Some(JAN_06),
            },
        )
        .unwrap();
    let direct = engine
        .get_balance(OWNER, end_of_day(6), BalanceStrategy::Direct)
        .unwrap();

    assert!(matches!(
        &summed.source,
        BalanceSource::Summed { report_key, .. } if report_key == "customer_weekly"
    ));
    assert_eq!(summed.raw.total_customers, CUSTOMERS);
    assert_eq!(direct.raw.total_customers, CUSTOMERS);
    assert!((summed.raw.total_ltv - TOTAL_LTV).abs() < 1e-6);
    for dimension in Dimension::ALL {
        assert_eq!(summed.dimension_total(dimension), direct.dimension_total(dimension));
    }
    assert_eq!(summed.group_count(Dimension::ValueTier, "vip"), 2);

    let db_stats = engine.store().get_database_stats().unwrap();
    assert_eq!(db_stats.activity_records, 7);
    assert_eq!(db_stats.distinct_customers, 4);
    assert_eq!(db_stats.owners, 1);
    assert_eq!(db_stats.snapshots, 8);
    assert_eq!(db_stats.dirty_pending, 0);
    assert_eq!(db_stats.dirty_processed, 8);
    assert!(!db_stats.has_pending_work());
}

#[test]
fn test_every_report_renders_in_every_format() {
    let mut engine = TestEngine::new("pipeline_formats").unwrap();
    import(&mut engine, &week_of_activity());
    DirtyWorker::new(&engine.engine, 10).run_once().unwrap();

    let balance = engine
        .get_balance(OWNER, end_of_day(6), BalanceStrategy::Direct)
        .unwrap();
    let trend = engine
        .get_trend(OWNER, "customer_daily", "2025-01-06", "2025-01-10")
        .unwrap();
    let matrix = engine
        .get_transition_matrix(OWNER, "2025-01-06", "2025-01-08", None, Dimension::ValueTier, true)
        .unwrap();
    let changes = engine
        .get_group_changes(OWNER, "2025-01-06", "2025-01-08", None, Dimension::ValueTier)
        .unwrap();
    let stats = engine.store().get_database_stats().unwrap();

    assert_eq!(trend.snapshots.len(), 5);

    let console = OutputFormat::Console;
    assert!(ReportFormatter::format_balance(&balance, &console)
        .unwrap()
        .contains("BALANCE FOR"));
    assert!(ReportFormatter::format_trend(&trend, &console)
        .unwrap()
        .contains("2025-01-10"));
    assert!(ReportFormatter::format_transition_matrix(&matrix, &console)
        .unwrap()
        .contains("100.00%"));
    assert!(ReportFormatter::format_group_changes(&changes, &console)
        .unwrap()
        .contains("Upgraded (1)"));
    assert!(ReportFormatter::format_database_stats(&stats, &console)
        .unwrap()
        .contains("DATABASE STATISTICS"));

    let json: serde_json::Value = serde_json::from_str(
        &ReportFormatter::format_balance(&balance, &OutputFormat::Json).unwrap(),
    )
    .unwrap();
    assert_eq!(json["raw"]["totalCustomers"], 4);

    let trend_chart: serde_json::Value = serde_json::from_str(
        &ReportFormatter::format_trend(&trend, &OutputFormat::Plotly).unwrap(),
    )
    .unwrap();
    assert_eq!(trend_chart["data"].as_array().unwrap().len(), 3);

    let sankey: serde_json::Value = serde_json::from_str(
        &ReportFormatter::format_transition_matrix(&matrix, &OutputFormat::Plotly).unwrap(),
    )
    .unwrap();
    assert_eq!(sankey["data"][0]["type"], "sankey");
    assert_eq!(sankey["data"][0]["link"]["value"].as_array().unwrap().len(), 2);

    let deltas = ReportFormatter::format_deltas(&trend.snapshots, &OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&deltas).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 5);
}

#[test]
fn test_late_rows_requeue_processed_periods() {
    let mut engine = TestEngine::new("pipeline_requeue").unwrap();
    import(&mut engine, &week_of_activity());
    DirtyWorker::new(&engine.engine, 10).run_once().unwrap();
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 0);

    let stats = import(
        &mut engine,
        &[activity("c5", at(6, 9), "low", "active", 150.0)],
    );
    assert_eq!(stats.imported, 1);
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 4);

    DirtyWorker::new(&engine.engine, 10).run_once().unwrap();
    let week = engine
        .get_snapshot("customer_weekly", "2025-01-06", OWNER)
        .unwrap()
        .unwrap();
    assert_eq!(week.flows.raw.total_customers.net(), CUSTOMERS + 1);
}
