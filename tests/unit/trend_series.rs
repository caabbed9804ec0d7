//! Trend Series Tests
//!
//! Stored snapshots over a period-key range and the comparison of the last
//! two periods.

use crate::common::database::TestEngine;
use crate::common::fixtures::OWNER;
use crate::common::scenario::seed_week;
use customer_flow_report::types::PeriodType;

fn engine_with_days(test_name: &str) -> TestEngine {
    let mut engine = TestEngine::new(test_name).unwrap();
    seed_week(&mut engine);
    engine
        .compute_range(OWNER, PeriodType::Day, "2025-01-06", "2025-01-12")
        .unwrap();
    engine
}

#[test]
fn test_snapshots_in_key_order() {
    let engine = engine_with_days("trend_order");
    let trend = engine
        .get_trend(OWNER, "customer_daily", "2025-01-07", "2025-01-10")
        .unwrap();

    let keys: Vec<&str> = trend.snapshots.iter().map(|s| s.period_key.as_str()).collect();
    assert_eq!(keys, vec!["2025-01-07", "2025-01-08", "2025-01-09", "2025-01-10"]);
    assert_eq!(trend.from_period_key, "2025-01-07");
    assert_eq!(trend.to_period_key, "2025-01-10");
}

#[test]
fn test_compares_last_two_periods() {
    let engine = engine_with_days("trend_comparison");
    let trend = engine
        .get_trend(OWNER, "customer_daily", "2025-01-08", "2025-01-09")
        .unwrap();
    let comparison = trend.comparison.unwrap();

    assert_eq!(comparison.previous_period_key, "2025-01-08");
    assert_eq!(comparison.current_period_key, "2025-01-09");

    // Jan 8 is a transition (net 0), Jan 9 adds c3
    let customers = &comparison.metrics["totalCustomers"];
    assert_eq!(customers.previous, 0.0);
    assert_eq!(customers.current, 1.0);
    assert_eq!(customers.change_pct, 100.0);

    let ltv = &comparison.metrics["totalLTV"];
    assert_eq!(ltv.previous, 4_900.0);
    assert_eq!(ltv.current, 8_000.0);
    assert!((ltv.change_pct - (3_100.0 / 4_900.0 * 100.0)).abs() < 1e-9);

    let active = &comparison.metrics["activeInPeriod"];
    assert_eq!(active.change_pct, 0.0);
}

#[test]
fn test_single_snapshot_has_no_comparison() {
    let engine = engine_with_days("trend_single");
    let trend = engine
        .get_trend(OWNER, "customer_daily", "2025-01-08", "2025-01-08")
        .unwrap();
    assert_eq!(trend.snapshots.len(), 1);
    assert!(trend.comparison.is_none());

    let uncomputed = engine
        .get_trend(OWNER, "customer_daily", "2025-02-01", "2025-02-28")
        .unwrap();
    assert!(uncomputed.snapshots.is_empty());
}

#[test]
fn test_weekly_keys_are_canonicalised() {
    let engine = engine_with_days("trend_weekly_keys");
    engine
        .compute_period("customer_weekly", "2025-01-06", OWNER)
        .unwrap();

    // A Wednesday names the week starting Monday the 6th
    let trend = engine
        .get_trend(OWNER, "customer_weekly", "2025-01-08", "2025-01-08")
        .unwrap();
    assert_eq!(trend.from_period_key, "2025-01-06");
    assert_eq!(trend.snapshots.len(), 1);
}

#[test]
fn test_invalid_ranges_rejected() {
    let engine = engine_with_days("trend_invalid");
    assert!(engine
        .get_trend(OWNER, "customer_daily", "2025-01-10", "2025-01-07")
        .is_err());
    assert!(engine
        .get_trend(OWNER, "customer_hourly", "2025-01-07", "2025-01-10")
        .is_err());
    assert!(engine
        .get_trend(OWNER, "customer_monthly", "2025-01-07", "2025-01-10")
        .is_err());
}
