//! Dirty Queue Tests
//!
//! Activity marks the enclosing period of every customer report, and the
//! worker recomputes whatever is pending so late history shows up in the
//! stored snapshots.

use crate::common::clock::at;
use crate::common::database::TestEngine;
use crate::common::fixtures::{activity, seed, OWNER};
use crate::common::scenario::seed_week;
use customer_flow_report::database::DirtyPeriodOperations;
use customer_flow_report::processor::DirtyWorker;
use customer_flow_report::types::{Dimension, Flow};

fn mark_week(engine: &TestEngine) {
    for day in 0..5 {
        engine.mark_dirty_for_activity(OWNER, at(day, 10)).unwrap();
    }
}

#[test]
fn test_activity_marks_every_report() {
    let engine = TestEngine::new("dirty_marks").unwrap();

    let marked = engine.mark_dirty_for_activity(OWNER, at(2, 10)).unwrap();
    assert_eq!(
        marked,
        vec![
            ("customer_daily".to_string(), "2025-01-08".to_string()),
            ("customer_weekly".to_string(), "2025-01-06".to_string()),
            ("customer_monthly".to_string(), "2025-01".to_string()),
            ("customer_yearly".to_string(), "2025".to_string()),
        ]
    );
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 4);
}

#[test]
fn test_activity_timestamp_in_seconds() {
    let engine = TestEngine::new("dirty_marks_seconds").unwrap();

    let from_millis = engine.mark_dirty_for_activity(OWNER, at(2, 10)).unwrap();
    let from_seconds = engine
        .mark_dirty_for_activity(OWNER, at(2, 10) / 1000)
        .unwrap();

    assert_eq!(from_millis, from_seconds);
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 4);
}

#[test]
fn test_local_midnight_belongs_to_the_new_day() {
    let engine = TestEngine::new("dirty_marks_midnight").unwrap();

    // 2025-01-07 00:30 local is still 2025-01-06 in UTC
    let marked = engine.mark_dirty_for_activity(OWNER, at(1, 0) + 1_800_000).unwrap();
    assert_eq!(marked[0].1, "2025-01-07");
}

#[test]
fn test_worker_drains_marked_periods() {
    let mut engine = TestEngine::new("dirty_worker_drain").unwrap();
    seed_week(&mut engine);
    mark_week(&engine);
    // Five days, one week, one month and one year
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 8);

    let stats = DirtyWorker::new(&engine.engine, 3).run_once().unwrap();
    assert_eq!(stats.claimed, 8);
    assert_eq!(stats.recomputed, 8);
    assert_eq!(stats.failed, 0);
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 0);

    let month = engine
        .get_snapshot("customer_monthly", "2025-01", OWNER)
        .unwrap()
        .unwrap();
    assert_eq!(month.flows.raw.total_customers, Flow::inflow(4));
    assert!(engine
        .get_snapshot("customer_daily", "2025-01-10", OWNER)
        .unwrap()
        .is_some());
}

#[test]
fn test_late_activity_is_picked_up_on_next_run() {
    let mut engine = TestEngine::new("dirty_worker_late").unwrap();
    seed_week(&mut engine);
    mark_week(&engine);
    DirtyWorker::new(&engine.engine, 10).run_once().unwrap();

    // c2 upgrades on day 1 but the row arrives after the first run
    seed(&mut engine, &[activity("c2", at(1, 15), "medium", "active", 900.0)]);
    engine.mark_dirty_for_activity(OWNER, at(1, 15)).unwrap();
    assert_eq!(engine.store().count_unprocessed_dirty_periods().unwrap(), 4);

    let stats = DirtyWorker::new(&engine.engine, 10).run_once().unwrap();
    assert_eq!(stats.recomputed, 4);

    let day = engine
        .get_snapshot("customer_daily", "2025-01-07", OWNER)
        .unwrap()
        .unwrap();
    assert_eq!(day.flows.counts(Dimension::ValueTier)["medium"], Flow::inflow(1));
    assert!(!day.flows.counts(Dimension::ValueTier).contains_key("low"));
}

#[test]
fn test_empty_queue_is_a_no_op() {
    let engine = TestEngine::new("dirty_worker_empty").unwrap();
    let stats = DirtyWorker::new(&engine.engine, 10).run_once().unwrap();
    assert_eq!(stats.claimed, 0);
    assert_eq!(stats.recomputed, 0);
}
