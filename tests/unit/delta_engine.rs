//! Delta Snapshot Tests
//!
//! Daily deltas over the seeded week: inflows and outflows per group,
//! conservation across dimensions and idempotent recomputation.

use crate::common::clock::{at, end_of_day, JAN_06};
use crate::common::database::TestEngine;
use crate::common::fixtures::{activity, seed, OWNER};
use crate::common::scenario::{seed_week, CUSTOMERS, TOTAL_LTV};
use customer_flow_report::analysis::BalanceStrategy;
use customer_flow_report::types::{DeltaDocument, Dimension, Flow, PeriodType, ProfileKind};

fn seeded_engine(test_name: &str) -> TestEngine {
    let mut engine = TestEngine::new(test_name).unwrap();
    seed_week(&mut engine);
    engine
}

fn week_of_days(engine: &TestEngine) -> Vec<DeltaDocument> {
    engine
        .compute_range(OWNER, PeriodType::Day, "2025-01-06", "2025-01-12")
        .unwrap()
}

#[test]
fn test_first_day_credits_new_customers() {
    let engine = seeded_engine("delta_first_day");
    let day = engine
        .compute_period("customer_daily", "2025-01-06", OWNER)
        .unwrap();

    assert_eq!(day.report_key, "customer_daily");
    assert_eq!(day.period_key, "2025-01-06");
    assert_eq!(day.flows.raw.total_customers, Flow::inflow(2));
    assert_eq!(day.flows.raw.new_customers_in_period, Flow::inflow(2));
    assert_eq!(day.flows.raw.active_in_period, Flow::inflow(2));
    assert_eq!(day.flows.raw.total_ltv, Flow::inflow(300.0));

    let tiers = day.flows.counts(Dimension::ValueTier);
    assert_eq!(tiers["new"], Flow::inflow(1));
    assert_eq!(tiers["low"], Flow::inflow(1));
    assert_eq!(day.flows.ltv(Dimension::ValueTier)["low"], Flow::inflow(200.0));

    let repeat = day.flows.profile(ProfileKind::Repeat);
    assert_eq!(repeat["repeatDepth"]["R2"], Flow::inflow(2));
    assert_eq!(repeat["spendMomentum"]["_unspecified"], Flow::inflow(2));
}

#[test]
fn test_upgrade_moves_only_changed_groups() {
    let engine = seeded_engine("delta_upgrade");
    let day = engine
        .compute_period("customer_daily", "2025-01-08", OWNER)
        .unwrap();
    let flows = &day.flows;

    assert_eq!(flows.raw.total_customers, Flow { inflow: 1, out: 1 });
    assert_eq!(flows.raw.new_customers_in_period, Flow::default());
    assert_eq!(flows.raw.active_in_period, Flow::inflow(1));
    assert_eq!(flows.raw.total_ltv, Flow { inflow: 5_000.0, out: 100.0 });

    let tiers = flows.counts(Dimension::ValueTier);
    assert_eq!(tiers["new"], Flow { inflow: 0, out: 1 });
    assert_eq!(tiers["vip"], Flow::inflow(1));
    assert_eq!(flows.ltv(Dimension::ValueTier)["new"], Flow { inflow: 0.0, out: 100.0 });

    let groups = flows.counts(Dimension::CeoGroup);
    assert_eq!(groups["new"].net(), -1);
    assert_eq!(groups["vip_active"].net(), 1);

    // Unchanged dimensions keep their counts while their LTV follows spend
    assert!(flows.counts(Dimension::Channel).is_empty());
    assert!(flows.counts(Dimension::LifecycleStage).is_empty());
    assert!(flows.profile(ProfileKind::Repeat).is_empty());
    assert_eq!(flows.ltv(Dimension::Channel)["online"], Flow::inflow(4_900.0));
    assert_eq!(flows.ltv(Dimension::LifecycleStage)["active"], Flow::inflow(4_900.0));
}

#[test]
fn test_lapsed_vip_counts_as_reactivation_value() {
    let engine = seeded_engine("delta_reactivation");
    let day = engine
        .compute_period("customer_daily", "2025-01-09", OWNER)
        .unwrap();

    assert_eq!(day.flows.raw.reactivation_value, Flow::inflow(8_000.0));
    assert_eq!(day.flows.counts(Dimension::CeoGroup)["vip_inactive"], Flow::inflow(1));
    assert_eq!(day.flows.counts(Dimension::LifecycleStage)["inactive"], Flow::inflow(1));
}

#[test]
fn test_change_reverted_within_period_is_not_a_transition() {
    let engine = seeded_engine("delta_reverted");
    let day = engine
        .compute_period("customer_daily", "2025-01-10", OWNER)
        .unwrap();

    assert_eq!(day.flows.raw.total_customers, Flow::default());
    assert!(day.flows.counts(Dimension::ValueTier).is_empty());
    // Still ordered that day
    assert_eq!(day.flows.raw.active_in_period, Flow::inflow(1));
}

#[test]
fn test_quiet_days_are_empty() {
    let engine = seeded_engine("delta_quiet");
    let days = week_of_days(&engine);

    assert_eq!(days.len(), 7);
    for day in &days[5..] {
        assert_eq!(day.flows.raw.total_customers, Flow::default());
        assert_eq!(day.flows.raw.active_in_period, Flow::default());
        assert!(Dimension::ALL
            .iter()
            .all(|d| day.flows.counts(*d).is_empty()));
    }
}

#[test]
fn test_group_nets_conserve_total_customers() {
    let engine = seeded_engine("delta_conservation");

    for day in week_of_days(&engine) {
        let total = day.flows.raw.total_customers.net();
        for dimension in Dimension::ALL {
            assert_eq!(
                day.flows.net_customers(dimension),
                total,
                "{} on {}",
                dimension.key(),
                day.period_key
            );
        }
    }
}

#[test]
fn test_daily_deltas_add_up_to_weekly() {
    let engine = seeded_engine("delta_daily_weekly");
    let days = week_of_days(&engine);
    let week = engine
        .compute_period("customer_weekly", "2025-01-06", OWNER)
        .unwrap();

    let daily_net: i64 = days.iter().map(|d| d.flows.raw.total_customers.net()).sum();
    let daily_ltv: f64 = days.iter().map(|d| d.flows.raw.total_ltv.net()).sum();
    assert_eq!(daily_net, CUSTOMERS);
    assert_eq!(week.flows.raw.total_customers, Flow::inflow(CUSTOMERS));
    assert!((daily_ltv - TOTAL_LTV).abs() < 1e-9);
    assert!((week.flows.raw.total_ltv.net() - TOTAL_LTV).abs() < 1e-9);

    // The weekly window sees each customer's final tier only
    let tiers = week.flows.counts(Dimension::ValueTier);
    assert_eq!(tiers["vip"], Flow::inflow(2));
    assert_eq!(tiers["low"], Flow::inflow(2));
    assert!(!tiers.contains_key("new"));
    assert_eq!(week.flows.raw.active_in_period, Flow::inflow(CUSTOMERS));
}

#[test]
fn test_recompute_is_idempotent() {
    let engine = seeded_engine("delta_idempotent");

    let first = engine
        .compute_period("customer_daily", "2025-01-08", OWNER)
        .unwrap();
    let second = engine
        .compute_period("customer_daily", "2025-01-08", OWNER)
        .unwrap();

    assert_eq!(first.flows, second.flows);
    assert!(!first.content_hash.is_empty());
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at >= first.updated_at);

    let stored = engine
        .get_snapshot("customer_daily", "2025-01-08", OWNER)
        .unwrap()
        .unwrap();
    assert_eq!(stored.flows, second.flows);
}

#[test]
fn test_custom_range_is_keyed_by_its_start() {
    let engine = seeded_engine("delta_custom_range");
    let document = engine
        .compute_delta(OWNER, JAN_06, end_of_day(2), PeriodType::Day)
        .unwrap();

    assert_eq!(document.period_key, "2025-01-06");
    assert_eq!(document.flows.raw.total_customers, Flow::inflow(3));
    assert!(engine.compute_delta(OWNER, end_of_day(2), JAN_06, PeriodType::Day).is_err());
}

#[test]
fn test_unknown_report_key_rejected() {
    let engine = seeded_engine("delta_unknown_report");
    assert!(engine.compute_period("customer_hourly", "2025-01-06", OWNER).is_err());
    assert!(engine.get_snapshot("customer_hourly", "2025-01-06", OWNER).is_err());
    assert!(engine
        .get_snapshot("customer_daily", "2025-01-06", OWNER)
        .unwrap()
        .is_none());
}

#[test]
fn test_repeat_spend_growth_moves_ltv_only() {
    let mut engine = TestEngine::new("delta_spend_growth").unwrap();
    seed(
        &mut engine,
        &[
            activity("c9", at(0, 9), "low", "active", 200.0),
            activity("c9", at(1, 9), "low", "active", 450.0),
        ],
    );

    let day = engine
        .compute_period("customer_daily", "2025-01-07", OWNER)
        .unwrap();
    let flows = &day.flows;

    assert_eq!(flows.raw.total_customers, Flow::default());
    assert_eq!(flows.raw.active_in_period, Flow::inflow(1));
    assert_eq!(flows.raw.total_ltv, Flow::inflow(250.0));
    for dimension in Dimension::ALL {
        assert!(flows.counts(dimension).is_empty(), "{}", dimension);
    }
    assert_eq!(flows.ltv(Dimension::ValueTier)["low"], Flow::inflow(250.0));
    assert_eq!(flows.ltv(Dimension::JourneyStage)["repeat"], Flow::inflow(250.0));

    engine
        .compute_range(OWNER, PeriodType::Day, "2025-01-06", "2025-01-07")
        .unwrap();
    let summed = engine
        .get_balance(OWNER, end_of_day(1), BalanceStrategy::Summed { from_ms: Some(JAN_06) })
        .unwrap();
    let direct = engine
        .get_balance(OWNER, end_of_day(1), BalanceStrategy::Direct)
        .unwrap();
    assert!((summed.raw.total_ltv - 450.0).abs() < 1e-6);
    for dimension in Dimension::ALL {
        for (group, ltv) in direct.ltv.get(&dimension).into_iter().flatten() {
            assert!((summed.group_ltv(dimension, group) - ltv).abs() < 1e-6, "{} {}", dimension, group);
        }
    }
}
