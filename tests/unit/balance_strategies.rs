//! Balance Strategy Tests
//!
//! Direct balances replay the latest classification per customer; summed
//! balances fold stored deltas. Over the same window both must agree on
//! every group count.

use crate::common::clock::{end_of_day, JAN_06};
use crate::common::database::TestEngine;
use crate::common::fixtures::OWNER;
use crate::common::scenario::{seed_week, CUSTOMERS, TOTAL_LTV};
use customer_flow_report::analysis::BalanceStrategy;
use customer_flow_report::types::{Balance, BalanceSource, Dimension, PeriodType, ProfileKind};

fn seeded_engine(test_name: &str) -> TestEngine {
    let mut engine = TestEngine::new(test_name).unwrap();
    seed_week(&mut engine);
    engine
}

fn compute_days(engine: &TestEngine) {
    engine
        .compute_range(OWNER, PeriodType::Day, "2025-01-06", "2025-01-12")
        .unwrap();
}

/// Group counts, LTV and sub-profile counts must match between two balances
fn assert_same_groups(direct: &Balance, summed: &Balance) {
    assert_eq!(direct.raw.total_customers, summed.raw.total_customers);
    assert!((direct.raw.total_ltv - summed.raw.total_ltv).abs() < 1e-6);
    assert!((direct.raw.reactivation_value - summed.raw.reactivation_value).abs() < 1e-6);

    for dimension in Dimension::ALL {
        assert_eq!(
            direct.dimension_total(dimension),
            summed.dimension_total(dimension),
            "{}",
            dimension.key()
        );
        for (group, count) in direct.groups.get(&dimension).into_iter().flatten() {
            assert_eq!(*count, summed.group_count(dimension, group), "{} {}", dimension.key(), group);
            assert!(
                (direct.group_ltv(dimension, group) - summed.group_ltv(dimension, group)).abs() < 1e-6
            );
        }
    }

    for (kind, profile) in &direct.layer3 {
        for (sub_dimension, groups) in profile {
            for (group, count) in groups {
                assert_eq!(*count, summed.sub_count(*kind, sub_dimension, group));
            }
        }
    }
}

#[test]
fn test_direct_balance_at_end_of_week() {
    let engine = seeded_engine("balance_direct");
    let balance = engine
        .get_balance(OWNER, end_of_day(6), BalanceStrategy::Direct)
        .unwrap();

    assert_eq!(balance.source, BalanceSource::Direct { customers: 4 });
    assert_eq!(balance.raw.total_customers, CUSTOMERS);
    assert!((balance.raw.total_ltv - TOTAL_LTV).abs() < 1e-6);
    assert!((balance.raw.reactivation_value - 8_000.0).abs() < 1e-6);
    // Period counters have no meaning at an instant
    assert_eq!(balance.raw.new_customers_in_period, 0);
    assert_eq!(balance.raw.active_in_period, 0);

    assert_eq!(balance.group_count(Dimension::ValueTier, "vip"), 2);
    assert_eq!(balance.group_count(Dimension::ValueTier, "low"), 2);
    assert_eq!(balance.group_count(Dimension::ValueTier, "new"), 0);
    assert_eq!(balance.group_count(Dimension::CeoGroup, "vip_active"), 1);
    assert_eq!(balance.group_count(Dimension::CeoGroup, "vip_inactive"), 1);
    assert_eq!(balance.group_count(Dimension::CeoGroup, "_other"), 2);
    assert!((balance.group_ltv(Dimension::ValueTier, "vip") - 13_000.0).abs() < 1e-6);
    assert_eq!(balance.sub_count(ProfileKind::Repeat, "repeatDepth", "R2"), 4);
}

#[test]
fn test_direct_balance_respects_as_of() {
    let engine = seeded_engine("balance_direct_as_of");
    let balance = engine
        .get_balance(OWNER, end_of_day(1), BalanceStrategy::Direct)
        .unwrap();

    assert_eq!(balance.raw.total_customers, 3);
    assert_eq!(balance.group_count(Dimension::ValueTier, "new"), 1);
    assert_eq!(balance.group_count(Dimension::ValueTier, "vip"), 0);

    let before_any = engine
        .get_balance(OWNER, JAN_06 - 1, BalanceStrategy::Direct)
        .unwrap();
    assert_eq!(before_any.raw.total_customers, 0);
}

#[test]
fn test_summed_from_daily_matches_direct() {
    let engine = seeded_engine("balance_summed_daily");
    compute_days(&engine);

    let direct = engine
        .get_balance(OWNER, end_of_day(6), BalanceStrategy::Direct)
        .unwrap();
    let summed = engine
        .get_balance(
            OWNER,
            end_of_day(6),
            BalanceStrategy::Summed {
                from_ms: Some(JAN_06),
            },
        )
        .unwrap();

    // Week-aligned, but only daily snapshots exist
    assert_eq!(
        summed.source,
        BalanceSource::Summed {
            report_key: "customer_daily".to_string(),
            from_period_key: "2025-01-06".to_string(),
            to_period_key: "2025-01-12".to_string(),
            snapshot_count: 7,
        }
    );
    assert_same_groups(&direct, &summed);
    assert_eq!(summed.raw.new_customers_in_period, 4);
    assert_eq!(summed.raw.active_in_period, 6);
}

#[test]
fn test_summed_prefers_coarser_aligned_snapshots() {
    let engine = seeded_engine("balance_summed_weekly");
    compute_days(&engine);
    engine
        .compute_period("customer_weekly", "2025-01-06", OWNER)
        .unwrap();

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

    match &summed.source {
        BalanceSource::Summed {
            report_key,
            snapshot_count,
            ..
        } => {
            assert_eq!(report_key, "customer_weekly");
            assert_eq!(*snapshot_count, 1);
        }
        other => panic!("expected a summed source, got {:?}", other),
    }
    assert_same_groups(&direct, &summed);
}

#[test]
fn test_unaligned_range_falls_back_to_daily() {
    let engine = seeded_engine("balance_summed_unaligned");
    compute_days(&engine);
    engine
        .compute_period("customer_weekly", "2025-01-06", OWNER)
        .unwrap();

    let summed = engine
        .get_balance(
            OWNER,
            end_of_day(2),
            BalanceStrategy::Summed {
                from_ms: Some(JAN_06),
            },
        )
        .unwrap();
    let direct = engine
        .get_balance(OWNER, end_of_day(2), BalanceStrategy::Direct)
        .unwrap();

    assert!(matches!(
        &summed.source,
        BalanceSource::Summed { report_key, snapshot_count: 3, .. } if report_key == "customer_daily"
    ));
    assert_eq!(summed.raw.total_customers, 3);
    assert_same_groups(&direct, &summed);
}

#[test]
fn test_summed_without_from_starts_at_first_activity_year() {
    let engine = seeded_engine("balance_summed_default_from");
    compute_days(&engine);

    let summed = engine
        .get_balance(OWNER, end_of_day(6), BalanceStrategy::Summed { from_ms: None })
        .unwrap();

    match &summed.source {
        BalanceSource::Summed {
            report_key,
            from_period_key,
            snapshot_count,
            ..
        } => {
            assert_eq!(report_key, "customer_daily");
            assert_eq!(from_period_key, "2025-01-01");
            assert_eq!(*snapshot_count, 7);
        }
        other => panic!("expected a summed source, got {:?}", other),
    }
    assert_eq!(summed.raw.total_customers, CUSTOMERS);
}

#[test]
fn test_summed_without_snapshots_is_empty() {
    let engine = seeded_engine("balance_summed_empty");

    let no_snapshots = engine
        .get_balance(
            OWNER,
            end_of_day(6),
            BalanceStrategy::Summed {
                from_ms: Some(JAN_06),
            },
        )
        .unwrap();
    assert_eq!(no_snapshots.source, BalanceSource::Empty);
    assert!(no_snapshots.is_empty());

    let unknown_owner = engine
        .get_balance("org-unknown", end_of_day(6), BalanceStrategy::Summed { from_ms: None })
        .unwrap();
    assert_eq!(unknown_owner.source, BalanceSource::Empty);
    assert_eq!(unknown_owner.raw.total_customers, 0);
    assert_eq!(unknown_owner.owner_id, "org-unknown");
}
