//! Transition Tests
//!
//! Matrices and ordinal group changes between the ends of two periods,
//! reconstructed independently from the activity history.

use crate::common::clock::at;
use crate::common::database::TestEngine;
use crate::common::fixtures::{activity, seed, OWNER};
use crate::common::scenario::seed_week;
use customer_flow_report::analysis::{rank, UNRANKED};
use customer_flow_report::types::{Dimension, GroupChange, PeriodType};

fn seeded_engine(test_name: &str) -> TestEngine {
    let mut engine = TestEngine::new(test_name).unwrap();
    seed_week(&mut engine);
    engine
}

fn change(from: &str, to: &str, count: i64) -> GroupChange {
    GroupChange {
        from: from.to_string(),
        to: to.to_string(),
        count,
    }
}

#[test]
fn test_daily_value_tier_matrix() {
    let engine = seeded_engine("transition_daily");
    let matrix = engine
        .get_transition_matrix(OWNER, "2025-01-06", "2025-01-08", None, Dimension::ValueTier, false)
        .unwrap();

    assert_eq!(matrix.period_type, PeriodType::Day);
    assert_eq!(matrix.participants, 2);
    assert_eq!(matrix.from_only, 0);
    // c2 joined in between and does not take part
    assert_eq!(matrix.to_only, 1);

    assert_eq!(matrix.count("new", "vip"), 1);
    assert_eq!(matrix.count("low", "low"), 1);
    assert_eq!(matrix.count("new", "new"), 0);
    assert_eq!(matrix.rate("new", "vip"), 1.0);
    assert!(matrix.sankey.is_none());

    let participants: i64 = matrix.matrix.values().flat_map(|row| row.values()).sum();
    assert_eq!(participants as usize, matrix.participants);
}

#[test]
fn test_sankey_nodes_and_links() {
    let engine = seeded_engine("transition_sankey");
    let matrix = engine
        .get_transition_matrix(OWNER, "2025-01-06", "2025-01-08", None, Dimension::ValueTier, true)
        .unwrap();
    let sankey = matrix.sankey.unwrap();

    let ids: Vec<&str> = sankey.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["low_from", "new_from", "low_to", "vip_to"]);
    assert_eq!(sankey.links.len(), 2);
    assert!(sankey
        .links
        .iter()
        .any(|l| l.source == "new_from" && l.target == "vip_to" && l.value == 1));
}

#[test]
fn test_conversion_rates_split_a_row() {
    let mut engine = seeded_engine("transition_rates");
    // c2 and c4 start week 2 as low; c2 moves up, c4 stays
    seed(&mut engine, &[activity("c2", at(8, 10), "medium", "active", 900.0)]);

    let matrix = engine
        .get_transition_matrix(
            OWNER,
            "2025-01-06",
            "2025-01-13",
            Some(PeriodType::Week),
            Dimension::ValueTier,
            false,
        )
        .unwrap();

    assert_eq!(matrix.participants, 4);
    assert_eq!(matrix.rate("low", "medium"), 0.5);
    assert_eq!(matrix.rate("low", "low"), 0.5);
    assert_eq!(matrix.rate("vip", "vip"), 1.0);
}

#[test]
fn test_group_changes_by_rank() {
    let engine = seeded_engine("transition_group_changes");
    let changes = engine
        .get_group_changes(OWNER, "2025-01-06", "2025-01-08", None, Dimension::CeoGroup)
        .unwrap();

    assert_eq!(changes.upgraded, vec![change("new", "vip_active", 1)]);
    assert_eq!(changes.unchanged, vec![change("_other", "_other", 1)]);
    assert!(changes.downgraded.is_empty());
}

#[test]
fn test_weekly_downgrade() {
    let mut engine = seeded_engine("transition_downgrade");
    seed(&mut engine, &[activity("c1", at(9, 10), "high", "active", 5_000.0)]);

    let changes = engine
        .get_group_changes(
            OWNER,
            "2025-01-06",
            "2025-01-13",
            Some(PeriodType::Week),
            Dimension::ValueTier,
        )
        .unwrap();

    assert_eq!(changes.downgraded, vec![change("vip", "high", 1)]);
    assert_eq!(changes.unchanged_total(), 3);
    assert_eq!(changes.upgraded_total(), 0);
    // Largest group first
    assert_eq!(changes.unchanged[0], change("low", "low", 2));
}

#[test]
fn test_period_type_inferred_from_key_shape() {
    let engine = seeded_engine("transition_inferred");

    let monthly = engine
        .get_transition_matrix(OWNER, "2025-01", "2025-02", None, Dimension::LifecycleStage, false)
        .unwrap();
    assert_eq!(monthly.period_type, PeriodType::Month);
    assert_eq!(monthly.participants, 4);
    assert_eq!(monthly.count("active", "active"), 3);
    assert_eq!(monthly.count("inactive", "inactive"), 1);

    // A day key cannot be read as a month
    assert!(engine
        .get_transition_matrix(OWNER, "2025-01", "2025-01-08", None, Dimension::ValueTier, false)
        .is_err());
}

#[test]
fn test_reversed_periods_rejected() {
    let engine = seeded_engine("transition_reversed");
    assert!(engine
        .get_transition_matrix(OWNER, "2025-01-08", "2025-01-06", None, Dimension::ValueTier, false)
        .is_err());
    assert!(engine
        .get_group_changes(OWNER, "2025-01-08", "2025-01-06", None, Dimension::ValueTier)
        .is_err());
}

#[test]
fn test_unknown_labels_rank_lowest() {
    assert_eq!(rank(Dimension::ValueTier, "vip"), 4);
    assert_eq!(rank(Dimension::ValueTier, "new"), 0);
    assert_eq!(rank(Dimension::ValueTier, "platinum"), UNRANKED);
    assert_eq!(rank(Dimension::LifecycleStage, "_unspecified"), UNRANKED);
    assert!(rank(Dimension::CeoGroup, "vip_active") > rank(Dimension::CeoGroup, "rising"));
}
