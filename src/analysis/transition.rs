//! Transition matrices and ordinal group changes
//!
//! Both compare two independently reconstructed state maps. Only customers
//! present on both sides take part; a customer seen on one side only has
//! entered or left the base and did not transition.

use crate::types::{
    ClassifiedState, Dimension, GroupChange, GroupChanges, PeriodType, SankeyData, SankeyLink,
    SankeyNode, TransitionMatrix,
};
use crate::utils::math::safe_ratio;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Classified states at the end of one period, keyed by customer
#[derive(Debug, Clone, Copy)]
pub struct PeriodStates<'a> {
    pub period_key: &'a str,
    pub states: &'a HashMap<String, ClassifiedState>,
}

impl<'a> PeriodStates<'a> {
    pub fn new(period_key: &'a str, states: &'a HashMap<String, ClassifiedState>) -> Self {
        Self { period_key, states }
    }
}

/// Rank of labels with no entry in a dimension's table
pub const UNRANKED: i32 = -1;

const VALUE_RANKS: &[(&str, i32)] = &[("new", 0), ("low", 1), ("medium", 2), ("high", 3), ("vip", 4)];

const LIFECYCLE_RANKS: &[(&str, i32)] = &[
    ("never_purchased", 0),
    ("dead", 1),
    ("inactive", 2),
    ("cooling", 3),
    ("active", 4),
];

const JOURNEY_RANKS: &[(&str, i32)] = &[
    ("visitor", 0),
    ("inactive", 0),
    ("engaged", 1),
    ("first", 2),
    ("repeat", 3),
    ("vip", 4),
];

const CHANNEL_RANKS: &[(&str, i32)] = &[("offline", 1), ("online", 1), ("omnichannel", 2)];

const LOYALTY_RANKS: &[(&str, i32)] = &[("one_time", 1), ("repeat", 2), ("core", 3)];

const MOMENTUM_RANKS: &[(&str, i32)] = &[("lost", 0), ("declining", 1), ("stable", 2), ("rising", 3)];

const CEO_GROUP_RANKS: &[(&str, i32)] = &[
    ("_other", 0),
    ("dead", 0),
    ("one_time", 1),
    ("new", 2),
    ("vip_inactive", 2),
    ("rising", 3),
    ("vip_active", 4),
];

fn rank_table(dimension: Dimension) -> &'static [(&'static str, i32)] {
    match dimension {
        Dimension::ValueTier => VALUE_RANKS,
        Dimension::LifecycleStage => LIFECYCLE_RANKS,
        Dimension::JourneyStage => JOURNEY_RANKS,
        Dimension::Channel => CHANNEL_RANKS,
        Dimension::LoyaltyStage => LOYALTY_RANKS,
        Dimension::MomentumStage => MOMENTUM_RANKS,
        Dimension::CeoGroup => CEO_GROUP_RANKS,
    }
}

/// Ordinal rank of a group label; unknown labels and `_unspecified` rank lowest
pub fn rank(dimension: Dimension, label: &str) -> i32 {
    rank_table(dimension)
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, rank)| *rank)
        .unwrap_or(UNRANKED)
}

/// Transition counts between two state maps for one dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    pub matrix: BTreeMap<String, BTreeMap<String, i64>>,
    pub participants: usize,
    pub from_only: usize,
    pub to_only: usize,
}

pub struct TransitionAnalyser;

impl TransitionAnalyser {
    /// Count `from group → to group` moves of customers present on both sides
    pub fn count_transitions(
        from: &HashMap<String, ClassifiedState>,
        to: &HashMap<String, ClassifiedState>,
        dimension: Dimension,
    ) -> TransitionCounts {
        let mut counts = TransitionCounts::default();

        for (customer_id, from_state) in from {
            let Some(to_state) = to.get(customer_id) else {
                counts.from_only += 1;
                continue;
            };
            counts.participants += 1;
            *counts
                .matrix
                .entry(from_state.label(dimension).to_string())
                .or_default()
                .entry(to_state.label(dimension).to_string())
                .or_default() += 1;
        }
        counts.to_only = to.keys().filter(|id| !from.contains_key(*id)).count();

        counts
    }

    /// Row-normalised rates: `matrix[x][y] / Σ_z matrix[x][z]`
    pub fn conversion_rates(
        matrix: &BTreeMap<String, BTreeMap<String, i64>>,
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        matrix
            .iter()
            .map(|(from_group, row)| {
                let row_total: i64 = row.values().sum();
                let rates = row
                    .iter()
                    .map(|(to_group, count)| (to_group.clone(), safe_ratio(*count, row_total)))
                    .collect();
                (from_group.clone(), rates)
            })
            .collect()
    }

    /// Nodes `<group>_from` / `<group>_to` and one link per non-zero cell
    pub fn sankey(matrix: &BTreeMap<String, BTreeMap<String, i64>>) -> SankeyData {
        let to_groups: BTreeSet<&String> = matrix.values().flat_map(|row| row.keys()).collect();

        let mut nodes: Vec<SankeyNode> = matrix
            .keys()
            .map(|group| SankeyNode {
                id: format!("{}_from", group),
                label: format!("{} (T)", group),
            })
            .collect();
        nodes.extend(to_groups.into_iter().map(|group| SankeyNode {
            id: format!("{}_to", group),
            label: format!("{} (T+1)", group),
        }));

        let links = matrix
            .iter()
            .flat_map(|(from_group, row)| {
                row.iter()
                    .filter(|(_, count)| **count > 0)
                    .map(move |(to_group, count)| SankeyLink {
                        source: format!("{}_from", from_group),
                        target: format!("{}_to", to_group),
                        value: *count,
                    })
            })
            .collect();

        SankeyData { nodes, links }
    }

    /// Full transition matrix result
    pub fn transition_matrix(
        from: PeriodStates<'_>,
        to: PeriodStates<'_>,
        dimension: Dimension,
        period_type: PeriodType,
        include_sankey: bool,
    ) -> TransitionMatrix {
        let counts = Self::count_transitions(from.states, to.states, dimension);
        let conversion_rates = Self::conversion_rates(&counts.matrix);
        let sankey = include_sankey.then(|| Self::sankey(&counts.matrix));

        TransitionMatrix {
            dimension,
            period_type,
            from_period_key: from.period_key.to_string(),
            to_period_key: to.period_key.to_string(),
            matrix: counts.matrix,
            conversion_rates,
            participants: counts.participants,
            from_only: counts.from_only,
            to_only: counts.to_only,
            sankey,
        }
    }

    /// Split transitions into upgraded, downgraded and unchanged by rank
    pub fn group_changes(
        from: PeriodStates<'_>,
        to: PeriodStates<'_>,
        dimension: Dimension,
        period_type: PeriodType,
    ) -> GroupChanges {
        let counts = Self::count_transitions(from.states, to.states, dimension);

        let mut changes = GroupChanges {
            dimension,
            period_type,
            from_period_key: from.period_key.to_string(),
            to_period_key: to.period_key.to_string(),
            upgraded: Vec::new(),
            downgraded: Vec::new(),
            unchanged: Vec::new(),
        };

        for (from_group, row) in counts.matrix {
            for (to_group, count) in row {
                let change = GroupChange {
                    from: from_group.clone(),
                    to: to_group.clone(),
                    count,
                };
                match rank(dimension, &to_group).cmp(&rank(dimension, &from_group)) {
                    Ordering::Greater => changes.upgraded.push(change),
                    Ordering::Less => changes.downgraded.push(change),
                    Ordering::Equal => changes.unchanged.push(change),
                }
            }
        }

        for list in [
            &mut changes.upgraded,
            &mut changes.downgraded,
            &mut changes.unchanged,
        ] {
            list.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.from.cmp(&b.from))
                    .then_with(|| a.to.cmp(&b.to))
            });
        }
        changes
    }
}
