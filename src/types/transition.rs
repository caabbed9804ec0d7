//! Cross-period transition results

use super::period::PeriodType;
use super::state::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sankey node; ids are `<group>_from` / `<group>_to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: String,
    pub target: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyData {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

/// Transition counts between two points in time for one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionMatrix {
    pub dimension: Dimension,
    pub period_type: PeriodType,
    pub from_period_key: String,
    pub to_period_key: String,
    /// from group → to group → customers
    pub matrix: BTreeMap<String, BTreeMap<String, i64>>,
    /// from group → to group → share of the from-group row (0.0..=1.0)
    pub conversion_rates: BTreeMap<String, BTreeMap<String, f64>>,
    /// Customers present on both sides
    pub participants: usize,
    /// Present only at the from point (exits)
    pub from_only: usize,
    /// Present only at the to point (entries)
    pub to_only: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sankey: Option<SankeyData>,
}

impl TransitionMatrix {
    pub fn count(&self, from: &str, to: &str) -> i64 {
        self.matrix
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0)
    }

    pub fn rate(&self, from: &str, to: &str) -> f64 {
        self.conversion_rates
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0.0)
    }
}

/// One (from, to) pair and how many customers made it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChange {
    pub from: String,
    pub to: String,
    pub count: i64,
}

/// Ordinal classification of transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChanges {
    pub dimension: Dimension,
    pub period_type: PeriodType,
    pub from_period_key: String,
    pub to_period_key: String,
    pub upgraded: Vec<GroupChange>,
    pub downgraded: Vec<GroupChange>,
    pub unchanged: Vec<GroupChange>,
}

impl GroupChanges {
    pub fn upgraded_total(&self) -> i64 {
        self.upgraded.iter().map(|c| c.count).sum()
    }

    pub fn downgraded_total(&self) -> i64 {
        self.downgraded.iter().map(|c| c.count).sum()
    }

    pub fn unchanged_total(&self) -> i64 {
        self.unchanged.iter().map(|c| c.count).sum()
    }
}
