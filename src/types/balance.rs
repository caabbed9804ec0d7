//! Point-in-time balances

use super::state::{Dimension, ProfileKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a balance was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum BalanceSource {
    /// Replayed from the latest classification per customer
    Direct { customers: usize },
    /// Folded from persisted delta documents
    #[serde(rename_all = "camelCase")]
    Summed {
        report_key: String,
        from_period_key: String,
        to_period_key: String,
        snapshot_count: usize,
    },
    /// No snapshot found at any granularity
    Empty,
}

impl Default for BalanceSource {
    fn default() -> Self {
        BalanceSource::Empty
    }
}

/// Scalar counters of a balance
///
/// For a summed balance `new_customers_in_period` and `active_in_period`
/// are the sums of the per-period inflows over the range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalance {
    pub total_customers: i64,
    pub new_customers_in_period: i64,
    pub active_in_period: i64,
    pub reactivation_value: f64,
    #[serde(rename = "totalLTV")]
    pub total_ltv: f64,
}

/// Absolute group membership counts and LTV sums
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub owner_id: String,
    /// Unix milliseconds
    pub as_of: i64,
    pub source: BalanceSource,
    pub raw: RawBalance,
    pub groups: BTreeMap<Dimension, BTreeMap<String, i64>>,
    pub ltv: BTreeMap<Dimension, BTreeMap<String, f64>>,
    pub layer3: BTreeMap<ProfileKind, BTreeMap<String, BTreeMap<String, i64>>>,
}

impl Balance {
    pub fn empty(owner_id: &str, as_of: i64) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            as_of,
            ..Default::default()
        }
    }

    /// Members of a group, 0 when absent
    pub fn group_count(&self, dimension: Dimension, group: &str) -> i64 {
        self.groups
            .get(&dimension)
            .and_then(|groups| groups.get(group))
            .copied()
            .unwrap_or(0)
    }

    pub fn group_ltv(&self, dimension: Dimension, group: &str) -> f64 {
        self.ltv
            .get(&dimension)
            .and_then(|groups| groups.get(group))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn sub_count(&self, kind: ProfileKind, sub_dimension: &str, group: &str) -> i64 {
        self.layer3
            .get(&kind)
            .and_then(|subs| subs.get(sub_dimension))
            .and_then(|groups| groups.get(group))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all group counts of a dimension
    pub fn dimension_total(&self, dimension: Dimension) -> i64 {
        self.groups
            .get(&dimension)
            .map(|groups| groups.values().sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.raw == RawBalance::default()
            && self.groups.values().all(|g| g.is_empty())
            && self.ltv.values().all(|g| g.is_empty())
            && self.layer3.values().all(|s| s.is_empty())
    }
}
