//! Trend series over consecutive delta snapshots

use super::delta::DeltaDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net change of one raw counter between the last two snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricChange {
    pub current: f64,
    pub previous: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendComparison {
    pub current_period_key: String,
    pub previous_period_key: String,
    pub metrics: BTreeMap<String, MetricChange>,
}

/// Ordered snapshots for a report key and period-key range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub report_key: String,
    pub owner_id: String,
    pub from_period_key: String,
    pub to_period_key: String,
    pub snapshots: Vec<DeltaDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<TrendComparison>,
}
