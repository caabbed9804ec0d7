//! Trend series and period-over-period comparison

use crate::types::{DeltaDocument, MetricChange, RawFlows, TrendComparison};
use crate::utils::math::change_percentage;
use std::collections::BTreeMap;

/// Raw counters compared between periods, as `(name, net of the counter)`
fn raw_nets(raw: &RawFlows) -> [(&'static str, f64); 5] {
    [
        ("totalCustomers", raw.total_customers.net() as f64),
        ("newCustomersInPeriod", raw.new_customers_in_period.net() as f64),
        ("activeInPeriod", raw.active_in_period.net() as f64),
        ("reactivationValue", raw.reactivation_value.net()),
        ("totalLTV", raw.total_ltv.net()),
    ]
}

pub struct TrendAnalyser;

impl TrendAnalyser {
    /// Compare the last two snapshots of an ascending series
    ///
    /// `None` when fewer than two snapshots exist.
    pub fn compare_latest(snapshots: &[DeltaDocument]) -> Option<TrendComparison> {
        let [.., previous, current] = snapshots else {
            return None;
        };
        Some(Self::compare(previous, current))
    }

    /// Per raw counter: `current = in − out` of each period and the percentage change
    pub fn compare(previous: &DeltaDocument, current: &DeltaDocument) -> TrendComparison {
        let metrics: BTreeMap<String, MetricChange> = raw_nets(&current.flows.raw)
            .into_iter()
            .zip(raw_nets(&previous.flows.raw))
            .map(|((name, current), (_, previous))| {
                (
                    name.to_string(),
                    MetricChange {
                        current,
                        previous,
                        change_pct: change_percentage(current, previous),
                    },
                )
            })
            .collect();

        TrendComparison {
            current_period_key: current.period_key.clone(),
            previous_period_key: previous.period_key.clone(),
            metrics,
        }
    }
}
