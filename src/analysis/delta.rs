//! Delta computation
//!
//! Compares each customer's classification at the end of the previous
//! period with its classification at the end of this one and records only
//! the net transition. Intermediate reclassifications inside the period are
//! never visible here, which is what keeps summed deltas free of double
//! counting.

use crate::classifier::classify_customers;
use crate::database::ActivityOperations;
use crate::errors::AppResult;
use crate::period::validate_range;
use crate::types::{
    credit, debit, ClassifiedState, Dimension, Flow, GroupFlows, PeriodFlows, ProfileKind,
};
use std::collections::HashMap;
use tracing::debug;

/// Delta computer for one owner and one period
pub struct DeltaComputer;

impl DeltaComputer {
    /// Compute the flows of `[start_ms, end_ms]` from the classification source
    ///
    /// The start state is read as of `start_ms - 1`, the last instant of the
    /// previous period. Any source failure aborts the whole computation.
    pub fn compute<S>(
        source: &S,
        owner_id: &str,
        start_ms: i64,
        end_ms: i64,
        threads: usize,
    ) -> AppResult<PeriodFlows>
    where
        S: ActivityOperations + ?Sized,
    {
        validate_range(start_ms, end_ms)?;

        let before = start_ms - 1;
        let start_metrics = source.latest_metrics_at(owner_id, before)?;
        let end_metrics = source.latest_metrics_at(owner_id, end_ms)?;

        let start_states = classify_customers(&start_metrics, before, threads);
        let end_states = classify_customers(&end_metrics, end_ms, threads);

        debug!(
            "Computing delta for {}: {} customers at start, {} at end",
            owner_id,
            start_states.len(),
            end_states.len()
        );

        Ok(Self::accumulate(&start_states, &end_states, start_ms, end_ms))
    }

    /// Fold start and end state maps into period flows
    ///
    /// Customers only present at the start cannot occur with an append-only
    /// history and are ignored.
    pub fn accumulate(
        start_states: &HashMap<String, ClassifiedState>,
        end_states: &HashMap<String, ClassifiedState>,
        start_ms: i64,
        end_ms: i64,
    ) -> PeriodFlows {
        let mut flows = PeriodFlows::default();

        for (customer_id, end_state) in end_states {
            if end_state.ordered_within(start_ms, end_ms) {
                flows.raw.active_in_period.inflow += 1;
            }

            match start_states.get(customer_id) {
                None => record_new_customer(&mut flows, end_state),
                Some(start_state) if start_state.same_classification(end_state) => {
                    record_spend_change(&mut flows, start_state, end_state)
                }
                Some(start_state) => record_transition(&mut flows, start_state, end_state),
            }
        }

        flows
    }
}

fn record_new_customer(flows: &mut PeriodFlows, state: &ClassifiedState) {
    flows.raw.total_customers.inflow += 1;
    flows.raw.new_customers_in_period.inflow += 1;
    flows.raw.total_ltv.inflow += state.total_spent;
    if state.is_vip_inactive() {
        flows.raw.reactivation_value.inflow += state.total_spent;
    }

    for dimension in Dimension::ALL {
        let label = state.label(dimension);
        credit(flows.counts_mut(dimension), label, 1);
        credit(flows.ltv_mut(dimension), label, state.total_spent);
    }

    for kind in ProfileKind::ALL {
        if let Some(labels) = state.layer3.labels(kind) {
            let profile = flows.profile_mut(kind);
            for (sub_dimension, label) in labels {
                credit(profile.entry(sub_dimension.to_string()).or_default(), label, 1);
            }
        }
    }
}

fn record_transition(flows: &mut PeriodFlows, from: &ClassifiedState, to: &ClassifiedState) {
    flows.raw.total_customers.inflow += 1;
    flows.raw.total_customers.out += 1;

    if from.is_vip_inactive() {
        flows.raw.reactivation_value.out += from.total_spent;
    }
    if to.is_vip_inactive() {
        flows.raw.reactivation_value.inflow += to.total_spent;
    }

    for dimension in Dimension::ALL {
        let (from_label, to_label) = (from.label(dimension), to.label(dimension));
        if from_label == to_label {
            continue;
        }

        debit(flows.counts_mut(dimension), from_label, 1);
        credit(flows.counts_mut(dimension), to_label, 1);
        debit(flows.ltv_mut(dimension), from_label, from.total_spent);
        credit(flows.ltv_mut(dimension), to_label, to.total_spent);
    }

    // Total LTV follows the value tier map
    let spend_change = to.total_spent - from.total_spent;
    if from.label(Dimension::ValueTier) == to.label(Dimension::ValueTier) {
        shift(&mut flows.raw.total_ltv, spend_change);
    } else {
        flows.raw.total_ltv.out += from.total_spent;
        flows.raw.total_ltv.inflow += to.total_spent;
    }

    for dimension in Dimension::ALL {
        let label = to.label(dimension);
        if from.label(dimension) == label {
            shift_group(flows.ltv_mut(dimension), label, spend_change);
        }
    }

    for kind in ProfileKind::ALL {
        let profile = flows.profile_mut(kind);
        match (from.layer3.labels(kind), to.layer3.labels(kind)) {
            (Some(before), Some(after)) => {
                for ((sub_dimension, old), (_, new)) in before.into_iter().zip(after) {
                    if old != new {
                        let groups = profile.entry(sub_dimension.to_string()).or_default();
                        debit(groups, old, 1);
                        credit(groups, new, 1);
                    }
                }
            }
            (None, Some(after)) => {
                for (sub_dimension, label) in after {
                    credit(profile.entry(sub_dimension.to_string()).or_default(), label, 1);
                }
            }
            (Some(before), None) => {
                for (sub_dimension, label) in before {
                    debit(profile.entry(sub_dimension.to_string()).or_default(), label, 1);
                }
            }
            (None, None) => {}
        }
    }
}

/// Spend moved while every label stayed put: groups keep their customers
/// but their LTV follows the new total
fn record_spend_change(flows: &mut PeriodFlows, from: &ClassifiedState, to: &ClassifiedState) {
    let spend_change = to.total_spent - from.total_spent;
    if spend_change == 0.0 {
        return;
    }

    shift(&mut flows.raw.total_ltv, spend_change);
    if to.is_vip_inactive() {
        shift(&mut flows.raw.reactivation_value, spend_change);
    }
    for dimension in Dimension::ALL {
        shift_group(flows.ltv_mut(dimension), to.label(dimension), spend_change);
    }
}

/// Book a signed amount as inflow when positive and outflow when negative
fn shift(flow: &mut Flow<f64>, amount: f64) {
    if amount > 0.0 {
        flow.inflow += amount;
    } else if amount < 0.0 {
        flow.out -= amount;
    }
}

fn shift_group(groups: &mut GroupFlows<f64>, label: &str, amount: f64) {
    if amount > 0.0 {
        credit(groups, label, amount);
    } else if amount < 0.0 {
        debit(groups, label, -amount);
    }
}
