//! Balance reconstruction
//!
//! Two strategies produce the same `Balance` shape:
//!
//! - **Direct**: classify every customer's latest state at the target time
//!   and count absolute memberships. Exact, but reads every customer.
//! - **Summed**: fold persisted deltas over a range, starting from a zero
//!   balance. Cheap when coarse snapshots exist. Granularities are tried
//!   from the candidate table in order and the first one with snapshots wins.

use crate::classifier::classify_customers;
use crate::database::{ActivityOperations, SnapshotOperations};
use crate::errors::AppResult;
use crate::period::{encode, is_aligned, validate_range};
use crate::types::{
    Balance, BalanceSource, ClassifiedState, DeltaDocument, Dimension, GroupFlows, PeriodType,
    ProfileKind,
};
use crate::utils::math::is_negligible;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// How `get_balance` reconstructs a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum BalanceStrategy {
    Direct,
    /// Sum deltas from `from_ms`; `None` starts at the owner's first activity year
    #[serde(rename_all = "camelCase")]
    Summed { from_ms: Option<i64> },
}

/// One row of the summed-balance candidate table
pub struct SummedCandidate {
    pub period_type: PeriodType,
    /// Range must start and end on this granularity's boundaries
    pub requires_alignment: bool,
}

/// Longest granularity first; daily is the unconditional fallback
pub const SUMMED_CANDIDATES: [SummedCandidate; 4] = [
    SummedCandidate {
        period_type: PeriodType::Year,
        requires_alignment: true,
    },
    SummedCandidate {
        period_type: PeriodType::Month,
        requires_alignment: true,
    },
    SummedCandidate {
        period_type: PeriodType::Week,
        requires_alignment: true,
    },
    SummedCandidate {
        period_type: PeriodType::Day,
        requires_alignment: false,
    },
];

/// Balance reconstruction engine
pub struct BalanceReconstructor;

impl BalanceReconstructor {
    /// Absolute balance from the classification source
    ///
    /// Period-scoped counters (`newCustomersInPeriod`, `activeInPeriod`) have
    /// no meaning for a single instant and stay zero.
    pub fn direct<S>(source: &S, owner_id: &str, as_of_ms: i64, threads: usize) -> AppResult<Balance>
    where
        S: ActivityOperations + ?Sized,
    {
        let metrics = source.latest_metrics_at(owner_id, as_of_ms)?;
        let states = classify_customers(&metrics, as_of_ms, threads);
        debug!("Direct balance for {} over {} customers", owner_id, states.len());

        let mut balance = Self::fold_states(owner_id, as_of_ms, &states);
        balance.source = BalanceSource::Direct {
            customers: states.len(),
        };
        Ok(balance)
    }

    /// Fold classified states into absolute counts
    pub fn fold_states(
        owner_id: &str,
        as_of_ms: i64,
        states: &HashMap<String, ClassifiedState>,
    ) -> Balance {
        let mut balance = Balance::empty(owner_id, as_of_ms);

        for state in states.values() {
            balance.raw.total_customers += 1;
            balance.raw.total_ltv += state.total_spent;
            if state.is_vip_inactive() {
                balance.raw.reactivation_value += state.total_spent;
            }

            for dimension in Dimension::ALL {
                let label = state.label(dimension).to_string();
                *balance
                    .groups
                    .entry(dimension)
                    .or_default()
                    .entry(label.clone())
                    .or_default() += 1;
                *balance
                    .ltv
                    .entry(dimension)
                    .or_default()
                    .entry(label)
                    .or_default() += state.total_spent;
            }

            for kind in ProfileKind::ALL {
                if let Some(labels) = state.layer3.labels(kind) {
                    let profile = balance.layer3.entry(kind).or_default();
                    for (sub_dimension, label) in labels {
                        *profile
                            .entry(sub_dimension.to_string())
                            .or_default()
                            .entry(label.to_string())
                            .or_default() += 1;
                    }
                }
            }
        }

        for groups in balance.ltv.values_mut() {
            groups.retain(|_, value| !is_negligible(*value));
        }
        balance
    }

    /// Balance of `[from_ms, to_ms]` summed from stored deltas
    ///
    /// Returns an all-zero balance with `BalanceSource::Empty` when no
    /// granularity has snapshots for the range.
    pub fn summed<S>(store: &S, owner_id: &str, from_ms: i64, to_ms: i64) -> AppResult<Balance>
    where
        S: SnapshotOperations + ?Sized,
    {
        validate_range(from_ms, to_ms)?;

        for candidate in &SUMMED_CANDIDATES {
            let period_type = candidate.period_type;
            if candidate.requires_alignment && !is_aligned(from_ms, to_ms, period_type)? {
                continue;
            }

            let report_key = period_type.report_key();
            let from_key = encode(from_ms, period_type)?;
            let to_key = encode(to_ms, period_type)?;
            let documents = store.find_snapshots(report_key, owner_id, &from_key, &to_key)?;
            if documents.is_empty() {
                debug!("No {} snapshots for {} in {}..{}", report_key, owner_id, from_key, to_key);
                continue;
            }

            let mut balance = Self::fold_documents(owner_id, to_ms, &documents);
            balance.source = BalanceSource::Summed {
                report_key: report_key.to_string(),
                from_period_key: from_key,
                to_period_key: to_key,
                snapshot_count: documents.len(),
            };
            return Ok(balance);
        }

        Ok(Balance::empty(owner_id, to_ms))
    }

    /// Net every group over the documents, keeping non-zero groups only
    pub fn fold_documents(owner_id: &str, as_of_ms: i64, documents: &[DeltaDocument]) -> Balance {
        let mut balance = Balance::empty(owner_id, as_of_ms);

        for document in documents {
            let flows = &document.flows;
            balance.raw.total_customers += flows.raw.total_customers.net();
            balance.raw.new_customers_in_period += flows.raw.new_customers_in_period.inflow;
            balance.raw.active_in_period += flows.raw.active_in_period.inflow;
            balance.raw.reactivation_value += flows.raw.reactivation_value.net();
            balance.raw.total_ltv += flows.raw.total_ltv.net();

            for dimension in Dimension::ALL {
                add_net(balance.groups.entry(dimension).or_default(), flows.counts(dimension));
                add_net(balance.ltv.entry(dimension).or_default(), flows.ltv(dimension));
            }

            for kind in ProfileKind::ALL {
                let profile = balance.layer3.entry(kind).or_default();
                for (sub_dimension, groups) in flows.profile(kind) {
                    add_net(profile.entry(sub_dimension.clone()).or_default(), groups);
                }
            }
        }

        for groups in balance.groups.values_mut() {
            groups.retain(|_, count| *count != 0);
        }
        for groups in balance.ltv.values_mut() {
            groups.retain(|_, value| !is_negligible(*value));
        }
        for profile in balance.layer3.values_mut() {
            for groups in profile.values_mut() {
                groups.retain(|_, count| *count != 0);
            }
            profile.retain(|_, groups| !groups.is_empty());
        }
        if is_negligible(balance.raw.reactivation_value) {
            balance.raw.reactivation_value = 0.0;
        }
        if is_negligible(balance.raw.total_ltv) {
            balance.raw.total_ltv = 0.0;
        }

        balance
    }
}

fn add_net<T>(target: &mut BTreeMap<String, T>, flows: &GroupFlows<T>)
where
    T: crate::types::FlowValue,
{
    for (group, flow) in flows {
        *target.entry(group.clone()).or_default() += flow.net();
    }
}
