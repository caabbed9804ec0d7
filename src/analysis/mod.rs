//! Customer flow report analysis
//!
//! The analysis module is organised around the `ReportEngine`, which owns
//! the storage handle and exposes the public report operations:
//!
//! - **Delta computation** - per-period in/out flows, persisted as snapshots
//! - **Balance reconstruction** - direct replay or summed deltas
//! - **Trend** - snapshot series with a last-two-periods comparison
//! - **Transitions** - matrices, conversion rates, Sankey data and ranked group changes
//! - **Dirty marking** - queueing periods touched by new activity
//! - **Report generation** - console, JSON and Plotly output in [`reports`]
//!
//! ## Usage
//!
//! ```rust
//! use customer_flow_report::analysis::{BalanceStrategy, ReportEngine};
//! use customer_flow_report::errors::AppResult;
//! use customer_flow_report::types::PeriodType;
//!
//! fn example() -> AppResult<()> {
//!     let engine = ReportEngine::new(":memory:", 4)?;
//!
//!     let delta = engine.compute_period("customer_daily", "2025-01-06", "org-1")?;
//!     let balance = engine.get_balance("org-1", 1_736_182_799_999, BalanceStrategy::Direct)?;
//!     let trend = engine.get_trend("org-1", "customer_daily", "2025-01-01", "2025-01-06")?;
//!     Ok(())
//! }
//! ```

pub mod balance;
pub mod delta;
pub mod reports;
pub mod transition;
pub mod trend;

pub use balance::{BalanceReconstructor, BalanceStrategy, SummedCandidate, SUMMED_CANDIDATES};
pub use delta::DeltaComputer;
pub use reports::{OutputFormat, ReportFormatter};
pub use transition::{rank, PeriodStates, TransitionAnalyser, TransitionCounts, UNRANKED};
pub use trend::TrendAnalyser;

use crate::classifier::classify_customers;
use crate::database::{ActivityOperations, Database, DirtyPeriodOperations, SnapshotOperations};
use crate::errors::{AppError, AppResult};
use crate::period::{decode, encode, keys_between, validate_range, PeriodRange};
use crate::types::{
    Balance, ClassifiedState, DeltaDocument, Dimension, GroupChanges, PeriodType, TransitionMatrix,
    TrendReport,
};
use crate::utils::time::to_millis;
use std::collections::HashMap;
use tracing::{debug, info};

/// Storage the engine needs: classification source, snapshots and dirty queue
pub trait ReportStore: ActivityOperations + SnapshotOperations + DirtyPeriodOperations {}

impl<T> ReportStore for T where T: ActivityOperations + SnapshotOperations + DirtyPeriodOperations {}

/// Main report engine
///
/// Generic over its store so a failing classification source can be
/// substituted in tests; production code uses `Database`.
pub struct ReportEngine<S: ReportStore = Database> {
    store: S,
    worker_threads: usize,
}

impl ReportEngine<Database> {
    /// Create an engine over the database at `database_path`
    pub fn new(database_path: &str, worker_threads: usize) -> AppResult<Self> {
        let database = Database::new(database_path)?;
        Ok(Self::with_store(database, worker_threads))
    }
}

impl<S: ReportStore> ReportEngine<S> {
    pub fn with_store(store: S, worker_threads: usize) -> Self {
        Self {
            store,
            worker_threads: worker_threads.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Compute and persist the delta of `[start_ms, end_ms]`
    ///
    /// The document is stored under the report key of `period_type` with the
    /// period key of `start_ms`. Nothing is written if any read fails.
    pub fn compute_delta(
        &self,
        owner_id: &str,
        start_ms: i64,
        end_ms: i64,
        period_type: PeriodType,
    ) -> AppResult<DeltaDocument> {
        validate_range(start_ms, end_ms)?;
        let period_key = encode(start_ms, period_type)?;

        let flows = DeltaComputer::compute(&self.store, owner_id, start_ms, end_ms, self.worker_threads)?;
        let document = DeltaDocument::new(period_type.report_key(), &period_key, owner_id, flows);
        let stored = self.store.upsert_snapshot(&document)?;

        info!(
            "Computed {}/{} for {} ({} customers in, {} out)",
            stored.report_key,
            stored.period_key,
            owner_id,
            stored.flows.raw.total_customers.inflow,
            stored.flows.raw.total_customers.out
        );
        Ok(stored)
    }

    /// Compute one period identified by its report and period keys
    pub fn compute_period(
        &self,
        report_key: &str,
        period_key: &str,
        owner_id: &str,
    ) -> AppResult<DeltaDocument> {
        let period_type = PeriodType::from_report_key(report_key)?;
        let range = decode(period_key, period_type)?;
        self.compute_delta(owner_id, range.start_ms, range.end_ms, period_type)
    }

    /// Compute every period from `from_key` to `to_key` inclusive
    pub fn compute_range(
        &self,
        owner_id: &str,
        period_type: PeriodType,
        from_key: &str,
        to_key: &str,
    ) -> AppResult<Vec<DeltaDocument>> {
        keys_between(from_key, to_key, period_type)?
            .iter()
            .map(|key| self.compute_period(period_type.report_key(), key, owner_id))
            .collect()
    }

    /// Stored snapshot, `None` when it was never computed
    pub fn get_snapshot(
        &self,
        report_key: &str,
        period_key: &str,
        owner_id: &str,
    ) -> AppResult<Option<DeltaDocument>> {
        PeriodType::from_report_key(report_key)?;
        self.store.get_snapshot(report_key, period_key, owner_id)
    }

    /// Balance as of `as_of_ms`
    pub fn get_balance(
        &self,
        owner_id: &str,
        as_of_ms: i64,
        strategy: BalanceStrategy,
    ) -> AppResult<Balance> {
        match strategy {
            BalanceStrategy::Direct => {
                BalanceReconstructor::direct(&self.store, owner_id, as_of_ms, self.worker_threads)
            }
            BalanceStrategy::Summed { from_ms } => {
                let from_ms = match from_ms {
                    Some(from_ms) => from_ms,
                    None => match self.store.earliest_activity_at(owner_id)? {
                        // Start of the first activity's year keeps coarse snapshots usable
                        Some(earliest) => year_start(earliest)?,
                        None => return Ok(Balance::empty(owner_id, as_of_ms)),
                    },
                };
                if from_ms > as_of_ms {
                    return Ok(Balance::empty(owner_id, as_of_ms));
                }
                BalanceReconstructor::summed(&self.store, owner_id, from_ms, as_of_ms)
            }
        }
    }

    /// Stored snapshots of `[from_key, to_key]`, ascending, with a comparison
    /// of the last two
    pub fn get_trend(
        &self,
        owner_id: &str,
        report_key: &str,
        from_key: &str,
        to_key: &str,
    ) -> AppResult<TrendReport> {
        let period_type = PeriodType::from_report_key(report_key)?;
        let from = decode(from_key, period_type)?;
        let to = decode(to_key, period_type)?;
        validate_range(from.start_ms, to.end_ms)?;

        // Canonical keys so non-Monday weekly input still matches stored keys
        let from_key = encode(from.start_ms, period_type)?;
        let to_key = encode(to.start_ms, period_type)?;

        let snapshots = self
            .store
            .find_snapshots(report_key, owner_id, &from_key, &to_key)?;
        let comparison = TrendAnalyser::compare_latest(&snapshots);
        debug!("Trend {} {}..{}: {} snapshots", report_key, from_key, to_key, snapshots.len());

        Ok(TrendReport {
            report_key: report_key.to_string(),
            owner_id: owner_id.to_string(),
            from_period_key: from_key,
            to_period_key: to_key,
            snapshots,
            comparison,
        })
    }

    /// Transition matrix of `dimension` between the ends of two periods
    ///
    /// The period type is inferred from the key shape when not given.
    pub fn get_transition_matrix(
        &self,
        owner_id: &str,
        from_key: &str,
        to_key: &str,
        period_type: Option<PeriodType>,
        dimension: Dimension,
        include_sankey: bool,
    ) -> AppResult<TransitionMatrix> {
        let (period_type, from_states, to_states) =
            self.transition_states(owner_id, from_key, to_key, period_type)?;

        Ok(TransitionAnalyser::transition_matrix(
            PeriodStates::new(from_key, &from_states),
            PeriodStates::new(to_key, &to_states),
            dimension,
            period_type,
            include_sankey,
        ))
    }

    /// Upgraded, downgraded and unchanged group moves between two periods
    pub fn get_group_changes(
        &self,
        owner_id: &str,
        from_key: &str,
        to_key: &str,
        period_type: Option<PeriodType>,
        dimension: Dimension,
    ) -> AppResult<GroupChanges> {
        let (period_type, from_states, to_states) =
            self.transition_states(owner_id, from_key, to_key, period_type)?;

        Ok(TransitionAnalyser::group_changes(
            PeriodStates::new(from_key, &from_states),
            PeriodStates::new(to_key, &to_states),
            dimension,
            period_type,
        ))
    }

    /// Mark the periods containing `timestamp` dirty for every customer report
    ///
    /// Accepts seconds or milliseconds. Returns the `(report key, period key)`
    /// pairs that were marked.
    pub fn mark_dirty_for_activity(
        &self,
        owner_id: &str,
        timestamp: i64,
    ) -> AppResult<Vec<(String, String)>> {
        let timestamp_ms = to_millis(timestamp);
        let mut marked = Vec::with_capacity(PeriodType::ALL.len());

        for period_type in PeriodType::ALL {
            let period_key = encode(timestamp_ms, period_type)?;
            self.store
                .mark_dirty(period_type.report_key(), &period_key, owner_id)?;
            marked.push((period_type.report_key().to_string(), period_key));
        }

        debug!("Marked {} periods dirty for {} at {}", marked.len(), owner_id, timestamp_ms);
        Ok(marked)
    }

    /// Classified states of every customer at `as_of_ms`
    pub fn states_at(&self, owner_id: &str, as_of_ms: i64) -> AppResult<HashMap<String, ClassifiedState>> {
        let metrics = self.store.latest_metrics_at(owner_id, as_of_ms)?;
        Ok(classify_customers(&metrics, as_of_ms, self.worker_threads))
    }

    fn transition_states(
        &self,
        owner_id: &str,
        from_key: &str,
        to_key: &str,
        period_type: Option<PeriodType>,
    ) -> AppResult<(
        PeriodType,
        HashMap<String, ClassifiedState>,
        HashMap<String, ClassifiedState>,
    )> {
        let period_type = match period_type {
            Some(period_type) => period_type,
            None => PeriodType::infer_from_key(from_key)?,
        };
        let from: PeriodRange = decode(from_key, period_type)?;
        let to: PeriodRange = decode(to_key, period_type)?;
        if from.start_ms > to.start_ms {
            return Err(AppError::InvalidDateRange(format!(
                "period {} is after {}",
                from_key, to_key
            )));
        }

        let from_states = self.states_at(owner_id, from.end_ms)?;
        let to_states = self.states_at(owner_id, to.end_ms)?;
        Ok((period_type, from_states, to_states))
    }
}

fn year_start(timestamp_ms: i64) -> AppResult<i64> {
    let key = encode(timestamp_ms, PeriodType::Year)?;
    Ok(decode(&key, PeriodType::Year)?.start_ms)
}
