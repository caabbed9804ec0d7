//! Dirty-period reprocessing worker
//!
//! Drains the dirty queue in batches: each claimed period is recomputed and
//! then cleared. A period whose recomputation fails stays pending and is
//! retried on the next run.

use crate::analysis::{ReportEngine, ReportStore};
use crate::config::MIN_WORKER_INTERVAL_SECONDS;
use crate::database::DirtyPeriod;
use crate::errors::AppResult;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one drain of the queue
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerRunStats {
    pub claimed: usize,
    pub recomputed: usize,
    pub failed: usize,
    /// Recomputed but re-marked meanwhile; left pending
    pub remarked: usize,
    pub elapsed_seconds: f64,
}

type PeriodId = (String, String, String);

fn period_id(period: &DirtyPeriod) -> PeriodId {
    (
        period.report_key.clone(),
        period.period_key.clone(),
        period.owner_id.clone(),
    )
}

pub struct DirtyWorker<'a, S: ReportStore> {
    engine: &'a ReportEngine<S>,
    batch_size: usize,
}

impl<'a, S: ReportStore> DirtyWorker<'a, S> {
    pub fn new(engine: &'a ReportEngine<S>, batch_size: usize) -> Self {
        Self {
            engine,
            batch_size: batch_size.max(1),
        }
    }

    /// Recompute pending periods until the queue holds only failures
    pub fn run_once(&self) -> AppResult<WorkerRunStats> {
        let started = Instant::now();
        let mut stats = WorkerRunStats::default();
        let mut failed: HashSet<PeriodId> = HashSet::new();
        let mut remarked: HashSet<PeriodId> = HashSet::new();

        loop {
            // Over-fetch so periods that already failed this run don't starve the rest
            let limit = self.batch_size + failed.len() + remarked.len();
            let batch: Vec<DirtyPeriod> = self
                .engine
                .store()
                .unprocessed_dirty_periods(limit)?
                .into_iter()
                .filter(|p| {
                    let id = period_id(p);
                    !failed.contains(&id) && !remarked.contains(&id)
                })
                .take(self.batch_size)
                .collect();

            if batch.is_empty() {
                break;
            }
            debug!("Claimed {} dirty periods", batch.len());

            for period in batch {
                stats.claimed += 1;
                match self
                    .engine
                    .compute_period(&period.report_key, &period.period_key, &period.owner_id)
                {
                    Ok(_) => {
                        if self.engine.store().set_dirty_processed(&period)? {
                            stats.recomputed += 1;
                        } else {
                            stats.remarked += 1;
                            remarked.insert(period_id(&period));
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Recomputing {}/{} for {} failed: {}",
                            period.report_key, period.period_key, period.owner_id, e
                        );
                        stats.failed += 1;
                        failed.insert(period_id(&period));
                    }
                }
            }
        }

        stats.elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            "Dirty worker run: {} claimed, {} recomputed, {} failed, {} re-marked",
            stats.claimed, stats.recomputed, stats.failed, stats.remarked
        );
        Ok(stats)
    }

    /// Run on a fixed interval until `max_runs` runs complete or Ctrl-C
    pub async fn run_on_interval(
        &self,
        interval_seconds: u64,
        max_runs: Option<usize>,
    ) -> AppResult<Vec<WorkerRunStats>> {
        let period = Duration::from_secs(interval_seconds.max(MIN_WORKER_INTERVAL_SECONDS));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut runs = Vec::new();

        info!("Dirty worker scheduled every {}s", period.as_secs());
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Dirty worker interrupted");
                    break;
                }
            }

            runs.push(self.run_once()?);
            if max_runs.is_some_and(|max| runs.len() >= max) {
                break;
            }
        }

        Ok(runs)
    }
}
