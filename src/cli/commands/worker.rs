use super::{parse_instant, CommonArgs};
use crate::analysis::reports::utils::export_json;
use crate::config::AppConfig;
use crate::database::DirtyPeriodOperations;
use crate::errors::{AppError, AppResult};
use crate::period::decode;
use crate::processor::{DirtyWorker, WorkerRunStats};
use crate::types::PeriodType;
use clap::Args;
use tracing::info;

/// Queue periods for recomputation
#[derive(Args)]
pub struct MarkDirtyCommand {
    #[arg(long)]
    owner: String,

    /// Mark the periods of every customer report containing this instant
    #[arg(long, conflicts_with_all = ["report_key", "period_key"])]
    activity_at: Option<String>,

    /// Report key of an explicit period
    #[arg(long, requires = "period_key")]
    report_key: Option<String>,

    /// Period key of an explicit period
    #[arg(long, requires = "report_key")]
    period_key: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

impl MarkDirtyCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        let engine = self.common.open_engine(app_config)?;

        let marked = match (&self.activity_at, &self.report_key, &self.period_key) {
            (Some(activity_at), _, _) => {
                engine.mark_dirty_for_activity(&self.owner, parse_instant(activity_at, false)?)?
            }
            (None, Some(report_key), Some(period_key)) => {
                // Reject keys the worker could never recompute
                decode(period_key, PeriodType::from_report_key(report_key)?)?;
                engine.store().mark_dirty(report_key, period_key, &self.owner)?;
                vec![(report_key.clone(), period_key.clone())]
            }
            _ => {
                return Err(AppError::Config(
                    "Provide --activity-at or both --report-key and --period-key".to_string(),
                ))
            }
        };

        let mut output = String::new();
        for (report_key, period_key) in &marked {
            output.push_str(&format!("Marked dirty: {} {} ({})\n", report_key, period_key, self.owner));
        }
        output.push_str(&format!(
            "Pending periods: {}\n",
            engine.store().count_unprocessed_dirty_periods()?
        ));
        self.common.emit(&output, "Dirty marks")
    }
}

/// Recompute dirty periods
#[derive(Args)]
pub struct WorkerCommand {
    /// Keep running, draining the queue on an interval
    #[arg(long)]
    watch: bool,

    /// Seconds between runs in watch mode (minimum 60, overrides config.toml)
    #[arg(long)]
    interval_seconds: Option<u64>,

    /// Stop watch mode after this many runs
    #[arg(long)]
    max_runs: Option<usize>,

    /// Dirty periods claimed per batch (overrides config.toml)
    #[arg(long)]
    batch_size: Option<usize>,

    #[command(flatten)]
    common: CommonArgs,
}

impl WorkerCommand {
    fn summarise(&self, runs: &[WorkerRunStats]) -> AppResult<String> {
        if !self.common.format.eq_ignore_ascii_case("console") {
            return export_json(&runs);
        }

        let mut output = String::new();
        for (i, run) in runs.iter().enumerate() {
            output.push_str(&format!(
                "Run {}: {} claimed, {} recomputed, {} failed, {} re-marked ({:.2}s)\n",
                i + 1,
                run.claimed,
                run.recomputed,
                run.failed,
                run.remarked,
                run.elapsed_seconds
            ));
        }
        Ok(output)
    }

    pub async fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        let engine = self.common.open_engine(app_config)?;
        let batch_size = self.batch_size.unwrap_or(app_config.processing.batch_size);
        let worker = DirtyWorker::new(&engine, batch_size);

        let runs = if self.watch {
            let interval = self
                .interval_seconds
                .unwrap_or(app_config.worker.effective_interval_seconds());
            worker.run_on_interval(interval, self.max_runs).await?
        } else {
            vec![worker.run_once()?]
        };

        info!("Dirty worker finished after {} run(s)", runs.len());
        self.common.emit(&self.summarise(&runs)?, "Worker summary")
    }
}
