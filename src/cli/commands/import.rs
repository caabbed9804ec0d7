use super::CommonArgs;
use crate::analysis::reports::utils::export_json;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::processor::{ActivityImporter, ImportConfig, ProgressReporter};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Load customer activity history from CSV
#[derive(Args)]
pub struct ImportCommand {
    /// CSV file with owner_id,customer_id,activity_at,metrics columns
    #[arg(long)]
    csv_path: PathBuf,

    /// Rows per insert transaction
    #[arg(long, default_value_t = 5_000)]
    batch_size: usize,

    /// Progress report interval (rows) (overrides config.toml)
    #[arg(long)]
    progress_interval: Option<usize>,

    /// Do not queue the touched periods for recomputation
    #[arg(long)]
    no_mark_dirty: bool,

    /// Abort on the first invalid row
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    common: CommonArgs,
}

impl ImportCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        if !self.csv_path.exists() {
            return Err(AppError::Config(format!(
                "CSV file does not exist: {}",
                self.csv_path.display()
            )));
        }

        let config = ImportConfig {
            csv_path: self.csv_path.clone(),
            batch_size: self.batch_size,
            progress_interval: self
                .progress_interval
                .unwrap_or(app_config.processing.progress_interval),
            mark_dirty: !self.no_mark_dirty,
            strict: self.strict,
        };

        let mut engine = self.common.open_engine(app_config)?;
        let stats = ActivityImporter::new(config, &mut engine)?.import_file()?;
        ProgressReporter::finish_progress_line();
        info!("Import finished: {:?}", stats);

        if self.common.format.eq_ignore_ascii_case("console") {
            let summary = format!(
                "\n=== IMPORT COMPLETE ===\n\
                 Rows read: {}\n\
                 Imported: {}\n\
                 Malformed: {}\n\
                 Batches: {}\n\
                 Periods marked dirty: {}\n\
                 Time: {}\n",
                stats.total_rows,
                stats.imported,
                stats.malformed,
                stats.batches,
                stats.dirty_marked,
                ProgressReporter::format_elapsed_time(stats.elapsed_seconds)
            );
            self.common.emit(&summary, "Import summary")
        } else {
            self.common.emit(&export_json(&stats)?, "Import summary")
        }
    }
}
