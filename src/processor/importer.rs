//! Activity history import from CSV
//!
//! Expected columns: `owner_id,customer_id,activity_at,metrics`, where
//! `activity_at` is Unix seconds or milliseconds and `metrics` is the JSON
//! metrics document. Lines starting with `#` are skipped.

use super::{ConfigValidator, ProgressMetrics, ProgressReporter, StandardProgressTracker};
use crate::analysis::{ReportEngine, ReportStore};
use crate::database::ActivityOperations;
use crate::errors::{AppError, AppResult};
use crate::period::encode;
use crate::types::{ActivityRecord, PeriodType};
use crate::utils::time::to_millis;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub csv_path: PathBuf,
    /// Rows per insert transaction
    pub batch_size: usize,
    pub progress_interval: usize,
    /// Queue the touched periods for recomputation
    pub mark_dirty: bool,
    /// Fail on the first invalid row instead of skipping it
    pub strict: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            csv_path: "./activity.csv".into(),
            batch_size: 5_000,
            progress_interval: 1_000,
            mark_dirty: true,
            strict: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    owner_id: String,
    customer_id: String,
    activity_at: i64,
    metrics: String,
}

impl ActivityRow {
    fn into_record(self, line: usize) -> AppResult<ActivityRecord> {
        let invalid = |reason: String| AppError::InvalidRecord { line, reason };

        if self.owner_id.trim().is_empty() {
            return Err(invalid("empty owner_id".to_string()));
        }
        if self.customer_id.trim().is_empty() {
            return Err(invalid("empty customer_id".to_string()));
        }
        if self.activity_at <= 0 {
            return Err(invalid(format!("non-positive activity_at {}", self.activity_at)));
        }

        let metrics: serde_json::Value = serde_json::from_str(&self.metrics)
            .map_err(|e| invalid(format!("metrics is not JSON: {}", e)))?;
        if !metrics.is_object() {
            return Err(invalid("metrics must be a JSON object".to_string()));
        }

        Ok(ActivityRecord::new(
            self.owner_id.trim(),
            self.customer_id.trim(),
            to_millis(self.activity_at),
            metrics,
        ))
    }
}

/// Import counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub total_rows: usize,
    pub imported: usize,
    pub malformed: usize,
    pub batches: usize,
    /// `(report key, period key, owner)` triples queued
    pub dirty_marked: usize,
    pub elapsed_seconds: f64,
}

impl ProgressMetrics for ImportStats {
    fn format_custom_metrics(&self) -> String {
        format!("Imported: {} | Malformed: {}", self.imported, self.malformed)
    }
}

/// Loads activity rows into the store and queues affected periods
pub struct ActivityImporter<'a, S: ReportStore> {
    config: ImportConfig,
    engine: &'a mut ReportEngine<S>,
}

impl<'a, S: ReportStore> ActivityImporter<'a, S> {
    pub fn new(config: ImportConfig, engine: &'a mut ReportEngine<S>) -> AppResult<Self> {
        ConfigValidator::validate_batch_config(config.batch_size, config.progress_interval)?;
        ConfigValidator::log_config_summary(
            "Activity Import",
            config.batch_size,
            config.progress_interval,
            Some(&format!("Source CSV: {}", config.csv_path.display())),
        );
        Ok(Self { config, engine })
    }

    /// Import the configured CSV file
    pub fn import_file(&mut self) -> AppResult<ImportStats> {
        let file = File::open(&self.config.csv_path).map_err(AppError::Io)?;
        self.import_reader(BufReader::new(file))
    }

    /// Import CSV content from any reader
    pub fn import_reader<R: Read>(&mut self, reader: R) -> AppResult<ImportStats> {
        let started = Instant::now();
        let mut stats = ImportStats::default();
        let mut csv_reader = ReaderBuilder::new()
            .comment(Some(b'#'))
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(AppError::Csv)?.clone();
        let mut batch = Vec::with_capacity(self.config.batch_size);
        // (owner, day key) → first timestamp seen; the day fixes the other three period keys
        let mut touched: BTreeMap<(String, String), i64> = BTreeMap::new();

        let mut progress_tracker = StandardProgressTracker::new();
        progress_tracker.start();

        for result in csv_reader.records() {
            let raw = result.map_err(AppError::Csv)?;
            let line = raw.position().map(|p| p.line() as usize).unwrap_or(0);
            stats.total_rows += 1;

            let parsed = raw
                .deserialize::<ActivityRow>(Some(&headers))
                .map_err(AppError::Csv)
                .and_then(|row| row.into_record(line));
            let record = match parsed {
                Ok(record) => record,
                Err(e) if self.config.strict => return Err(e),
                Err(e) => {
                    warn!("Skipping row: {}", e);
                    stats.malformed += 1;
                    continue;
                }
            };

            if self.config.mark_dirty {
                let day_key = encode(record.activity_at, PeriodType::Day)?;
                touched
                    .entry((record.owner_id.clone(), day_key))
                    .or_insert(record.activity_at);
            }
            batch.push(record);

            if batch.len() >= self.config.batch_size {
                self.flush(&mut batch, &mut stats)?;
            }

            if stats.total_rows % self.config.progress_interval == 0
                && progress_tracker.should_report()
            {
                ProgressReporter::report_progress_with_metrics(
                    &stats,
                    stats.total_rows,
                    None,
                    progress_tracker.elapsed_seconds(),
                )?;
            }
        }

        self.flush(&mut batch, &mut stats)?;

        for ((owner_id, _), activity_at) in &touched {
            stats.dirty_marked += self
                .engine
                .mark_dirty_for_activity(owner_id, *activity_at)?
                .len();
        }

        stats.elapsed_seconds = started.elapsed().as_secs_f64();
        ProgressReporter::report_completion("Activity Import", stats.total_rows, stats.elapsed_seconds);
        info!(
            "Imported {} activity rows ({} malformed, {} periods marked dirty)",
            stats.imported, stats.malformed, stats.dirty_marked
        );

        Ok(stats)
    }

    fn flush(&mut self, batch: &mut Vec<ActivityRecord>, stats: &mut ImportStats) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        stats.imported += self.engine.store_mut().insert_activity_batch(batch)?;
        stats.batches += 1;
        batch.clear();
        Ok(())
    }
}
