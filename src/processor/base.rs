use crate::errors::{AppError, AppResult};
use std::time::Instant;
use tracing::{info, warn};

/// Largest batch accepted without a warning
const LARGE_BATCH_WARNING: usize = 100_000;

/// Progress tracking for long-running operations
pub struct StandardProgressTracker {
    start_time: Option<Instant>,
    last_report: Option<Instant>,
    report_interval_ms: u64,
}

impl Default for StandardProgressTracker {
    fn default() -> Self {
        Self {
            start_time: None,
            last_report: None,
            report_interval_ms: 500,
        }
    }
}

impl StandardProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        let now = Instant::now();
        self.start_time = Some(now);
        self.last_report = Some(now);
    }

    /// True at most once per report interval
    pub fn should_report(&mut self) -> bool {
        let now = Instant::now();
        match self.last_report {
            Some(last) if now.duration_since(last).as_millis() <= self.report_interval_ms as u128 => {
                false
            }
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start_time
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_batch_config(batch_size: usize, progress_interval: usize) -> AppResult<()> {
        if batch_size == 0 {
            return Err(AppError::Config(
                "Batch size must be greater than 0".to_string(),
            ));
        }
        if progress_interval == 0 {
            return Err(AppError::Config(
                "Progress interval must be greater than 0".to_string(),
            ));
        }
        if batch_size > LARGE_BATCH_WARNING {
            warn!(
                "Large batch size: {} - this may impact memory usage",
                batch_size
            );
        }
        Ok(())
    }

    pub fn log_config_summary(
        processor_name: &str,
        batch_size: usize,
        progress_interval: usize,
        additional_info: Option<&str>,
    ) {
        info!("=== {} Configuration ===", processor_name);
        info!("  Batch size: {}", batch_size);
        info!("  Progress interval: {}", progress_interval);
        if let Some(info) = additional_info {
            info!("  {}", info);
        }
    }
}

/// Processor-specific counters shown on the progress line
pub trait ProgressMetrics {
    /// e.g. "Imported: 100 | Malformed: 5"
    fn format_custom_metrics(&self) -> String;
}

/// Progress reporting utilities
pub struct ProgressReporter;

impl ProgressReporter {
    /// Human-readable elapsed time (days, hours, minutes, seconds)
    pub fn format_elapsed_time(elapsed_secs: f64) -> String {
        if elapsed_secs < 60.0 {
            return format!("{:.1}s", elapsed_secs);
        }

        let total = elapsed_secs.floor() as u64;
        let days = total / 86_400;
        let hours = (total % 86_400) / 3_600;
        let minutes = (total % 3_600) / 60;
        let seconds = total % 60;

        if elapsed_secs < 3_600.0 {
            format!("{}m {}s ({:.1}s)", minutes, seconds, elapsed_secs)
        } else if elapsed_secs < 86_400.0 {
            format!("{}h {}m {}s ({:.1}s)", hours, minutes, seconds, elapsed_secs)
        } else {
            format!(
                "{}d {}h {}m {}s ({:.1}s)",
                days, hours, minutes, seconds, elapsed_secs
            )
        }
    }

    fn rate(count: usize, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            count as f64 / elapsed_secs
        } else {
            0.0
        }
    }

    pub fn report_completion(operation: &str, total_processed: usize, elapsed: f64) {
        info!("=== {} Completed ===", operation);
        info!("  Total processed: {}", total_processed);
        info!("  Time elapsed: {}", Self::format_elapsed_time(elapsed));
        info!(
            "  Average rate: {:.1} items/sec",
            Self::rate(total_processed, elapsed)
        );
    }

    /// End an in-place progress line
    pub fn finish_progress_line() {
        println!();
    }

    pub fn format_standard_progress(
        processed_count: usize,
        total_estimate: Option<usize>,
        elapsed: f64,
        custom_metrics: &str,
    ) -> String {
        let progress_pct = match total_estimate {
            Some(total) if total > 0 => {
                format!(" ({:.1}%)", (processed_count as f64 / total as f64) * 100.0)
            }
            _ => String::new(),
        };

        format!(
            "Processed: {}{} | Rate: {:.1}/sec | Elapsed: {} | {}",
            processed_count,
            progress_pct,
            Self::rate(processed_count, elapsed),
            Self::format_elapsed_time(elapsed),
            custom_metrics
        )
    }

    pub fn print_progress_line(message: &str) -> AppResult<()> {
        use std::io::Write;
        print!("\r{}", message);
        std::io::stdout().flush().map_err(AppError::Io)?;
        Ok(())
    }

    pub fn report_progress_with_metrics<T: ProgressMetrics>(
        metrics: &T,
        processed_count: usize,
        total_estimate: Option<usize>,
        elapsed_secs: f64,
    ) -> AppResult<()> {
        let message = Self::format_standard_progress(
            processed_count,
            total_estimate,
            elapsed_secs,
            &metrics.format_custom_metrics(),
        );
        Self::print_progress_line(&message)
    }
}
