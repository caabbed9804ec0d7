pub mod import;
pub mod report;
pub mod worker;

use crate::analysis::{OutputFormat, ReportEngine};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::period::decode;
use crate::types::PeriodType;
use crate::utils::time::to_millis;
use clap::Args;
use std::path::PathBuf;

/// Arguments shared by every report command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Database path (overrides config.toml and env vars)
    #[arg(long)]
    pub database_path: Option<PathBuf>,

    /// Output format: console, json or plotly
    #[arg(long, default_value = "console")]
    pub format: String,

    /// Write the output to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl CommonArgs {
    /// Open the engine configured by the CLI arguments and config
    pub fn open_engine(&self, app_config: &AppConfig) -> AppResult<ReportEngine> {
        let db_path = get_db_path_from_config(&self.database_path, app_config);
        if let Some(parent) = PathBuf::from(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        ReportEngine::new(&db_path, app_config.processing.worker_threads)
    }

    pub fn emit(&self, content: &str, description: &str) -> AppResult<()> {
        match &self.output {
            Some(path) => write_output_to_file(path, content, description),
            None => {
                print!("{}", content);
                Ok(())
            }
        }
    }
}

/// Database path from CLI argument or config
pub fn get_db_path_from_config(cli_path: &Option<PathBuf>, app_config: &AppConfig) -> String {
    cli_path
        .as_ref()
        .unwrap_or(&app_config.database.default_path)
        .to_string_lossy()
        .to_string()
}

pub fn parse_format(format_str: &str) -> AppResult<OutputFormat> {
    format_str.parse()
}

/// Write output to file with safe directory creation
pub fn write_output_to_file(path: &PathBuf, content: &str, description: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("{} written to: {}", description, path.display());
    Ok(())
}

/// Parse a point in time: Unix seconds or milliseconds, or a `YYYY-MM-DD`
/// date meaning its first (`end_of_day = false`) or last millisecond
pub fn parse_instant(value: &str, end_of_day: bool) -> AppResult<i64> {
    let trimmed = value.trim();
    if let Ok(timestamp) = trimmed.parse::<i64>() {
        return Ok(to_millis(timestamp));
    }

    let day = decode(trimmed, PeriodType::Day).map_err(|_| {
        AppError::InvalidDateRange(format!(
            "'{}' is neither a Unix timestamp nor a YYYY-MM-DD date",
            value
        ))
    })?;
    Ok(if end_of_day { day.end_ms } else { day.start_ms })
}
