//! Report formatting and output generation
//!
//! Provides formatting for report results via the [`ReportFormatter`] facade.
//! Supports Console, JSON, and Plotly output formats.

pub mod balance;
pub mod delta;
pub mod stats;
pub mod transition;
pub mod trend;
pub mod utils;

use crate::database::DatabaseStats;
use crate::errors::{AppError, AppResult};
use crate::types::{Balance, DeltaDocument, GroupChanges, TransitionMatrix, TrendReport};
use std::str::FromStr;

/// Output format options for reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    /// Plotly-compatible JSON (trend lines, transition Sankey)
    Plotly,
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "plotly" => Ok(OutputFormat::Plotly),
            _ => Err(AppError::Config(format!(
                "Invalid format '{}'. Valid options: console, json, plotly",
                s
            ))),
        }
    }
}

/// Facade for all report formatting operations
pub struct ReportFormatter;

impl ReportFormatter {
    // Utilities
    pub fn format_number(n: i64) -> String {
        utils::format_number(n)
    }
    pub fn format_money(value: f64) -> String {
        utils::format_money(value)
    }

    // Snapshots
    pub fn format_delta(d: &DeltaDocument, f: &OutputFormat) -> AppResult<String> {
        delta::format_delta(d, f)
    }
    pub fn format_deltas(d: &[DeltaDocument], f: &OutputFormat) -> AppResult<String> {
        delta::format_deltas(d, f)
    }

    // Balance
    pub fn format_balance(b: &Balance, f: &OutputFormat) -> AppResult<String> {
        balance::format_balance(b, f)
    }

    // Trend
    pub fn format_trend(r: &TrendReport, f: &OutputFormat) -> AppResult<String> {
        trend::format_trend(r, f)
    }

    // Transitions
    pub fn format_transition_matrix(m: &TransitionMatrix, f: &OutputFormat) -> AppResult<String> {
        transition::format_transition_matrix(m, f)
    }
    pub fn format_group_changes(c: &GroupChanges, f: &OutputFormat) -> AppResult<String> {
        transition::format_group_changes(c, f)
    }

    // Database
    pub fn format_database_stats(s: &DatabaseStats, f: &OutputFormat) -> AppResult<String> {
        stats::format_database_stats(s, f)
    }
}
