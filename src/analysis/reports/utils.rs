//! Utility functions for report formatting
//!
//! Provides shared formatting helpers used across all report formatters.

use crate::errors::AppResult;
use serde::Serialize;

/// Format number with thousand separators for console output
///
/// # Examples
///
/// ```
/// # use customer_flow_report::analysis::reports::utils::format_number;
/// assert_eq!(format_number(1234), "1,234");
/// assert_eq!(format_number(-1234567), "-1,234,567");
/// assert_eq!(format_number(904), "904");
/// ```
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let chars: Vec<char> = digits.chars().collect();
    let mut result = String::new();
    if n < 0 {
        result.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Money rounded to whole units with thousand separators
///
/// ```
/// # use customer_flow_report::analysis::reports::utils::format_money;
/// assert_eq!(format_money(1_500_000.4), "1,500,000");
/// assert_eq!(format_money(-2_499.6), "-2,500");
/// ```
pub fn format_money(value: f64) -> String {
    format_number(value.round() as i64)
}

/// Net value with an explicit sign, for flow columns
pub fn format_signed(n: i64) -> String {
    if n > 0 {
        format!("+{}", format_number(n))
    } else {
        format_number(n)
    }
}

/// Percentage with sign and two decimals
pub fn format_change(change_pct: f64) -> String {
    format!("{:+.2}%", change_pct)
}

/// Export data as JSON for programmatic use
pub fn export_json<T: Serialize>(data: &T) -> AppResult<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| crate::errors::AppError::Config(format!("JSON export failed: {}", e)))
}
