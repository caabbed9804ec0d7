//! Period key codec
//!
//! Converts a timestamp and granularity into a canonical period key and a
//! period key back into its inclusive millisecond range:
//!
//! | Granularity | Key          | Start                         |
//! |-------------|--------------|-------------------------------|
//! | day         | `YYYY-MM-DD` | local midnight of the date    |
//! | week        | `YYYY-MM-DD` | Monday of the ISO week        |
//! | month       | `YYYY-MM`    | first of the month            |
//! | year        | `YYYY`       | 1 January                     |
//!
//! The end of a period is the start of the next one minus one millisecond.
//! Calendar stepping goes through chrono, so month lengths and leap years
//! are never computed by hand.

use crate::errors::{AppError, AppResult};
use crate::types::PeriodType;
use crate::utils::time::{local_date, local_midnight_ms};
use chrono::{Datelike, Days, Months, NaiveDate};

/// Inclusive millisecond range of one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl PeriodRange {
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }
}

/// Canonical key of the period containing `timestamp_ms`
pub fn encode(timestamp_ms: i64, period_type: PeriodType) -> AppResult<String> {
    let date = local_date(timestamp_ms)?;
    Ok(format_key(period_start(date, period_type), period_type))
}

/// Inclusive range of a period key
///
/// Weekly keys that are not Mondays are normalised to the Monday of their week.
pub fn decode(period_key: &str, period_type: PeriodType) -> AppResult<PeriodRange> {
    let start = parse_key(period_key, period_type)?;
    let next = next_period_start(start, period_type).ok_or_else(|| invalid_key(period_key, period_type))?;
    Ok(PeriodRange {
        start_ms: local_midnight_ms(start)?,
        end_ms: local_midnight_ms(next)? - 1,
    })
}

/// First calendar day of the period containing `date`
pub fn period_start(date: NaiveDate, period_type: PeriodType) -> NaiveDate {
    match period_type {
        PeriodType::Day => date,
        PeriodType::Week => {
            let offset = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(offset)).unwrap_or(date)
        }
        PeriodType::Month => date.with_day(1).unwrap_or(date),
        PeriodType::Year => date.with_ordinal(1).unwrap_or(date),
    }
}

/// True when the range starts and ends exactly on period boundaries
pub fn is_aligned(start_ms: i64, end_ms: i64, period_type: PeriodType) -> AppResult<bool> {
    let first = decode(&encode(start_ms, period_type)?, period_type)?;
    let last = decode(&encode(end_ms, period_type)?, period_type)?;
    Ok(first.start_ms == start_ms && last.end_ms == end_ms)
}

/// Every period key from `from_key` to `to_key` inclusive, ascending
pub fn keys_between(from_key: &str, to_key: &str, period_type: PeriodType) -> AppResult<Vec<String>> {
    let mut current = parse_key(from_key, period_type)?;
    let last = parse_key(to_key, period_type)?;
    if current > last {
        return Err(AppError::InvalidDateRange(format!(
            "period key {} is after {}",
            from_key, to_key
        )));
    }

    let mut keys = Vec::new();
    while current <= last {
        keys.push(format_key(current, period_type));
        current = match next_period_start(current, period_type) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(keys)
}

/// Keys of the periods overlapping `[start_ms, end_ms]`
pub fn keys_for_range(start_ms: i64, end_ms: i64, period_type: PeriodType) -> AppResult<Vec<String>> {
    validate_range(start_ms, end_ms)?;
    keys_between(
        &encode(start_ms, period_type)?,
        &encode(end_ms, period_type)?,
        period_type,
    )
}

/// Reject ranges whose start is after their end
pub fn validate_range(start_ms: i64, end_ms: i64) -> AppResult<()> {
    if start_ms > end_ms {
        return Err(AppError::InvalidDateRange(format!(
            "start {} is after end {}",
            start_ms, end_ms
        )));
    }
    Ok(())
}

fn format_key(start: NaiveDate, period_type: PeriodType) -> String {
    match period_type {
        PeriodType::Day | PeriodType::Week => start.format("%Y-%m-%d").to_string(),
        PeriodType::Month => start.format("%Y-%m").to_string(),
        PeriodType::Year => start.format("%Y").to_string(),
    }
}

fn parse_key(period_key: &str, period_type: PeriodType) -> AppResult<NaiveDate> {
    let key = period_key.trim();
    let parsed = match period_type {
        PeriodType::Day | PeriodType::Week => NaiveDate::parse_from_str(key, "%Y-%m-%d").ok(),
        PeriodType::Month => NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d").ok(),
        PeriodType::Year => {
            if key.len() == 4 && key.chars().all(|c| c.is_ascii_digit()) {
                key.parse::<i32>()
                    .ok()
                    .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            } else {
                None
            }
        }
    };

    let date = parsed.ok_or_else(|| invalid_key(period_key, period_type))?;
    let start = period_start(date, period_type);

    // Reject loose forms such as "2025-1-6"
    let canonical = match period_type {
        PeriodType::Week => date.format("%Y-%m-%d").to_string(),
        _ => format_key(start, period_type),
    };
    if canonical != key {
        return Err(invalid_key(period_key, period_type));
    }
    Ok(start)
}

fn next_period_start(start: NaiveDate, period_type: PeriodType) -> Option<NaiveDate> {
    match period_type {
        PeriodType::Day => start.checked_add_days(Days::new(1)),
        PeriodType::Week => start.checked_add_days(Days::new(7)),
        PeriodType::Month => start.checked_add_months(Months::new(1)),
        PeriodType::Year => start.checked_add_months(Months::new(12)),
    }
}

fn invalid_key(period_key: &str, period_type: PeriodType) -> AppError {
    AppError::InvalidPeriodKey {
        key: period_key.to_string(),
        period_type: period_type.to_string(),
    }
}
