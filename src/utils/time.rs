//! Time utilities for report periods
//!
//! All period arithmetic runs in the report timezone, Asia/Ho_Chi_Minh,
//! which has been a fixed UTC+07:00 without daylight saving since 1975.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Milliseconds in a day (24 × 60 × 60 × 1000)
pub const MS_PER_DAY: i64 = 86_400_000;

/// UTC offset of the report timezone
pub const REPORT_UTC_OFFSET_SECONDS: i32 = 7 * 3600;

/// Timestamps below this are taken to be seconds rather than milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// The report timezone as a chrono offset
pub fn report_offset() -> FixedOffset {
    FixedOffset::east_opt(REPORT_UTC_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Normalise a Unix timestamp that may be in seconds to milliseconds
///
/// # Examples
/// ```
/// use customer_flow_report::utils::time::to_millis;
/// assert_eq!(to_millis(1_736_150_400), 1_736_150_400_000);
/// assert_eq!(to_millis(1_736_150_400_000), 1_736_150_400_000);
/// assert_eq!(to_millis(0), 0);
/// ```
pub fn to_millis(timestamp: i64) -> i64 {
    if timestamp > 0 && timestamp < MILLIS_THRESHOLD {
        timestamp * 1000
    } else {
        timestamp
    }
}

/// Current Unix time in seconds
pub fn now_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Millisecond timestamp as a date-time in the report timezone
pub fn local_datetime(timestamp_ms: i64) -> AppResult<DateTime<FixedOffset>> {
    report_offset()
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| AppError::InvalidDateRange(format!("timestamp out of range: {}", timestamp_ms)))
}

/// Calendar date of a millisecond timestamp in the report timezone
pub fn local_date(timestamp_ms: i64) -> AppResult<NaiveDate> {
    Ok(local_datetime(timestamp_ms)?.date_naive())
}

/// Millisecond timestamp of local midnight starting `date`
pub fn local_midnight_ms(date: NaiveDate) -> AppResult<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::InvalidDateRange(format!("no midnight for {}", date)))?;
    let local = midnight
        .and_local_timezone(report_offset())
        .single()
        .ok_or_else(|| AppError::InvalidDateRange(format!("ambiguous midnight for {}", date)))?;
    Ok(local.timestamp_millis())
}

/// Render a millisecond timestamp as a local ISO 8601 date (YYYY-MM-DD)
///
/// Returns "1970-01-01" for invalid timestamps.
///
/// # Examples
/// ```
/// use customer_flow_report::utils::time::timestamp_to_iso;
/// // 2025-01-05 17:00:00 UTC is Monday 2025-01-06 00:00 in UTC+7
/// assert_eq!(timestamp_to_iso(1_736_096_400_000), "2025-01-06");
/// ```
pub fn timestamp_to_iso(timestamp_ms: i64) -> String {
    local_date(timestamp_ms)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| "1970-01-01".to_string())
}

/// Local date and time with offset, for console output
pub fn format_local_datetime(timestamp_ms: i64) -> String {
    local_datetime(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S %:z").to_string())
        .unwrap_or_else(|_| timestamp_ms.to_string())
}

/// Whole days between two millisecond timestamps, −1 when `since_ms` is unset
pub fn days_between(since_ms: i64, until_ms: i64) -> i64 {
    if since_ms <= 0 {
        return -1;
    }
    (until_ms - since_ms) / MS_PER_DAY
}
