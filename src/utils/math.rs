//! Ratio and change calculations with zero-division handling
//!
//! Conversion rates are fractions (0.0 to 1.0); period-over-period changes
//! are percentages.

/// Tolerance below which a floating-point net is treated as zero
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Fraction `part / total`, returning 0.0 if total is zero.
///
/// # Examples
/// ```
/// use customer_flow_report::utils::math::safe_ratio;
///
/// assert_eq!(safe_ratio(1, 4), 0.25);
/// assert_eq!(safe_ratio(0, 10), 0.0);
/// assert_eq!(safe_ratio(5, 0), 0.0);  // Zero-division guard
/// ```
#[inline]
pub fn safe_ratio(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Calculate percentage safely for usize values, returning 0.0 if total is zero.
///
/// # Examples
/// ```
/// use customer_flow_report::utils::math::safe_percentage;
///
/// assert_eq!(safe_percentage(50, 100), 50.0);
/// assert_eq!(safe_percentage(50, 0), 0.0);
/// ```
#[inline]
pub fn safe_percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Percentage change from `previous` to `current`
///
/// Relative to `|previous|` so a shrinking negative net still reads as a
/// decline. From a zero baseline any movement is 100% and no movement is 0%.
///
/// # Examples
/// ```
/// use customer_flow_report::utils::math::change_percentage;
///
/// assert_eq!(change_percentage(15.0, 10.0), 50.0);
/// assert_eq!(change_percentage(-5.0, -10.0), 50.0);
/// assert_eq!(change_percentage(3.0, 0.0), 100.0);
/// assert_eq!(change_percentage(0.0, 0.0), 0.0);
/// ```
pub fn change_percentage(current: f64, previous: f64) -> f64 {
    if previous.abs() < FLOAT_EPSILON {
        if current.abs() < FLOAT_EPSILON {
            0.0
        } else {
            100.0
        }
    } else {
        (current - previous) / previous.abs() * 100.0
    }
}

/// Whether a floating-point value is zero within [`FLOAT_EPSILON`]
#[inline]
pub fn is_negligible(value: f64) -> bool {
    value.abs() < FLOAT_EPSILON
}
