//! Period Codec Tests
//!
//! Properties of the key codec over a span of instants: every instant lies
//! in the period its key decodes to, periods tile time without gaps and
//! keys survive a decode/encode cycle unchanged.

use crate::common::clock::{HOUR, JAN_06};
use customer_flow_report::period::{decode, encode, is_aligned, keys_between, keys_for_range};
use customer_flow_report::types::PeriodType;

/// Instants every 7 hours across roughly 14 months starting 2024-12-01
fn sample_instants() -> impl Iterator<Item = i64> {
    let start = JAN_06 - 36 * 24 * HOUR;
    (0..1_450).map(move |i| start + i * 7 * HOUR + (i % 13) * 60_000)
}

#[test]
fn test_every_instant_lies_in_its_period() {
    for period_type in PeriodType::ALL {
        for instant in sample_instants() {
            let key = encode(instant, period_type).unwrap();
            let range = decode(&key, period_type).unwrap();
            assert!(
                range.contains(instant),
                "{} {} does not contain {}",
                period_type,
                key,
                instant
            );
            assert_eq!(encode(range.start_ms, period_type).unwrap(), key);
            assert_eq!(encode(range.end_ms, period_type).unwrap(), key);
        }
    }
}

#[test]
fn test_consecutive_periods_tile_time() {
    let cases = [
        (PeriodType::Day, "2024-12-28", "2025-03-03"),
        (PeriodType::Week, "2024-12-02", "2025-03-03"),
        (PeriodType::Month, "2023-11", "2025-03"),
        (PeriodType::Year, "2019", "2026"),
    ];

    for (period_type, from, to) in cases {
        let keys = keys_between(from, to, period_type).unwrap();
        assert_eq!(keys.first().map(String::as_str), Some(from));
        assert_eq!(keys.last().map(String::as_str), Some(to));

        for pair in keys.windows(2) {
            let earlier = decode(&pair[0], period_type).unwrap();
            let later = decode(&pair[1], period_type).unwrap();
            assert_eq!(earlier.end_ms + 1, later.start_ms, "{} then {}", pair[0], pair[1]);
        }
    }
}

#[test]
fn test_calendar_lengths() {
    let days = |key: &str, period_type| {
        let range = decode(key, period_type).unwrap();
        (range.end_ms - range.start_ms + 1) / (24 * HOUR)
    };

    assert_eq!(days("2024-02", PeriodType::Month), 29);
    assert_eq!(days("2025-02", PeriodType::Month), 28);
    assert_eq!(days("2025-04", PeriodType::Month), 30);
    assert_eq!(days("2024", PeriodType::Year), 366);
    assert_eq!(days("2025", PeriodType::Year), 365);
    assert_eq!(days("2025-01-06", PeriodType::Week), 7);
}

#[test]
fn test_week_keys_normalise_to_monday() {
    let monday = decode("2025-01-06", PeriodType::Week).unwrap();
    for key in ["2025-01-07", "2025-01-09", "2025-01-12"] {
        assert_eq!(decode(key, PeriodType::Week).unwrap(), monday);
    }
    // A week spanning the new year is keyed by its Monday in December
    let new_year = decode("2025-01-01", PeriodType::Week).unwrap();
    assert_eq!(encode(new_year.start_ms, PeriodType::Day).unwrap(), "2024-12-30");
}

#[test]
fn test_keys_for_range_covers_partial_periods() {
    let keys = keys_for_range(JAN_06 - HOUR, JAN_06 + 40 * 24 * HOUR, PeriodType::Month).unwrap();
    assert_eq!(keys, vec!["2025-01", "2025-02"]);

    let weeks = keys_for_range(JAN_06, JAN_06 + 7 * 24 * HOUR, PeriodType::Week).unwrap();
    assert_eq!(weeks, vec!["2025-01-06", "2025-01-13"]);

    assert!(keys_for_range(JAN_06, JAN_06 - 1, PeriodType::Day).is_err());
}

#[test]
fn test_alignment() {
    let week = decode("2025-01-06", PeriodType::Week).unwrap();
    assert!(is_aligned(week.start_ms, week.end_ms, PeriodType::Week).unwrap());
    assert!(is_aligned(week.start_ms, week.end_ms, PeriodType::Day).unwrap());
    assert!(!is_aligned(week.start_ms, week.end_ms, PeriodType::Month).unwrap());
    assert!(!is_aligned(week.start_ms + 1, week.end_ms, PeriodType::Week).unwrap());

    let year = decode("2025", PeriodType::Year).unwrap();
    assert!(is_aligned(year.start_ms, year.end_ms, PeriodType::Month).unwrap());
}

#[test]
fn test_malformed_keys_rejected() {
    assert!(decode("2025-13", PeriodType::Month).is_err());
    assert!(decode("2025-02-30", PeriodType::Day).is_err());
    assert!(decode("2025-1-6", PeriodType::Day).is_err());
    assert!(decode("25", PeriodType::Year).is_err());
    assert!(decode("2025-01", PeriodType::Day).is_err());
    assert!(keys_between("2025-03", "2025-01", PeriodType::Month).is_err());
}
