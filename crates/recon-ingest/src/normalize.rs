//! Value normalization
//!
//! Four total functions turn raw cells into canonical values. Every function
//! is idempotent on its own output and swallows parse failures: a cell that
//! cannot be understood becomes the field's neutral value, never an error.

use crate::cell::CellValue;
use crate::decode::RowRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use recon_core::models::{CanonicalField, CanonicalRow, ColumnMapping};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Days from the spreadsheet serial epoch (1899-12-30) to the Unix epoch
const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

/// Numeric values above this are epoch milliseconds, not seconds
const EPOCH_MILLIS_FLOOR: f64 = 10_000_000_000.0;

/// Upper bound (exclusive) of the spreadsheet serial date window
const SERIAL_DATE_CEILING: f64 = 100_000.0;

/// Normalize a phone-number-like value to bare ASCII digits.
///
/// Strips every non-digit, then removes one international dialing prefix:
/// a leading "1" on 11 digits, "01" on 12, or "001" on 13.
pub fn normalize_phone(value: &CellValue) -> String {
    let digits: String = value
        .to_text()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else if digits.len() == 12 && digits.starts_with("01") {
        digits[2..].to_string()
    } else if digits.len() == 13 && digits.starts_with("001") {
        digits[3..].to_string()
    } else {
        digits
    }
}

/// Normalize a timestamp-like value to Unix epoch seconds.
///
/// Numeric cells in (0, 100000) are spreadsheet serial dates (days since
/// 1899-12-30); above 1e10 they are epoch milliseconds; anything else
/// numeric is epoch seconds. Strings go through the format chain described
/// in the module docs. Unparseable values become None.
pub fn normalize_timestamp(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Null | CellValue::Bool(_) => None,
        CellValue::Integer(i) => numeric_timestamp(*i as f64),
        CellValue::Float(f) => numeric_timestamp(*f),
        CellValue::Date(serial) => numeric_timestamp(*serial),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            // A purely numeric string follows the numeric rules.
            if let Ok(n) = trimmed.parse::<f64>() {
                return numeric_timestamp(n);
            }
            parse_timestamp_text(trimmed)
        }
    }
}

fn numeric_timestamp(v: f64) -> Option<i64> {
    if !v.is_finite() {
        return None;
    }
    if v > 0.0 && v < SERIAL_DATE_CEILING {
        Some(((v - SERIAL_EPOCH_OFFSET_DAYS) * 86_400.0).round() as i64)
    } else if v > EPOCH_MILLIS_FLOOR {
        Some((v / 1_000.0).round() as i64)
    } else {
        Some(v.round() as i64)
    }
}

fn parse_timestamp_text(s: &str) -> Option<i64> {
    // US export format, no timezone: wall time is taken as UTC.
    for format in ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }

    // Offset-aware shapes.
    if s.contains('+') || s.contains('Z') || s.contains(" UTC") || s.contains(" GMT") {
        return parse_offset_aware(s);
    }

    parse_permissive(s)
}

fn parse_offset_aware(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%m/%d/%Y %H:%M:%S %z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.timestamp());
        }
    }
    // Named-zone suffixes: the zone is always UTC.
    for suffix in [" UTC", " GMT"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            return parse_permissive(stripped.trim());
        }
    }
    None
}

fn parse_permissive(s: &str) -> Option<i64> {
    // Negative UTC offsets carry none of the marker characters; RFC 3339
    // still has to win over the naive formats.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%d-%m-%Y %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }
    None
}

/// Normalize a duration-like value to integer seconds.
///
/// Empty and unparseable values become 0; fractions round to nearest. The
/// sign is preserved here; billing clamps negatives to zero.
pub fn normalize_duration(value: &CellValue) -> i64 {
    if value.is_empty() {
        return 0;
    }
    match value.as_f64() {
        Some(v) if v.is_finite() => v.round() as i64,
        _ => 0,
    }
}

/// Normalize a rate-like value to a non-negative exact decimal.
///
/// Empty, unparseable, and negative values become zero. Text goes through
/// an exact decimal parse first so `0.015` survives without binary noise.
pub fn normalize_rate(value: &CellValue) -> Decimal {
    let rate = match value {
        CellValue::Null | CellValue::Bool(_) => Decimal::ZERO,
        CellValue::Integer(i) => Decimal::from(*i),
        CellValue::Float(f) | CellValue::Date(f) => {
            if f.is_finite() {
                Decimal::from_f64(*f).unwrap_or(Decimal::ZERO)
            } else {
                Decimal::ZERO
            }
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Decimal::ZERO
            } else if let Ok(d) = Decimal::from_str(trimmed) {
                d
            } else {
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Decimal::from_f64(v).unwrap_or(Decimal::ZERO),
                    _ => Decimal::ZERO,
                }
            }
        }
    };
    rate.max(Decimal::ZERO)
}

/// Apply a column mapping to a decoded row, producing a canonical row.
///
/// Unmapped optional fields stay at their neutral values; negative
/// durations are clamped to zero per the canonical schema.
pub fn canonicalize(record: &RowRecord, mapping: &ColumnMapping) -> CanonicalRow {
    CanonicalRow {
        a_number: normalize_phone(mapped_cell(record, mapping, CanonicalField::ANumber)),
        b_number: normalize_phone(mapped_cell(record, mapping, CanonicalField::BNumber)),
        seize_time: normalize_timestamp(mapped_cell(record, mapping, CanonicalField::SeizeTime)),
        answer_time: normalize_timestamp(mapped_cell(record, mapping, CanonicalField::AnswerTime)),
        end_time: normalize_timestamp(mapped_cell(record, mapping, CanonicalField::EndTime)),
        billed_duration: normalize_duration(mapped_cell(
            record,
            mapping,
            CanonicalField::BilledDuration,
        ))
        .max(0),
        rate: normalize_rate(mapped_cell(record, mapping, CanonicalField::Rate)),
        lrn: normalize_phone(mapped_cell(record, mapping, CanonicalField::Lrn)),
        raw_index: record.index,
    }
}

/// Cell a canonical field maps to, Null when the field is unmapped
fn mapped_cell<'a>(
    record: &'a RowRecord,
    mapping: &ColumnMapping,
    field: CanonicalField,
) -> &'a CellValue {
    mapping
        .column(field)
        .map(|column| record.cell(column))
        .unwrap_or(&CellValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    // ==================== Phones ====================

    #[test]
    fn test_phone_strips_non_digits() {
        assert_eq!(normalize_phone(&text("(555) 123-4567")), "5551234567");
        assert_eq!(normalize_phone(&text("+1 555 123 4567")), "5551234567");
    }

    #[test]
    fn test_phone_prefix_rules() {
        assert_eq!(normalize_phone(&text("15551234567")), "5551234567");
        assert_eq!(normalize_phone(&text("015551234567")), "5551234567");
        assert_eq!(normalize_phone(&text("0015551234567")), "5551234567");
        // Applied once: only matching lengths strip.
        assert_eq!(normalize_phone(&text("5551234567")), "5551234567");
        assert_eq!(normalize_phone(&text("25551234567")), "25551234567");
    }

    #[test]
    fn test_phone_empty_and_numeric_cells() {
        assert_eq!(normalize_phone(&CellValue::Null), "");
        assert_eq!(normalize_phone(&text("")), "");
        assert_eq!(normalize_phone(&CellValue::Float(5551234567.0)), "5551234567");
        assert_eq!(normalize_phone(&CellValue::Integer(15551234567)), "5551234567");
    }

    #[test]
    fn test_phone_idempotent_and_shape_preserving() {
        for raw in ["1-555-123-4567", "x15551234567y", "  555.123.4567  "] {
            let once = normalize_phone(&text(raw));
            let twice = normalize_phone(&text(&once));
            assert_eq!(once, twice);
        }
        // Same digits, arbitrary separators: same output.
        assert_eq!(
            normalize_phone(&text("5551234567")),
            normalize_phone(&text("a5b5c5d1e2f3g4h5i6j7k"))
        );
    }

    // ==================== Timestamps ====================

    #[test]
    fn test_timestamp_empty_is_none() {
        assert_eq!(normalize_timestamp(&CellValue::Null), None);
        assert_eq!(normalize_timestamp(&text("  ")), None);
    }

    #[test]
    fn test_timestamp_serial_date_window() {
        // 45306.4375 = 2024-01-15 10:30:00 UTC
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
            .timestamp();
        assert_eq!(
            normalize_timestamp(&CellValue::Float(45_306.437_5)),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&CellValue::Date(45_306.437_5)),
            Some(expected)
        );
    }

    #[test]
    fn test_timestamp_epoch_seconds_and_millis() {
        assert_eq!(
            normalize_timestamp(&CellValue::Integer(1_705_314_600)),
            Some(1_705_314_600)
        );
        assert_eq!(
            normalize_timestamp(&CellValue::Integer(1_705_314_600_123)),
            Some(1_705_314_600)
        );
        assert_eq!(
            normalize_timestamp(&text("1705314600")),
            Some(1_705_314_600)
        );
    }

    #[test]
    fn test_timestamp_us_format_is_utc() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
            .timestamp();
        assert_eq!(normalize_timestamp(&text("1/15/2024 10:30:00")), Some(expected));
        assert_eq!(normalize_timestamp(&text("1/15/2024 10:30")), Some(expected));
        assert_eq!(normalize_timestamp(&text("01/15/2024 10:30:00")), Some(expected));
    }

    #[test]
    fn test_timestamp_offset_aware() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
            .timestamp();
        assert_eq!(
            normalize_timestamp(&text("2024-01-15T10:30:00Z")),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&text("2024-01-15T05:30:00-05:00")),
            Some(expected)
        );
        assert_eq!(
            normalize_timestamp(&text("2024-01-15 10:30:00 UTC")),
            Some(expected)
        );
    }

    #[test]
    fn test_timestamp_permissive_fallback() {
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
            .timestamp();
        assert_eq!(
            normalize_timestamp(&text("2024-01-15 10:30:00")),
            Some(expected)
        );
        let midnight = Utc
            .with_ymd_and_hms(2024, 1, 15, 0, 0, 0)
            .unwrap()
            .timestamp();
        assert_eq!(normalize_timestamp(&text("2024-01-15")), Some(midnight));
    }

    #[test]
    fn test_timestamp_garbage_is_none() {
        assert_eq!(normalize_timestamp(&text("not a date")), None);
        assert_eq!(normalize_timestamp(&text("13/45/2024 99:99")), None);
        assert_eq!(normalize_timestamp(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_timestamp_idempotent_on_output() {
        // The output domain is epoch seconds; feeding it back must be stable.
        let once = normalize_timestamp(&text("1/15/2024 10:30:00")).unwrap();
        assert_eq!(
            normalize_timestamp(&CellValue::Integer(once)),
            Some(once)
        );
    }

    // ==================== Durations ====================

    #[test]
    fn test_duration_rules() {
        assert_eq!(normalize_duration(&CellValue::Null), 0);
        assert_eq!(normalize_duration(&text("")), 0);
        assert_eq!(normalize_duration(&text("120")), 120);
        assert_eq!(normalize_duration(&text("120.6")), 121);
        assert_eq!(normalize_duration(&CellValue::Float(59.4)), 59);
        assert_eq!(normalize_duration(&text("garbage")), 0);
        assert_eq!(normalize_duration(&text("-30")), -30);
    }

    // ==================== Rates ====================

    #[test]
    fn test_rate_rules() {
        assert_eq!(normalize_rate(&CellValue::Null), Decimal::ZERO);
        assert_eq!(normalize_rate(&text("")), Decimal::ZERO);
        assert_eq!(normalize_rate(&text("0.015")), dec!(0.015));
        assert_eq!(normalize_rate(&CellValue::Integer(2)), dec!(2));
        assert_eq!(normalize_rate(&text("bad")), Decimal::ZERO);
        assert_eq!(normalize_rate(&text("-0.5")), Decimal::ZERO);
        assert_eq!(normalize_rate(&CellValue::Integer(-5)), Decimal::ZERO);
        assert_eq!(normalize_rate(&CellValue::Float(-0.25)), Decimal::ZERO);
    }

    #[test]
    fn test_rate_idempotent() {
        let once = normalize_rate(&text("0.0125"));
        let twice = normalize_rate(&text(&once.to_string()));
        assert_eq!(once, twice);
    }

    // ==================== Canonicalization ====================

    fn record(cells: &[(&str, CellValue)]) -> RowRecord {
        RowRecord {
            index: 7,
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn mapping() -> ColumnMapping {
        let mut m = ColumnMapping::new();
        m.set(CanonicalField::ANumber, "ANI");
        m.set(CanonicalField::BNumber, "DNIS");
        m.set(CanonicalField::SeizeTime, "Seize");
        m.set(CanonicalField::BilledDuration, "BillSec");
        m.set(CanonicalField::Rate, "Rate");
        m.set(CanonicalField::Lrn, "LRN");
        m
    }

    #[test]
    fn test_canonicalize_full_row() {
        let row = canonicalize(
            &record(&[
                ("ANI", text("1-555-123-4567")),
                ("DNIS", text("5559876543")),
                ("Seize", text("2024-01-15T10:30:00Z")),
                ("BillSec", text("120")),
                ("Rate", text("0.015")),
                ("LRN", text("5559876543")),
            ]),
            &mapping(),
        );
        assert_eq!(row.a_number, "5551234567");
        assert_eq!(row.b_number, "5559876543");
        assert_eq!(row.billed_duration, 120);
        assert_eq!(row.rate, dec!(0.015));
        assert_eq!(row.raw_index, 7);
        assert!(row.seize_time.is_some());
        assert_eq!(row.answer_time, None);
    }

    #[test]
    fn test_canonicalize_clamps_negatives_and_fills_neutral() {
        let row = canonicalize(
            &record(&[
                ("ANI", CellValue::Null),
                ("BillSec", text("-45")),
                ("Rate", text("-0.5")),
            ]),
            &mapping(),
        );
        assert_eq!(row.a_number, "");
        assert_eq!(row.billed_duration, 0);
        assert_eq!(row.rate, Decimal::ZERO);
        assert_eq!(row.seize_time, None);
        assert_eq!(row.lrn, "");
    }
}
