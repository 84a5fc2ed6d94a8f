//! Scalar aggregates over record collections.
//!
//! All functions accept any iterator of record references so they work on
//! whole layers (`&[Record]`) as well as on groups collected by
//! [`crate::breakdown`].

use std::collections::BTreeSet;

use flood_map_dataset_models::Record;
use flood_map_dataset_models::schema::SENTINEL_NOT_APPLICABLE;

/// Text values accepted as a set flag when a flag column holds no numbers.
const TRUTHY: &[&str] = &["1", "true", "sim", "yes"];

/// Sums a logical metric split across several columns.
///
/// Missing columns, non-numeric cells, the `88888` "not applicable" code and
/// negative values all contribute zero, so the result is never negative.
#[must_use]
pub fn sum_metric<'a>(records: impl IntoIterator<Item = &'a Record>, columns: &[&str]) -> f64 {
    records
        .into_iter()
        .flat_map(|record| columns.iter().map(move |c| metric_value(record, c)))
        .sum()
}

/// Value of one metric sub-column, with the sentinel and invalid values
/// zeroed.
#[must_use]
pub fn metric_value(record: &Record, column: &str) -> f64 {
    match record.number(column) {
        #[allow(clippy::float_cmp)]
        Some(v) if v == SENTINEL_NOT_APPLICABLE => 0.0,
        Some(v) if v > 0.0 => v,
        _ => 0.0,
    }
}

/// Plain sum of one numeric column; non-numeric cells are skipped.
#[must_use]
pub fn sum_column<'a>(records: impl IntoIterator<Item = &'a Record>, column: &str) -> f64 {
    records.into_iter().filter_map(|r| r.number(column)).sum()
}

/// Mean of one numeric column over the cells that hold a number. Zero when
/// there are none.
#[must_use]
pub fn mean_column<'a>(records: impl IntoIterator<Item = &'a Record>, column: &str) -> f64 {
    let (sum, n) = records
        .into_iter()
        .filter_map(|r| r.number(column))
        .fold((0.0, 0u32), |(sum, n), v| (sum + v, n + 1));

    if n == 0 { 0.0 } else { sum / f64::from(n) }
}

/// Counts records whose flag column is set.
///
/// When any cell of the column is numeric, a flag is set when it equals `1`.
/// Otherwise the column is read as text and `1`, `true`, `sim` and `yes`
/// (case-insensitive) count as set.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn count_flag<'a>(records: impl IntoIterator<Item = &'a Record>, column: &str) -> u64 {
    let records: Vec<&Record> = records.into_iter().collect();
    let numeric = records.iter().any(|r| r.number(column).is_some());

    let set = records.iter().filter(|r| {
        if numeric {
            r.number(column).is_some_and(|v| v == 1.0)
        } else {
            r.text(column)
                .is_some_and(|t| TRUTHY.contains(&t.trim().to_lowercase().as_str()))
        }
    });

    to_count(set.count())
}

/// Counts records whose text cell equals one of `values` (trimmed,
/// case-insensitive).
#[must_use]
pub fn count_equals<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    column: &str,
    values: &[&str],
) -> u64 {
    let wanted: Vec<String> = values.iter().map(|v| v.trim().to_lowercase()).collect();
    let n = records
        .into_iter()
        .filter(|r| {
            r.text(column)
                .is_some_and(|t| wanted.contains(&t.trim().to_lowercase()))
        })
        .count();
    to_count(n)
}

/// Number of distinct non-empty values of a column.
#[must_use]
pub fn count_unique<'a>(records: impl IntoIterator<Item = &'a Record>, column: &str) -> u64 {
    let distinct: BTreeSet<String> = records
        .into_iter()
        .filter_map(|r| r.text(column))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    to_count(distinct.len())
}

/// Converts a collection length into a count.
#[must_use]
pub fn to_count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
