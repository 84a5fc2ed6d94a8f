//! Per-category breakdowns.
//!
//! Grouping keys are trimmed and lower-cased so that `"Federal"` and
//! `"federal "` fall in one category, displayed with the first spelling seen.
//! Empty and placeholder values (`none`, `nan`, `sem informação`, ...) are
//! merged into a single "Outros" category.

use std::collections::BTreeMap;

use flood_map_analytics_models::{
    CategoryRow, CategorySummary, CountComparison, GroupedMetricRow, MetricComparison,
};
use flood_map_dataset_models::Record;
use flood_map_dataset_models::schema::OTHERS_LABEL;

use crate::metric::{sum_metric, to_count};

/// Normalized values that carry no category information.
const MISC_TOKENS: &[&str] = &[
    "",
    "none",
    "nan",
    "na",
    "null",
    "sem informação",
    "sem informacao",
    "outro",
    "outros",
];

/// How categories are ordered for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayOrder {
    /// Descending total, then alphabetical.
    #[default]
    ByTotal,
    /// Labels listed here first, in this order (case-insensitive); the rest
    /// alphabetically after them.
    Canonical(&'static [&'static str]),
}

/// One category while grouping.
#[derive(Debug)]
struct Bucket<'a> {
    label: String,
    total: Vec<&'a Record>,
    affected: Vec<&'a Record>,
}

impl Bucket<'_> {
    const fn new(label: String) -> Self {
        Self {
            label,
            total: Vec::new(),
            affected: Vec::new(),
        }
    }
}

/// Normalized key and display label for a record's category.
fn category(record: &Record, column: &str) -> (String, String) {
    let label = record
        .text(column)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    let key = label.to_lowercase();

    if MISC_TOKENS.contains(&key.as_str()) {
        return (OTHERS_LABEL.to_lowercase(), OTHERS_LABEL.to_string());
    }

    (key, label)
}

fn group<'a>(
    total: &'a [Record],
    affected: Option<&'a [Record]>,
    column: &str,
    order: DisplayOrder,
) -> Vec<Bucket<'a>> {
    let mut buckets: BTreeMap<String, Bucket<'a>> = BTreeMap::new();

    for record in total {
        let (key, label) = category(record, column);
        buckets
            .entry(key)
            .or_insert_with(|| Bucket::new(label))
            .total
            .push(record);
    }

    for record in affected.unwrap_or_default() {
        let (key, label) = category(record, column);
        buckets
            .entry(key)
            .or_insert_with(|| {
                log::debug!("Affected category '{label}' of {column} not present in totals");
                Bucket::new(label)
            })
            .affected
            .push(record);
    }

    let mut buckets: Vec<Bucket<'a>> = buckets.into_values().collect();
    sort(&mut buckets, order);
    buckets
}

fn sort(buckets: &mut [Bucket<'_>], order: DisplayOrder) {
    match order {
        DisplayOrder::ByTotal => buckets.sort_by(|a, b| {
            b.total
                .len()
                .cmp(&a.total.len())
                .then_with(|| alphabetical(&a.label, &b.label))
        }),
        DisplayOrder::Canonical(canonical) => {
            let rank = |label: &str| {
                canonical
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(label))
                    .unwrap_or(canonical.len())
            };
            buckets.sort_by(|a, b| {
                rank(&a.label)
                    .cmp(&rank(&b.label))
                    .then_with(|| alphabetical(&a.label, &b.label))
            });
        }
    }
}

fn alphabetical(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Counts records per category of `column`, total vs affected.
///
/// `affected` is `None` when no hazard is active; every affected count is
/// then zero.
#[must_use]
pub fn grouped_breakdown(
    total: &[Record],
    affected: Option<&[Record]>,
    column: &str,
    order: DisplayOrder,
) -> CategorySummary {
    let rows = group(total, affected, column, order)
        .into_iter()
        .map(|b| CategoryRow::new(b.label, to_count(b.total.len()), to_count(b.affected.len())))
        .collect();

    CategorySummary {
        column: column.to_string(),
        rows,
    }
}

/// Like [`grouped_breakdown`], additionally summing a metric (see
/// [`sum_metric`]) over each category.
#[must_use]
pub fn grouped_metric(
    total: &[Record],
    affected: Option<&[Record]>,
    column: &str,
    metric_columns: &[&str],
    order: DisplayOrder,
) -> Vec<GroupedMetricRow> {
    group(total, affected, column, order)
        .into_iter()
        .map(|b| GroupedMetricRow {
            count: CountComparison::new(to_count(b.total.len()), to_count(b.affected.len())),
            metric: MetricComparison::new(
                sum_metric(b.total.iter().copied(), metric_columns),
                sum_metric(b.affected.iter().copied(), metric_columns),
            ),
            label: b.label,
        })
        .collect()
}
