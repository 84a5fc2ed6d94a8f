#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Total-vs-affected aggregation for flood-map layers.
//!
//! [`metric`] holds the scalar aggregates (sentinel-aware metric sums, flag
//! counts), [`breakdown`] the normalized per-category counts, and [`impact`]
//! composes them into one summary per layer. Everything here is a pure
//! function of its inputs.

pub mod breakdown;
pub mod impact;
pub mod metric;

pub use breakdown::{DisplayOrder, grouped_breakdown, grouped_metric};
pub use flood_map_analytics_models::{MetricComparison, percentage};
pub use metric::{count_equals, count_flag, count_unique, mean_column, sum_column, sum_metric};
