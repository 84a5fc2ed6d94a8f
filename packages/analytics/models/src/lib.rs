#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Impact summary types.
//!
//! Every comparison pairs a value computed over a full layer with the same
//! value over the part of the layer affected by the active flood scenario.
//! When no scenario is active the affected side is zero.

use serde::{Deserialize, Serialize};

/// Share of `total` represented by `affected`, in percent.
///
/// Zero when `total` is zero (or not a positive finite number).
#[must_use]
pub fn percentage(affected: f64, total: f64) -> f64 {
    if total > 0.0 && total.is_finite() {
        affected / total * 100.0
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn count_percentage(affected: u64, total: u64) -> f64 {
    percentage(affected as f64, total as f64)
}

/// Total vs affected record count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountComparison {
    /// Records in the (filtered) layer.
    pub total: u64,
    /// Records classified as affected.
    pub affected: u64,
    /// `affected / total * 100`.
    pub percentage: f64,
}

impl CountComparison {
    /// Builds a comparison, deriving the percentage.
    #[must_use]
    pub fn new(total: u64, affected: u64) -> Self {
        Self {
            total,
            affected,
            percentage: count_percentage(affected, total),
        }
    }
}

/// Total vs affected value of one scalar metric (headcount, payroll, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    /// Metric over the full layer.
    pub total: f64,
    /// Metric over the affected records.
    pub affected: f64,
    /// `affected / total * 100`.
    pub percentage: f64,
}

impl MetricComparison {
    /// Builds a comparison, deriving the percentage.
    #[must_use]
    pub fn new(total: f64, affected: f64) -> Self {
        Self {
            total,
            affected,
            percentage: percentage(affected, total),
        }
    }
}

/// One category of a [`CategorySummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    /// Display label (first-seen spelling of the normalized key).
    pub label: String,
    /// Records in this category.
    pub total: u64,
    /// Affected records in this category.
    pub affected: u64,
    /// `affected / total * 100`.
    pub percentage: f64,
}

impl CategoryRow {
    /// Builds a row, deriving the percentage.
    #[must_use]
    pub fn new(label: impl Into<String>, total: u64, affected: u64) -> Self {
        Self {
            label: label.into(),
            total,
            affected,
            percentage: count_percentage(affected, total),
        }
    }
}

/// Per-category breakdown of one grouping column, already ordered for
/// display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Column the records were grouped by.
    pub column: String,
    /// Ordered rows.
    pub rows: Vec<CategoryRow>,
}

impl CategorySummary {
    /// Sum of `total` over all rows.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.total).sum()
    }

    /// Sum of `affected` over all rows.
    #[must_use]
    pub fn affected_count(&self) -> u64 {
        self.rows.iter().map(|r| r.affected).sum()
    }

    /// Looks a row up by its display label.
    #[must_use]
    pub fn row(&self, label: &str) -> Option<&CategoryRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One category of a grouped count plus a per-group metric sum
/// (schools and staff by dependency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedMetricRow {
    /// Display label.
    pub label: String,
    /// Record counts.
    pub count: CountComparison,
    /// Metric sums.
    pub metric: MetricComparison,
}

/// Companies layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyImpact {
    /// Establishments.
    pub companies: CountComparison,
    /// Employee headcount.
    pub employees: MetricComparison,
    /// Total payroll.
    pub payroll: MetricComparison,
    /// Mean of the average-salary column.
    pub mean_salary: MetricComparison,
    /// Breakdown by CNAE section.
    pub by_sector: CategorySummary,
}

/// A health establishment inside the flood extent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthUnitRow {
    /// Trade name.
    pub name: String,
    /// Establishment type.
    pub kind: String,
    /// Neighborhood.
    pub neighborhood: String,
    /// Street and number.
    pub address: String,
}

/// Health establishments layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthImpact {
    /// Establishments.
    pub units: CountComparison,
    /// Breakdown by establishment type (descending total).
    pub by_type: CategorySummary,
    /// Affected establishments, sorted by name.
    pub affected_units: Vec<HealthUnitRow>,
}

/// A school inside the flood extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRow {
    /// School name.
    pub name: String,
    /// Dependency label.
    pub dependency: String,
    /// Staff headcount.
    pub staff: f64,
}

/// Schools layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationImpact {
    /// Schools.
    pub schools: CountComparison,
    /// Staff headcount.
    pub staff: MetricComparison,
    /// Early childhood enrollment.
    pub enrollment_infant: MetricComparison,
    /// Elementary enrollment.
    pub enrollment_elementary: MetricComparison,
    /// High school enrollment.
    pub enrollment_high_school: MetricComparison,
    /// Technical enrollment.
    pub enrollment_technical: MetricComparison,
    /// Schools and staff per dependency, Federal/Estadual/Municipal/Privada
    /// first.
    pub by_dependency: Vec<GroupedMetricRow>,
    /// Affected schools, sorted by name.
    pub affected_schools: Vec<SchoolRow>,
}

/// A public building or security post inside the flood extent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRow {
    /// Name.
    pub name: String,
    /// Type.
    pub kind: String,
    /// Address.
    pub address: String,
}

/// Public buildings or security posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingImpact {
    /// Buildings.
    pub buildings: CountComparison,
    /// Breakdown by type.
    pub by_type: CategorySummary,
    /// Affected buildings, sorted by name.
    pub affected_buildings: Vec<BuildingRow>,
}

/// One street touched by the flood, with the number of affected segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetRow {
    /// Street identity key.
    pub street_id: String,
    /// Street type (Rua, Avenida, ...).
    pub kind: String,
    /// Street name.
    pub name: String,
    /// Affected segments of this street.
    pub segments: u64,
}

/// Street segments layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetImpact {
    /// Segments.
    pub segments: CountComparison,
    /// Distinct streets.
    pub streets: CountComparison,
    /// Segments with drainage.
    pub drainage: CountComparison,
    /// Segments with lighting.
    pub lighting: CountComparison,
    /// Affected streets, most affected segments first.
    pub affected_streets: Vec<StreetRow>,
}

/// Land parcels layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelImpact {
    /// Parcels.
    pub parcels: CountComparison,
    /// Parcels with water supply.
    pub water: CountComparison,
    /// Parcels with garbage collection.
    pub garbage_collection: CountComparison,
    /// Parcels with storm sewer.
    pub storm_sewer: CountComparison,
    /// Parcels in a condominium.
    pub condominium: CountComparison,
    /// Parcels connected to the sewer network.
    pub sewage_network: CountComparison,
    /// Parcels with a septic tank.
    pub sewage_septic: CountComparison,
}

/// Blocks layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockImpact {
    /// Blocks.
    pub blocks: CountComparison,
}

/// Real-estate cadastre layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstateImpact {
    /// Units.
    pub units: CountComparison,
    /// Units in a condominium.
    pub condominium: CountComparison,
    /// Breakdown by land use.
    pub by_use: CategorySummary,
    /// Breakdown by ownership.
    pub by_ownership: CategorySummary,
}

/// Impact of one flood scenario over every loaded layer.
///
/// A `None` layer was not loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Selected scenario, if any.
    pub scenario_id: Option<String>,
    /// Whether a hazard polygon was available for the scenario.
    pub hazard_active: bool,
    /// Area of the hazard region in square degrees.
    pub hazard_area: Option<f64>,
    /// Companies.
    pub companies: Option<CompanyImpact>,
    /// Health establishments.
    pub health: Option<HealthImpact>,
    /// Schools.
    pub education: Option<EducationImpact>,
    /// Public buildings.
    pub public_buildings: Option<BuildingImpact>,
    /// Security posts.
    pub security: Option<BuildingImpact>,
    /// Street segments.
    pub streets: Option<StreetImpact>,
    /// Land parcels.
    pub parcels: Option<ParcelImpact>,
    /// Blocks.
    pub blocks: Option<BlockImpact>,
    /// Real-estate units.
    pub real_estate: Option<RealEstateImpact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert!(percentage(5.0, 0.0).abs() < f64::EPSILON);
        assert!(percentage(0.0, 0.0).abs() < f64::EPSILON);
        assert!(percentage(1.0, f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn four_of_six_is_two_thirds() {
        let c = CountComparison::new(6, 4);
        assert!((c.percentage - 66.666_666_666_666_67).abs() < 1e-9);
    }

    #[test]
    fn summary_totals_sum_rows() {
        let summary = CategorySummary {
            column: "Tipo".to_string(),
            rows: vec![CategoryRow::new("A", 3, 1), CategoryRow::new("B", 2, 2)],
        };
        assert_eq!(summary.total_count(), 5);
        assert_eq!(summary.affected_count(), 3);
        assert_eq!(summary.row("B").map(|r| r.affected), Some(2));
        assert!(summary.row("C").is_none());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = ImpactReport {
            scenario_id: Some("may_2024".to_string()),
            hazard_active: true,
            blocks: Some(BlockImpact {
                blocks: CountComparison::new(10, 5),
            }),
            ..ImpactReport::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"scenarioId\":\"may_2024\""));
        assert!(json.contains("\"hazardActive\":true"));
        assert!(json.contains("\"realEstate\":null"));
    }
}
