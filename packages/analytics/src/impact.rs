//! Per-layer impact summaries.
//!
//! Each function takes the full (filtered) layer and its affected subset,
//! `None` when no hazard is active.

use std::collections::BTreeMap;

use flood_map_analytics_models::{
    BlockImpact, BuildingImpact, BuildingRow, CompanyImpact, CountComparison, EducationImpact,
    HealthImpact, HealthUnitRow, MetricComparison, ParcelImpact, RealEstateImpact, SchoolRow,
    StreetImpact, StreetRow,
};
use flood_map_dataset_models::schema::{
    building, company, dependency_label, health, parcel, real_estate, school, street,
};
use flood_map_dataset_models::Record;

use crate::breakdown::{DisplayOrder, grouped_breakdown, grouped_metric};
use crate::metric::{
    count_equals, count_flag, count_unique, mean_column, sum_column, sum_metric, to_count,
};

fn affected_records(affected: Option<&[Record]>) -> &[Record] {
    affected.unwrap_or_default()
}

fn counts(total: &[Record], affected: Option<&[Record]>) -> CountComparison {
    CountComparison::new(
        to_count(total.len()),
        to_count(affected_records(affected).len()),
    )
}

fn compare_counts(
    total: &[Record],
    affected: Option<&[Record]>,
    count: impl Fn(&[Record]) -> u64,
) -> CountComparison {
    CountComparison::new(count(total), count(affected_records(affected)))
}

fn compare_metric(
    total: &[Record],
    affected: Option<&[Record]>,
    metric: impl Fn(&[Record]) -> f64,
) -> MetricComparison {
    MetricComparison::new(metric(total), metric(affected_records(affected)))
}

fn text(record: &Record, column: &str) -> String {
    record
        .text(column)
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Companies: establishments, employees, payroll, mean salary and a
/// breakdown by sector.
#[must_use]
pub fn company_impact(total: &[Record], affected: Option<&[Record]>) -> CompanyImpact {
    CompanyImpact {
        companies: counts(total, affected),
        employees: compare_metric(total, affected, |r| sum_column(r, company::EMPLOYEES)),
        payroll: compare_metric(total, affected, |r| sum_column(r, company::PAYROLL)),
        mean_salary: compare_metric(total, affected, |r| mean_column(r, company::MEAN_SALARY)),
        by_sector: grouped_breakdown(total, affected, company::SECTOR, DisplayOrder::ByTotal),
    }
}

/// Health establishments: count, breakdown by type and the affected units.
#[must_use]
pub fn health_impact(total: &[Record], affected: Option<&[Record]>) -> HealthImpact {
    let mut affected_units: Vec<HealthUnitRow> = affected_records(affected)
        .iter()
        .map(|r| {
            let address = [text(r, health::STREET), text(r, health::NUMBER)]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            HealthUnitRow {
                name: text(r, health::NAME),
                kind: text(r, health::ESTABLISHMENT_TYPE),
                neighborhood: text(r, health::NEIGHBORHOOD),
                address,
            }
        })
        .collect();
    affected_units.sort_by(|a, b| a.name.cmp(&b.name));

    HealthImpact {
        units: counts(total, affected),
        by_type: grouped_breakdown(
            total,
            affected,
            health::ESTABLISHMENT_TYPE,
            DisplayOrder::ByTotal,
        ),
        affected_units,
    }
}

/// Schools: staff, enrollment per level and schools/staff per dependency.
#[must_use]
pub fn education_impact(total: &[Record], affected: Option<&[Record]>) -> EducationImpact {
    let mut affected_schools: Vec<SchoolRow> = affected_records(affected)
        .iter()
        .map(|r| {
            let dependency = match text(r, school::DEPENDENCY_LABEL) {
                label if label.is_empty() => dependency_label(r.cell(school::DEPENDENCY)),
                label => label,
            };
            SchoolRow {
                name: text(r, school::NAME),
                dependency,
                staff: sum_metric([r], &[school::STAFF_TOTAL]),
            }
        })
        .collect();
    affected_schools.sort_by(|a, b| a.name.cmp(&b.name));

    EducationImpact {
        schools: counts(total, affected),
        staff: compare_metric(total, affected, |r| sum_metric(r, &[school::STAFF_TOTAL])),
        enrollment_infant: compare_metric(total, affected, |r| {
            sum_metric(r, school::ENROLLMENT_INFANT)
        }),
        enrollment_elementary: compare_metric(total, affected, |r| {
            sum_metric(r, school::ENROLLMENT_ELEMENTARY)
        }),
        enrollment_high_school: compare_metric(total, affected, |r| {
            sum_metric(r, school::ENROLLMENT_HIGH_SCHOOL)
        }),
        enrollment_technical: compare_metric(total, affected, |r| {
            sum_metric(r, &[school::ENROLLMENT_TECHNICAL])
        }),
        by_dependency: grouped_metric(
            total,
            affected,
            school::DEPENDENCY_LABEL,
            &[school::STAFF_TOTAL],
            DisplayOrder::Canonical(school::DEPENDENCY_ORDER),
        ),
        affected_schools,
    }
}

/// Public buildings and security posts: count, breakdown by type and the
/// affected buildings.
#[must_use]
pub fn building_impact(total: &[Record], affected: Option<&[Record]>) -> BuildingImpact {
    let mut affected_buildings: Vec<BuildingRow> = affected_records(affected)
        .iter()
        .map(|r| BuildingRow {
            name: text(r, building::NAME),
            kind: text(r, building::KIND),
            address: text(r, building::ADDRESS),
        })
        .collect();
    affected_buildings.sort_by(|a, b| a.name.cmp(&b.name));

    BuildingImpact {
        buildings: counts(total, affected),
        by_type: grouped_breakdown(total, affected, building::KIND, DisplayOrder::ByTotal),
        affected_buildings,
    }
}

/// Street segments: segments, distinct streets, drainage and lighting, plus
/// the affected streets with their segment counts.
#[must_use]
pub fn street_impact(total: &[Record], affected: Option<&[Record]>) -> StreetImpact {
    let mut by_street: BTreeMap<String, StreetRow> = BTreeMap::new();
    for r in affected_records(affected) {
        let street_id = text(r, street::STREET_ID);
        by_street
            .entry(street_id.clone())
            .or_insert_with(|| StreetRow {
                street_id,
                kind: text(r, street::KIND),
                name: text(r, street::NAME),
                segments: 0,
            })
            .segments += 1;
    }

    let mut affected_streets: Vec<StreetRow> = by_street.into_values().collect();
    affected_streets.sort_by(|a, b| {
        b.segments
            .cmp(&a.segments)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.name.cmp(&b.name))
    });

    StreetImpact {
        segments: counts(total, affected),
        streets: compare_counts(total, affected, |r| count_unique(r, street::STREET_ID)),
        drainage: compare_counts(total, affected, |r| count_flag(r, street::DRAINAGE)),
        lighting: compare_counts(total, affected, |r| count_flag(r, street::LIGHTING)),
        affected_streets,
    }
}

/// Land parcels: count, service flags and sewage kinds.
#[must_use]
pub fn parcel_impact(total: &[Record], affected: Option<&[Record]>) -> ParcelImpact {
    ParcelImpact {
        parcels: counts(total, affected),
        water: compare_counts(total, affected, |r| count_flag(r, parcel::WATER)),
        garbage_collection: compare_counts(total, affected, |r| count_flag(r, parcel::GARBAGE)),
        storm_sewer: compare_counts(total, affected, |r| count_flag(r, parcel::STORM_SEWER)),
        condominium: compare_counts(total, affected, |r| count_flag(r, parcel::CONDOMINIUM)),
        sewage_network: compare_counts(total, affected, |r| {
            count_equals(r, parcel::SEWAGE, &[parcel::SEWAGE_NETWORK])
        }),
        sewage_septic: compare_counts(total, affected, |r| {
            count_equals(r, parcel::SEWAGE, &[parcel::SEWAGE_SEPTIC])
        }),
    }
}

/// Blocks: count only.
#[must_use]
pub fn block_impact(total: &[Record], affected: Option<&[Record]>) -> BlockImpact {
    BlockImpact {
        blocks: counts(total, affected),
    }
}

/// Real-estate units: count, condominium units and breakdowns by use and
/// ownership.
#[must_use]
pub fn real_estate_impact(total: &[Record], affected: Option<&[Record]>) -> RealEstateImpact {
    RealEstateImpact {
        units: counts(total, affected),
        condominium: compare_counts(total, affected, |r| {
            count_flag(r, real_estate::CONDOMINIUM)
        }),
        by_use: grouped_breakdown(total, affected, real_estate::USE, DisplayOrder::ByTotal),
        by_ownership: grouped_breakdown(
            total,
            affected,
            real_estate::OWNERSHIP,
            DisplayOrder::ByTotal,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: usize, sector: &str, employees: f64, payroll: f64, salary: f64) -> Record {
        Record::new(id, None)
            .with_cell(company::SECTOR, sector)
            .with_cell(company::EMPLOYEES, employees)
            .with_cell(company::PAYROLL, payroll)
            .with_cell(company::MEAN_SALARY, salary)
    }

    #[test]
    fn company_totals_and_affected() {
        let total = vec![
            company(0, "Comércio", 10.0, 20_000.0, 2000.0),
            company(1, "Indústria", 30.0, 90_000.0, 3000.0),
            company(2, "Comércio", 5.0, 5_000.0, 1000.0),
        ];
        let affected = vec![total[1].clone()];
        let impact = company_impact(&total, Some(&affected));

        assert_eq!(impact.companies.total, 3);
        assert_eq!(impact.companies.affected, 1);
        assert!((impact.employees.total - 45.0).abs() < f64::EPSILON);
        assert!((impact.employees.affected - 30.0).abs() < f64::EPSILON);
        assert!((impact.payroll.affected - 90_000.0).abs() < f64::EPSILON);
        assert!((impact.mean_salary.total - 2000.0).abs() < f64::EPSILON);
        assert_eq!(impact.by_sector.rows[0].label, "Comércio");
    }

    #[test]
    fn no_hazard_means_zero_affected() {
        let total = vec![company(0, "Comércio", 10.0, 1.0, 1.0)];
        let impact = company_impact(&total, None);
        assert_eq!(impact.companies.affected, 0);
        assert!(impact.companies.percentage.abs() < f64::EPSILON);
        assert!(impact.employees.percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn four_of_six_health_units() {
        let total: Vec<Record> = (0..6)
            .map(|i| {
                Record::new(i, None)
                    .with_cell(health::NAME, format!("Unidade {i}").as_str())
                    .with_cell(health::ESTABLISHMENT_TYPE, 2.0)
                    .with_cell(health::STREET, "Rua A")
                    .with_cell(health::NUMBER, 10.0)
            })
            .collect();
        let affected: Vec<Record> = total[..4].to_vec();
        let impact = health_impact(&total, Some(&affected));

        assert_eq!(impact.units.affected, 4);
        assert!((impact.units.percentage - 66.666_666_666_666_67).abs() < 1e-9);
        assert_eq!(impact.affected_units.len(), 4);
        assert_eq!(impact.affected_units[0].address, "Rua A, 10");
        assert_eq!(impact.by_type.row("2").unwrap().affected, 4);
    }

    #[test]
    fn education_enrollment_and_dependency() {
        let total = vec![
            Record::new(0, None)
                .with_cell(school::NAME, "EMEF Alfa")
                .with_cell(school::DEPENDENCY_LABEL, "Municipal")
                .with_cell(school::STAFF_TOTAL, 8.0)
                .with_cell("QT_MAT_INF", 20.0)
                .with_cell("QT_MAT_FUND", 88_888.0)
                .with_cell(school::ENROLLMENT_TECHNICAL, 4.0),
            Record::new(1, None)
                .with_cell(school::NAME, "IF Beta")
                .with_cell(school::DEPENDENCY, 1.0)
                .with_cell(school::DEPENDENCY_LABEL, "Federal")
                .with_cell(school::STAFF_TOTAL, 12.0)
                .with_cell("QT_MAT_MED", 100.0),
        ];
        let affected = vec![total[0].clone()];
        let impact = education_impact(&total, Some(&affected));

        assert!((impact.staff.total - 20.0).abs() < f64::EPSILON);
        assert!((impact.staff.affected - 8.0).abs() < f64::EPSILON);
        assert!((impact.enrollment_infant.affected - 20.0).abs() < f64::EPSILON);
        assert!(impact.enrollment_elementary.total.abs() < f64::EPSILON);
        assert!((impact.enrollment_high_school.total - 100.0).abs() < f64::EPSILON);
        assert!((impact.enrollment_technical.total - 4.0).abs() < f64::EPSILON);
        assert_eq!(impact.by_dependency[0].label, "Federal");
        assert_eq!(impact.by_dependency[1].label, "Municipal");
        assert_eq!(impact.affected_schools[0].dependency, "Municipal");
    }

    #[test]
    fn affected_streets_are_grouped_and_sorted() {
        let segment = |id: usize, kind: &str, name: &str| {
            Record::new(id, None)
                .with_cell(street::KIND, kind)
                .with_cell(street::NAME, name)
                .with_cell(street::STREET_ID, format!("{kind} {name}").as_str())
                .with_cell(street::DRAINAGE, "sim")
        };
        let total = vec![
            segment(0, "Rua", "B"),
            segment(1, "Avenida", "A"),
            segment(2, "Avenida", "A"),
            segment(3, "Rua", "A"),
            segment(4, "Rua", "C"),
        ];
        let affected = total[..4].to_vec();
        let impact = street_impact(&total, Some(&affected));

        assert_eq!(impact.segments.affected, 4);
        assert_eq!(impact.streets.total, 4);
        assert_eq!(impact.streets.affected, 3);
        assert_eq!(impact.drainage.affected, 4);
        let order: Vec<&str> = impact
            .affected_streets
            .iter()
            .map(|s| s.street_id.as_str())
            .collect();
        assert_eq!(order, vec!["Avenida A", "Rua A", "Rua B"]);
        assert_eq!(impact.affected_streets[0].segments, 2);
    }

    #[test]
    fn parcel_services() {
        let total = vec![
            Record::new(0, None)
                .with_cell(parcel::WATER, 1.0)
                .with_cell(parcel::SEWAGE, parcel::SEWAGE_NETWORK),
            Record::new(1, None)
                .with_cell(parcel::WATER, 0.0)
                .with_cell(parcel::SEWAGE, parcel::SEWAGE_SEPTIC),
            Record::new(2, None).with_cell(parcel::WATER, 1.0),
        ];
        let impact = parcel_impact(&total, Some(&total[..1]));

        assert_eq!(impact.water.total, 2);
        assert_eq!(impact.water.affected, 1);
        assert_eq!(impact.sewage_network.affected, 1);
        assert_eq!(impact.sewage_septic.total, 1);
        assert_eq!(impact.sewage_septic.affected, 0);
    }

    #[test]
    fn real_estate_condominium_and_use() {
        let total = vec![
            Record::new(0, None)
                .with_cell(real_estate::CONDOMINIUM, 1.0)
                .with_cell(real_estate::USE, "Residencial"),
            Record::new(1, None)
                .with_cell(real_estate::CONDOMINIUM, 0.0)
                .with_cell(real_estate::USE, "residencial"),
            Record::new(2, None).with_cell(real_estate::USE, "Comercial"),
        ];
        let impact = real_estate_impact(&total, None);
        assert_eq!(impact.condominium.total, 1);
        assert_eq!(impact.by_use.row("Residencial").unwrap().total, 2);
        assert_eq!(block_impact(&total, None).blocks.total, 3);
    }
}
