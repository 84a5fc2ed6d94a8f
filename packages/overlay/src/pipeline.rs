//! The overlay pipeline.

use std::path::{Path, PathBuf};

use flood_map_analytics::impact::{
    block_impact, building_impact, company_impact, education_impact, health_impact,
    parcel_impact, real_estate_impact, street_impact,
};
use flood_map_analytics_models::ImpactReport;
use flood_map_dataset::{Dataset, DatasetManifest, LayerSource, load_hazard};
use flood_map_dataset_models::LayerKind;
use flood_map_scenario::ScenarioDefinition;
use flood_map_spatial::{AffectedSet, HazardPolygon, classify_affected};

use crate::OverlayError;
use crate::filter::LayerFilters;

/// Filters, classifies and aggregates every loaded layer.
///
/// With no hazard, every layer reports totals and zero affected. Layers
/// absent from `dataset` stay `None` in the report.
#[must_use]
pub fn compute_overlay(
    dataset: &Dataset,
    hazard: Option<&HazardPolygon>,
    filters: &LayerFilters,
) -> ImpactReport {
    let mut report = ImpactReport {
        hazard_active: hazard.is_some(),
        hazard_area: hazard.map(HazardPolygon::area),
        ..ImpactReport::default()
    };

    for kind in dataset.kinds() {
        let Some(layer) = dataset.layer(kind) else {
            continue;
        };

        let total = filters.apply(kind, layer);
        let affected = classify_affected(&total, hazard, kind.classify_mode());
        let affected_records = affected.as_ref().map(AffectedSet::records);

        if let Some(set) = &affected {
            log::info!(
                "{kind}: {} of {} affected ({:?})",
                set.len(),
                total.len(),
                set.predicate
            );
        }

        match kind {
            LayerKind::Companies => {
                report.companies = Some(company_impact(&total, affected_records));
            }
            LayerKind::HealthUnits => {
                report.health = Some(health_impact(&total, affected_records));
            }
            LayerKind::Schools => {
                report.education = Some(education_impact(&total, affected_records));
            }
            LayerKind::PublicBuildings => {
                report.public_buildings = Some(building_impact(&total, affected_records));
            }
            LayerKind::SecurityPosts => {
                report.security = Some(building_impact(&total, affected_records));
            }
            LayerKind::Streets => {
                report.streets = Some(street_impact(&total, affected_records));
            }
            LayerKind::Parcels => {
                report.parcels = Some(parcel_impact(&total, affected_records));
            }
            LayerKind::Blocks => {
                report.blocks = Some(block_impact(&total, affected_records));
            }
            LayerKind::RealEstate => {
                report.real_estate = Some(real_estate_impact(&total, affected_records));
            }
        }
    }

    report
}

fn scenario_source<'a>(
    manifest: &'a DatasetManifest,
    scenario: &ScenarioDefinition,
) -> Option<&'a LayerSource> {
    manifest.scenarios.get(&scenario.id)
}

/// Where a scenario's polygon file is read from: the manifest's override
/// if it has one, the registry's file name otherwise.
#[must_use]
pub fn scenario_path(
    manifest: &DatasetManifest,
    data_dir: &Path,
    scenario: &ScenarioDefinition,
) -> PathBuf {
    scenario_source(manifest, scenario)
        .map_or_else(|| scenario.path_in(data_dir), |s| data_dir.join(&s.file))
}

/// Loads and unions a scenario's hazard polygon.
///
/// An absent file is `Ok(None)` for optional scenarios. A file without any
/// usable polygon is also `Ok(None)`, logged as a warning.
///
/// # Errors
///
/// Returns [`OverlayError::MissingScenarioFile`] if a required scenario
/// file is absent, or [`OverlayError::Dataset`] if it cannot be read.
pub fn load_scenario_hazard(
    manifest: &DatasetManifest,
    data_dir: &Path,
    scenario: &ScenarioDefinition,
) -> Result<Option<HazardPolygon>, OverlayError> {
    let path = scenario_path(manifest, data_dir, scenario);

    if !path.exists() {
        if scenario.optional {
            log::warn!(
                "Scenario '{}' not found at {}; continuing without a hazard",
                scenario.name,
                path.display()
            );
            return Ok(None);
        }
        return Err(OverlayError::MissingScenarioFile {
            id: scenario.id.clone(),
            path,
        });
    }

    let crs = scenario_source(manifest, scenario)
        .map(LayerSource::crs)
        .transpose()?
        .flatten();

    let hazard = load_hazard(&path, crs)?;
    match &hazard {
        Some(h) => log::info!(
            "Scenario '{}': {} hazard part(s)",
            scenario.name,
            h.part_count()
        ),
        None => log::warn!("Scenario '{}' holds no usable polygon", scenario.name),
    }

    Ok(hazard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flood_map_dataset_models::Record;
    use flood_map_dataset_models::schema::{company, school};
    use geo::{Geometry, LineString, MultiPolygon, Point, Rect};

    fn square_hazard() -> HazardPolygon {
        let square = Rect::new((0.0, 0.0), (10.0, 10.0)).to_polygon();
        HazardPolygon::from_region(MultiPolygon::new(vec![square])).unwrap()
    }

    fn point(x: f64, y: f64) -> Option<Geometry<f64>> {
        Some(Geometry::Point(Point::new(x, y)))
    }

    fn company(id: usize, x: f64, status: &str, employees: f64) -> Record {
        Record::new(id, point(x, 5.0))
            .with_cell(company::SECTOR, "Comércio")
            .with_cell(company::STATUS, status)
            .with_cell(company::EMPLOYEES, employees)
    }

    fn dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(
            LayerKind::Companies,
            vec![
                company(0, 1.0, "Ativa", 10.0),
                company(1, 2.0, "Ativa", 5.0),
                company(2, 3.0, "Baixada", 100.0),
                company(3, 20.0, "Ativa", 7.0),
            ],
        );
        dataset.insert(
            LayerKind::Schools,
            vec![
                Record::new(0, point(5.0, 5.0))
                    .with_cell(school::NAME, "EMEF Centro")
                    .with_cell(school::DEPENDENCY_LABEL, "Municipal"),
                Record::new(1, point(50.0, 50.0))
                    .with_cell(school::NAME, "EE Cassino")
                    .with_cell(school::DEPENDENCY_LABEL, "Estadual"),
            ],
        );
        dataset.insert(
            LayerKind::Streets,
            vec![
                Record::new(
                    0,
                    Some(Geometry::LineString(LineString::from(vec![
                        (-5.0, 5.0),
                        (5.0, 5.0),
                    ]))),
                ),
                Record::new(
                    1,
                    Some(Geometry::LineString(LineString::from(vec![
                        (20.0, 20.0),
                        (30.0, 30.0),
                    ]))),
                ),
            ],
        );
        dataset
    }

    #[test]
    fn report_covers_loaded_layers_only() {
        let hazard = square_hazard();
        let report = compute_overlay(&dataset(), Some(&hazard), &LayerFilters::default());

        assert!(report.hazard_active);
        assert!((report.hazard_area.unwrap() - 100.0).abs() < 1e-9);
        assert!(report.companies.is_some());
        assert!(report.education.is_some());
        assert!(report.streets.is_some());
        assert!(report.health.is_none());
        assert!(report.real_estate.is_none());
    }

    #[test]
    fn filters_apply_before_classification() {
        let hazard = square_hazard();
        let report = compute_overlay(&dataset(), Some(&hazard), &LayerFilters::default());
        let companies = report.companies.unwrap();

        assert_eq!(companies.companies.total, 3);
        assert_eq!(companies.companies.affected, 2);
        assert!((companies.employees.total - 22.0).abs() < f64::EPSILON);
        assert!((companies.employees.affected - 15.0).abs() < f64::EPSILON);

        let unfiltered = compute_overlay(&dataset(), Some(&hazard), &LayerFilters::unfiltered());
        assert_eq!(unfiltered.companies.unwrap().companies.affected, 3);
    }

    #[test]
    fn lines_and_schools_are_classified() {
        let hazard = square_hazard();
        let report = compute_overlay(&dataset(), Some(&hazard), &LayerFilters::default());

        let streets = report.streets.unwrap();
        assert_eq!(streets.segments.total, 2);
        assert_eq!(streets.segments.affected, 1);

        let education = report.education.unwrap();
        assert_eq!(education.schools.affected, 1);
        assert_eq!(education.affected_schools[0].name, "EMEF Centro");
    }

    #[test]
    fn no_hazard_reports_totals_only() {
        let report = compute_overlay(&dataset(), None, &LayerFilters::default());

        assert!(!report.hazard_active);
        assert!(report.hazard_area.is_none());
        let companies = report.companies.unwrap();
        assert_eq!(companies.companies.total, 3);
        assert_eq!(companies.companies.affected, 0);
        assert!(companies.companies.percentage.abs() < f64::EPSILON);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "flood_map_pipeline_{}_{name}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn scenario(optional: bool) -> ScenarioDefinition {
        ScenarioDefinition {
            id: "may_2024".to_string(),
            name: "Maio de 2024".to_string(),
            file: "CEN_MAI2024.geojson".to_string(),
            optional,
        }
    }

    #[test]
    fn missing_scenarios_depend_on_optionality() {
        let dir = scratch_dir("missing");
        let manifest = DatasetManifest::default();

        assert!(matches!(
            load_scenario_hazard(&manifest, &dir, &scenario(false)),
            Err(OverlayError::MissingScenarioFile { .. })
        ));
        assert!(
            load_scenario_hazard(&manifest, &dir, &scenario(true))
                .unwrap()
                .is_none()
        );

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn manifest_overrides_scenario_file() {
        let dir = scratch_dir("override");
        std::fs::write(
            dir.join("maio.geojson"),
            r#"{ "type": "FeatureCollection", "features": [
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[4,0],[4,4],[0,4],[0,0]]] } }
            ] }"#,
        )
        .unwrap();

        let mut manifest = DatasetManifest::default();
        manifest
            .scenarios
            .insert("may_2024".to_string(), LayerSource::new("maio.geojson"));

        assert_eq!(
            scenario_path(&manifest, &dir, &scenario(false)),
            dir.join("maio.geojson")
        );
        let hazard = load_scenario_hazard(&manifest, &dir, &scenario(false))
            .unwrap()
            .unwrap();
        assert!((hazard.area() - 16.0).abs() < 1e-9);

        std::fs::remove_dir_all(dir).ok();
    }
}
