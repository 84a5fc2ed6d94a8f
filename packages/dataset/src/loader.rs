//! Loading a whole dataset from a data directory.

use std::collections::BTreeMap;
use std::path::Path;

use flood_map_dataset_models::schema::real_estate;
use flood_map_dataset_models::{LayerKind, Record};
use flood_map_spatial::{Crs, HazardPolygon, union_polygon};
use geo::CoordsIter as _;

use crate::derive::{derive_school_fields, derive_street_ids};
use crate::manifest::{DatasetManifest, LayerSource};
use crate::progress::ProgressCallback;
use crate::table::{PointTableSpec, load_point_table};
use crate::vector::{RawLayer, read_geojson_file};
use crate::DatasetError;

/// Loaded layers, every geometry in the canonical reference system.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    layers: BTreeMap<LayerKind, Vec<Record>>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layers: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a layer.
    pub fn insert(&mut self, kind: LayerKind, records: Vec<Record>) {
        self.layers.insert(kind, records);
    }

    /// Records of a layer, `None` if it was not loaded.
    #[must_use]
    pub fn layer(&self, kind: LayerKind) -> Option<&[Record]> {
        self.layers.get(&kind).map(Vec::as_slice)
    }

    /// Loaded layers, in report order.
    pub fn kinds(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.layers.keys().copied()
    }

    /// Number of loaded layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Loads one layer file and applies the layer's derivations.
///
/// Point layers are read as CSV tables, every other layer as `GeoJSON`.
///
/// # Errors
///
/// Returns [`DatasetError::Format`] if the file extension does not match
/// the layer's format, or another [`DatasetError`] if the file cannot be
/// read or lacks required columns.
pub fn load_layer(
    kind: LayerKind,
    path: &Path,
    source: &LayerSource,
) -> Result<Vec<Record>, DatasetError> {
    let crs_override = source.crs()?;
    check_extension(kind, path)?;

    let mut records = if let Some(spec) = PointTableSpec::for_layer(kind) {
        if crs_override.is_some() {
            log::warn!("{kind}: point tables are always WGS 84; ignoring crs override");
        }
        load_point_table(path, &spec)?
    } else {
        let raw = read_geojson_file(path)?;
        let crs = match crs_override {
            Some(crs) => Some(crs),
            None if kind == LayerKind::RealEstate => cadastre_crs(&raw),
            None => raw.declared_crs,
        };
        raw.into_canonical(crs)
    };

    match kind {
        LayerKind::Schools => derive_school_fields(&mut records),
        LayerKind::Streets => derive_street_ids(&mut records),
        _ => {}
    }

    Ok(records)
}

fn check_extension(kind: LayerKind, path: &Path) -> Result<(), DatasetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let accepted: &[&str] = if kind.is_point_table() {
        &["csv"]
    } else {
        &["geojson", "json"]
    };

    if accepted.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(DatasetError::Format {
            message: format!(
                "{kind}: unsupported file {} (expected {})",
                path.display(),
                accepted.join(" or ")
            ),
        })
    }
}

/// The cadastre export is stored in SIRGAS 2000 / UTM 22S but often ships
/// with no reference system, or mislabeled as WGS 84. An undeclared file is
/// always read as UTM 22S; a WGS 84 label is only overruled when the
/// coordinates are projected.
fn cadastre_crs(raw: &RawLayer) -> Option<Crs> {
    match raw.declared_crs {
        None => {
            log::info!(
                "Real-estate layer declares no reference system; assuming EPSG:{}",
                real_estate::DEFAULT_EPSG
            );
            Crs::from_epsg(real_estate::DEFAULT_EPSG).ok()
        }
        Some(Crs::Wgs84) if !has_geographic_coordinates(raw) => {
            log::info!(
                "Real-estate layer labeled EPSG:4326 holds projected coordinates; assuming EPSG:{}",
                real_estate::DEFAULT_EPSG
            );
            Crs::from_epsg(real_estate::DEFAULT_EPSG).ok()
        }
        declared => declared,
    }
}

fn has_geographic_coordinates(raw: &RawLayer) -> bool {
    raw.geometries()
        .flatten()
        .flat_map(|g| g.coords_iter())
        .all(|c| c.x.abs() <= 180.0 && c.y.abs() <= 90.0)
}

/// Loads every layer the manifest lists.
///
/// A missing file leaves its layer absent with a warning; so does a file
/// that fails to load. Loading never aborts as a whole.
pub fn load_dataset(
    manifest: &DatasetManifest,
    data_dir: &Path,
    progress: &dyn ProgressCallback,
) -> Dataset {
    let mut dataset = Dataset::new();
    progress.set_total(u64::try_from(manifest.layers.len()).unwrap_or(u64::MAX));

    for (kind, source) in &manifest.layers {
        progress.set_message(format!("Carregando {}", kind.label()));
        let path = data_dir.join(&source.file);

        if !path.exists() {
            log::warn!("{kind}: {} not found; layer skipped", path.display());
        } else {
            match load_layer(*kind, &path, source) {
                Ok(records) => {
                    log::info!("{kind}: loaded {} records", records.len());
                    dataset.insert(*kind, records);
                }
                Err(e) => log::warn!("{kind}: failed to load {}: {e}", path.display()),
            }
        }

        progress.inc(1);
    }

    progress.finish(format!(
        "{} of {} layers loaded",
        dataset.len(),
        manifest.layers.len()
    ));
    dataset
}

/// Loads a hazard scenario file and unions it into one region.
///
/// `Ok(None)` means the file held no usable polygon.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn load_hazard(
    path: &Path,
    crs_override: Option<Crs>,
) -> Result<Option<HazardPolygon>, DatasetError> {
    let raw = read_geojson_file(path)?;
    let crs = crs_override.or(raw.declared_crs);
    Ok(union_polygon(raw.geometries(), crs))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::progress::NullProgress;
    use flood_map_dataset_models::schema::{school, street};
    use geo::{BoundingRect as _, Geometry, Point};

    struct CountingProgress {
        done: AtomicU64,
        total: AtomicU64,
    }

    impl ProgressCallback for CountingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
        fn inc(&self, delta: u64) {
            self.done.fetch_add(delta, Ordering::SeqCst);
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "flood_map_dataset_{}_{name}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const STREETS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "tipo": "Rua", "nome": "Aquidaban" },
              "geometry": { "type": "LineString", "coordinates": [[-52.10, -32.03], [-52.09, -32.03]] } }
        ]
    }"#;

    const SCHOOLS: &str = "NO_ENTIDADE;TP_DEPENDENCIA;Latitude;Longitude;QT_PROF_GESTAO\n\
                           EMEF Centro;3;-32,03;-52,10;2\n";

    #[test]
    fn loads_configured_layers_and_skips_missing_ones() {
        let dir = scratch_dir("load");
        std::fs::write(dir.join("ruas.geojson"), STREETS).unwrap();
        std::fs::write(dir.join("escolas.csv"), SCHOOLS).unwrap();

        let manifest = DatasetManifest::parse(
            r#"
            [layers.streets]
            file = "ruas.geojson"
            [layers.schools]
            file = "escolas.csv"
            [layers.blocks]
            file = "quadras.geojson"
            "#,
        )
        .unwrap();

        let progress = CountingProgress {
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
        };
        let dataset = load_dataset(&manifest, &dir, &progress);

        assert_eq!(dataset.len(), 2);
        assert!(dataset.layer(LayerKind::Blocks).is_none());
        assert_eq!(progress.total.load(Ordering::SeqCst), 3);
        assert_eq!(progress.done.load(Ordering::SeqCst), 3);

        let streets = dataset.layer(LayerKind::Streets).unwrap();
        assert_eq!(
            streets[0].text(street::STREET_ID).as_deref(),
            Some("Rua Aquidaban")
        );

        let schools = dataset.layer(LayerKind::Schools).unwrap();
        assert_eq!(
            schools[0].text(school::DEPENDENCY_LABEL).as_deref(),
            Some("Municipal")
        );
        assert_eq!(schools[0].number(school::STAFF_TOTAL), Some(2.0));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn malformed_layers_are_left_out() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("escolas.csv"), "Nome;Latitude\nX;-32\n").unwrap();

        let mut manifest = DatasetManifest::default();
        manifest
            .layers
            .insert(LayerKind::Schools, LayerSource::new("escolas.csv"));

        let dataset = load_dataset(&manifest, &dir, &NullProgress);
        assert!(dataset.is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn undeclared_projected_cadastre_is_read_as_utm() {
        let dir = scratch_dir("cadastre");
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "Uso": "Residencial" },
                  "geometry": { "type": "Polygon", "coordinates": [[
                      [395000, 6450000], [395020, 6450000], [395020, 6450020], [395000, 6450000]
                  ]] } }
            ]
        }"#;
        let path = dir.join("imob.geojson");
        std::fs::write(&path, doc).unwrap();

        let records =
            load_layer(LayerKind::RealEstate, &path, &LayerSource::new("imob.geojson")).unwrap();
        let rect = records[0].geometry().unwrap().bounding_rect().unwrap();
        assert!(rect.min().x > -53.0 && rect.max().x < -51.0);

        std::fs::remove_dir_all(dir).ok();
    }

    fn cadastre_layer(declared_crs: Option<Crs>, x: f64, y: f64) -> RawLayer {
        RawLayer {
            declared_crs,
            records: vec![Record::new(0, Some(Geometry::Point(Point::new(x, y))))],
        }
    }

    #[test]
    fn undeclared_cadastre_defaults_to_utm() {
        let utm = Some(Crs::SirgasUtmSouth(22));

        assert_eq!(cadastre_crs(&cadastre_layer(None, -52.1, -32.05)), utm);
        assert_eq!(cadastre_crs(&cadastre_layer(None, 395_000.0, 6_450_000.0)), utm);
        assert_eq!(
            cadastre_crs(&cadastre_layer(Some(Crs::Wgs84), 395_000.0, 6_450_000.0)),
            utm
        );
        assert_eq!(
            cadastre_crs(&cadastre_layer(Some(Crs::Wgs84), -52.1, -32.05)),
            Some(Crs::Wgs84)
        );
        assert_eq!(
            cadastre_crs(&cadastre_layer(Some(Crs::WebMercator), 1.0, 1.0)),
            Some(Crs::WebMercator)
        );
    }

    #[test]
    fn mismatched_extensions_are_rejected() {
        let source = LayerSource::new("quadras.csv");
        assert!(matches!(
            load_layer(LayerKind::Blocks, Path::new("quadras.csv"), &source),
            Err(DatasetError::Format { .. })
        ));
    }

    #[test]
    fn loads_and_unions_a_hazard() {
        let dir = scratch_dir("hazard");
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[1,1],[3,1],[3,3],[1,3],[1,1]]] } },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        }"#;
        let path = dir.join("cenario.geojson");
        std::fs::write(&path, doc).unwrap();

        let hazard = load_hazard(&path, None).unwrap().unwrap();
        assert!((hazard.area() - 7.0).abs() < 1e-9);
        assert_eq!(hazard.part_count(), 1);

        std::fs::write(&path, r#"{ "type": "FeatureCollection", "features": [] }"#).unwrap();
        assert!(load_hazard(&path, None).unwrap().is_none());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn point_geometries_survive_loading() {
        let spec = PointTableSpec::for_layer(LayerKind::Schools).unwrap();
        let records = crate::table::read_point_table(SCHOOLS.as_bytes(), &spec).unwrap();
        assert!(matches!(records[0].geometry(), Some(Geometry::Point(_))));
    }
}
