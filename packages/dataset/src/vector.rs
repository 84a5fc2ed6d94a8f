//! `GeoJSON` vector layers.
//!
//! Street segments, parcels, blocks, the real-estate cadastre and every
//! hazard scenario are exported as `FeatureCollection`s. A collection may
//! carry a legacy `crs` member naming its reference system; feature
//! properties become record cells.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr as _;

use flood_map_dataset_models::{CellValue, Record};
use flood_map_spatial::{Crs, to_canonical};
use geojson::{Feature, GeoJson, JsonObject};

use crate::DatasetError;

/// Features of a vector file, in the reference system they were stored in.
#[derive(Debug, Clone, Default)]
pub struct RawLayer {
    /// Reference system named by the file's `crs` member, if any.
    pub declared_crs: Option<Crs>,
    /// One record per feature, geometry not yet reprojected.
    pub records: Vec<Record>,
}

impl RawLayer {
    /// Feature geometries, `None` for null ones.
    pub fn geometries(&self) -> impl Iterator<Item = Option<&geo::Geometry<f64>>> {
        self.records.iter().map(Record::geometry)
    }

    /// Reprojects every record into the canonical reference system.
    ///
    /// `crs` is the reference system the coordinates are in; `None` means
    /// already canonical. Records whose geometry cannot be converted are
    /// dropped.
    #[must_use]
    pub fn into_canonical(self, crs: Option<Crs>) -> Vec<Record> {
        let total = self.records.len();
        let mut dropped = 0usize;

        let records: Vec<Record> = self
            .records
            .into_iter()
            .filter_map(|mut record| {
                if let Some(geometry) = record.geometry.take() {
                    match to_canonical(&geometry, crs) {
                        Ok(g) => record.geometry = Some(g),
                        Err(e) => {
                            log::warn!("Dropping feature {}: {e}", record.id);
                            dropped += 1;
                            return None;
                        }
                    }
                }
                Some(record)
            })
            .collect();

        if dropped > 0 {
            log::warn!("Dropped {dropped} of {total} features that could not be reprojected");
        }

        records
    }
}

/// Parses a `GeoJSON` document into raw features.
///
/// A bare `Feature` or `Geometry` document yields a single record.
///
/// # Errors
///
/// Returns [`DatasetError::Json`] if the document is not valid `GeoJSON`, or
/// [`DatasetError::Crs`] if it declares an unsupported reference system.
pub fn read_geojson_layer(reader: impl Read) -> Result<RawLayer, DatasetError> {
    let geojson = GeoJson::from_reader(reader)?;

    let layer = match geojson {
        GeoJson::FeatureCollection(collection) => RawLayer {
            declared_crs: declared_crs(collection.foreign_members.as_ref())?,
            records: collection
                .features
                .into_iter()
                .enumerate()
                .map(|(i, f)| feature_record(i, f))
                .collect(),
        },
        GeoJson::Feature(feature) => RawLayer {
            declared_crs: declared_crs(feature.foreign_members.as_ref())?,
            records: vec![feature_record(0, feature)],
        },
        GeoJson::Geometry(geometry) => RawLayer {
            declared_crs: None,
            records: vec![Record::new(0, convert_geometry(0, geometry))],
        },
    };

    let missing = layer.records.iter().filter(|r| r.geometry.is_none()).count();
    log::debug!(
        "Read {} features ({missing} without geometry), declared CRS {}",
        layer.records.len(),
        layer
            .declared_crs
            .map_or_else(|| "none".to_string(), |c| c.to_string())
    );

    Ok(layer)
}

/// Loads a `GeoJSON` file and reprojects it into the canonical system.
///
/// `crs_override` replaces whatever the file declares.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn load_geojson_layer(
    path: &Path,
    crs_override: Option<Crs>,
) -> Result<Vec<Record>, DatasetError> {
    let raw = read_geojson_file(path)?;
    let crs = crs_override.or(raw.declared_crs);
    Ok(raw.into_canonical(crs))
}

/// Reads a `GeoJSON` file without reprojecting it.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn read_geojson_file(path: &Path) -> Result<RawLayer, DatasetError> {
    let file = File::open(path)?;
    log::info!("Reading {}", path.display());
    read_geojson_layer(BufReader::new(file))
}

fn feature_record(index: usize, feature: Feature) -> Record {
    let mut record = Record::new(
        index,
        feature.geometry.and_then(|g| convert_geometry(index, g)),
    );

    for (key, value) in feature.properties.unwrap_or_default() {
        let cell = CellValue::from_json(&value);
        record.cells.insert(key.trim().to_string(), cell);
    }

    record
}

fn convert_geometry(index: usize, geometry: geojson::Geometry) -> Option<geo::Geometry<f64>> {
    match geo::Geometry::<f64>::try_from(geometry.value) {
        Ok(g) => Some(g),
        Err(e) => {
            log::warn!("Feature {index} has an unreadable geometry: {e}");
            None
        }
    }
}

/// Reads the legacy `"crs": {"type": "name", "properties": {"name": ...}}`
/// member.
fn declared_crs(members: Option<&JsonObject>) -> Result<Option<Crs>, DatasetError> {
    let name = members
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(serde_json::Value::as_str);

    match name {
        Some(name) => Ok(Some(Crs::from_str(name)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BoundingRect as _, Geometry};

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::31982" } },
        "features": [
            {
                "type": "Feature",
                "properties": { "tipo": "Rua", "nome": " Marechal Floriano", "drenagem": 1 },
                "geometry": { "type": "LineString", "coordinates": [[395000.0, 6450000.0], [395100.0, 6450000.0]] }
            },
            {
                "type": "Feature",
                "properties": { "tipo": "Avenida", "nome": null },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn reads_features_and_declared_crs() {
        let raw = read_geojson_layer(COLLECTION.as_bytes()).unwrap();

        assert_eq!(raw.declared_crs, Some(Crs::SirgasUtmSouth(22)));
        assert_eq!(raw.records.len(), 2);
        assert_eq!(raw.records[0].text("tipo").as_deref(), Some("Rua"));
        assert_eq!(raw.records[0].number("drenagem"), Some(1.0));
        assert!(raw.records[1].cell("nome").is_missing());
        assert!(raw.records[1].geometry.is_none());
        assert_eq!(raw.geometries().filter(Option::is_some).count(), 1);
    }

    #[test]
    fn reprojects_into_lon_lat() {
        let raw = read_geojson_layer(COLLECTION.as_bytes()).unwrap();
        let crs = raw.declared_crs;
        let records = raw.into_canonical(crs);

        assert_eq!(records.len(), 2);
        let rect = records[0].geometry().unwrap().bounding_rect().unwrap();
        assert!(rect.min().x > -53.0 && rect.max().x < -51.0);
        assert!(rect.min().y > -33.0 && rect.max().y < -31.0);
    }

    #[test]
    fn undeclared_collections_are_canonical() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Point", "coordinates": [-52.1, -32.0] } }
            ]
        }"#;
        let raw = read_geojson_layer(doc.as_bytes()).unwrap();
        assert!(raw.declared_crs.is_none());

        let records = raw.into_canonical(None);
        let Some(Geometry::Point(p)) = records[0].geometry() else {
            panic!("expected a point");
        };
        assert!((p.x() + 52.1).abs() < 1e-12);
    }

    #[test]
    fn bare_geometry_documents_are_accepted() {
        let doc = r#"{ "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }"#;
        let raw = read_geojson_layer(doc.as_bytes()).unwrap();
        assert_eq!(raw.records.len(), 1);
        assert!(raw.records[0].geometry.is_some());
    }

    #[test]
    fn unsupported_crs_is_an_error() {
        let doc = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "EPSG:2193" } },
            "features": []
        }"#;
        assert!(matches!(
            read_geojson_layer(doc.as_bytes()),
            Err(DatasetError::Crs(_))
        ));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            read_geojson_layer("{ not json".as_bytes()),
            Err(DatasetError::Json(_))
        ));
    }
}
