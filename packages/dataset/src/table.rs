//! Point tables.
//!
//! Companies, health units, schools, public buildings and security posts are
//! spreadsheets exported to CSV with latitude/longitude columns. Exports
//! from Brazilian spreadsheets often use `;` as the delimiter and `,` as the
//! decimal separator; both are accepted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flood_map_dataset_models::schema::{building, company, health, school};
use flood_map_dataset_models::{CellValue, LayerKind, Record, parse_number};
use geo::{Geometry, Point};

use crate::DatasetError;

/// Column layout of a point table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointTableSpec {
    /// Layer the table feeds.
    pub layer: LayerKind,
    /// Latitude column.
    pub latitude: &'static str,
    /// Longitude column.
    pub longitude: &'static str,
    /// Columns that must be present.
    pub required: &'static [&'static str],
}

impl PointTableSpec {
    /// The layout for `layer`, or `None` for layers delivered as vector
    /// files.
    #[must_use]
    pub const fn for_layer(layer: LayerKind) -> Option<Self> {
        let (latitude, longitude, required) = match layer {
            LayerKind::Companies => (company::LATITUDE, company::LONGITUDE, company::REQUIRED),
            LayerKind::HealthUnits => (health::LATITUDE, health::LONGITUDE, health::REQUIRED),
            LayerKind::Schools => (school::LATITUDE, school::LONGITUDE, school::REQUIRED),
            LayerKind::PublicBuildings | LayerKind::SecurityPosts => {
                (building::LATITUDE, building::LONGITUDE, building::REQUIRED)
            }
            LayerKind::Streets | LayerKind::Parcels | LayerKind::Blocks | LayerKind::RealEstate => {
                return None;
            }
        };

        Some(Self {
            layer,
            latitude,
            longitude,
            required,
        })
    }
}

/// Parses a point table.
///
/// Header names are trimmed. Rows without a usable coordinate pair are
/// dropped.
///
/// # Errors
///
/// Returns [`DatasetError::MissingColumns`] if a required column is absent,
/// or [`DatasetError::Csv`] if the table cannot be parsed.
pub fn read_point_table(
    mut reader: impl Read,
    spec: &PointTableSpec,
) -> Result<Vec<Record>, DatasetError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(bytes))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let missing: Vec<String> = spec
        .required
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns {
            layer: spec.layer.to_string(),
            columns: missing,
        });
    }

    let lat_idx = column_index(&headers, spec.latitude, spec.layer)?;
    let lon_idx = column_index(&headers, spec.longitude, spec.layer)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (row, result) in csv_reader.records().enumerate() {
        let row_data = result?;

        let coords = parse_lat_lng(row_data.get(lat_idx), row_data.get(lon_idx));
        let Some((latitude, longitude)) = coords else {
            dropped += 1;
            continue;
        };

        let mut record = Record::new(
            row,
            Some(Geometry::Point(Point::new(longitude, latitude))),
        );
        for (header, value) in headers.iter().zip(row_data.iter()) {
            record
                .cells
                .insert(header.clone(), CellValue::parse(value));
        }
        records.push(record);
    }

    log::info!(
        "{}: {} rows with coordinates, {dropped} dropped",
        spec.layer,
        records.len()
    );

    Ok(records)
}

/// Loads a point table from disk.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn load_point_table(path: &Path, spec: &PointTableSpec) -> Result<Vec<Record>, DatasetError> {
    let file = File::open(path)?;
    log::info!("Reading {}", path.display());
    read_point_table(BufReader::new(file), spec)
}

/// Parses a latitude/longitude pair. Returns `None` if either is missing,
/// zero, or out of range.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn parse_lat_lng(lat: Option<&str>, lng: Option<&str>) -> Option<(f64, f64)> {
    let latitude = parse_number(lat?.trim())?;
    let longitude = parse_number(lng?.trim())?;

    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some((latitude, longitude))
}

fn column_index(headers: &[String], column: &str, layer: LayerKind) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| DatasetError::MissingColumns {
            layer: layer.to_string(),
            columns: vec![column.to_string()],
        })
}

/// Picks `;` when the header line has more semicolons than commas.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = header.iter().filter(|b| **b == b';').count();
    let commas = header.iter().filter(|b| **b == b',').count();

    if semicolons > commas { b';' } else { b',' }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buildings() -> PointTableSpec {
        PointTableSpec::for_layer(LayerKind::PublicBuildings).unwrap()
    }

    #[test]
    fn reads_comma_separated_rows() {
        let csv = "Nome,Tipo,Latitude,Longitude\n\
                   Prefeitura,Administração,-32.035,-52.099\n\
                   Sem coordenada,Escola,,\n\
                   Zero,Escola,0,0\n";
        let records = read_point_table(csv.as_bytes(), &buildings()).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, 0);
        assert_eq!(r.text("Nome").as_deref(), Some("Prefeitura"));
        let Some(Geometry::Point(p)) = r.geometry() else {
            panic!("expected a point");
        };
        assert!((p.x() + 52.099).abs() < 1e-12);
        assert!((p.y() + 32.035).abs() < 1e-12);
    }

    #[test]
    fn reads_semicolon_tables_with_decimal_commas() {
        let csv = "\u{feff}Nome ; Tipo ; Latitude ; Longitude\n\
                   Quartel;Bombeiros;-32,05;-52,11\n";
        let records = read_point_table(csv.as_bytes(), &buildings()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("Tipo").as_deref(), Some("Bombeiros"));
        assert!(records[0].geometry().is_some());
    }

    #[test]
    fn numeric_cells_are_coerced() {
        let spec = PointTableSpec::for_layer(LayerKind::Companies).unwrap();
        let csv = "latitude,longitude,Empregados,Seção\n-32.0,-52.1,12,Comércio\n";
        let records = read_point_table(csv.as_bytes(), &spec).unwrap();
        assert_eq!(records[0].cell("Empregados"), &CellValue::Number(12.0));
        assert_eq!(records[0].text("Seção").as_deref(), Some("Comércio"));
    }

    #[test]
    fn missing_required_columns_are_reported() {
        let csv = "Tipo,Latitude\nEscola,-32.0\n";
        let Err(DatasetError::MissingColumns { layer, columns }) =
            read_point_table(csv.as_bytes(), &buildings())
        else {
            panic!("expected missing columns");
        };
        assert_eq!(layer, "public_buildings");
        assert_eq!(columns, vec!["Nome".to_string(), "Longitude".to_string()]);
    }

    #[test]
    fn vector_layers_have_no_table_spec() {
        assert!(PointTableSpec::for_layer(LayerKind::Streets).is_none());
        assert!(PointTableSpec::for_layer(LayerKind::RealEstate).is_none());
        for kind in LayerKind::ALL {
            assert_eq!(
                PointTableSpec::for_layer(*kind).is_some(),
                kind.is_point_table()
            );
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(parse_lat_lng(Some("-32.0"), Some("-52.0")).is_some());
        assert!(parse_lat_lng(Some("6450000"), Some("395000")).is_none());
        assert!(parse_lat_lng(Some("abc"), Some("-52.0")).is_none());
        assert!(parse_lat_lng(None, Some("-52.0")).is_none());
    }
}
