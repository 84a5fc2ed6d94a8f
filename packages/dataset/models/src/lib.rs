#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Layer record types shared across the flood map workspace.
//!
//! Every dataset the dashboard overlays (companies, health units, schools,
//! streets, parcels, ...) is loaded into a list of [`Record`]s. Cells are
//! coerced into [`CellValue`]s once at the loading boundary so consumers
//! never have to re-parse raw strings.

pub mod schema;

use std::borrow::Cow;
use std::collections::BTreeMap;

use geo::Geometry;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the categorized layers overlaid against a flood scenario.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerKind {
    /// Georeferenced RAIS / Receita company registry.
    Companies,
    /// CNES health establishments.
    HealthUnits,
    /// INEP school census entries.
    Schools,
    /// Municipal, state and federal public buildings.
    PublicBuildings,
    /// Police, fire and civil defense posts.
    SecurityPosts,
    /// Street segments (lines).
    Streets,
    /// Land parcels (polygons).
    Parcels,
    /// City blocks (polygons).
    Blocks,
    /// Real-estate cadastre units (polygons, tested by interior point).
    RealEstate,
}

impl LayerKind {
    /// Every layer, in report order.
    pub const ALL: &[Self] = &[
        Self::Companies,
        Self::HealthUnits,
        Self::Schools,
        Self::PublicBuildings,
        Self::SecurityPosts,
        Self::Streets,
        Self::Parcels,
        Self::Blocks,
        Self::RealEstate,
    ];

    /// Human-readable (Portuguese) layer name used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Companies => "Empresas",
            Self::HealthUnits => "Saúde",
            Self::Schools => "Educação",
            Self::PublicBuildings => "Prédios Públicos",
            Self::SecurityPosts => "Segurança",
            Self::Streets => "Ruas",
            Self::Parcels => "Terrenos",
            Self::Blocks => "Quadras",
            Self::RealEstate => "Imóveis",
        }
    }

    /// How records of this layer are tested against a hazard polygon.
    #[must_use]
    pub const fn classify_mode(self) -> ClassifyMode {
        match self {
            Self::Companies
            | Self::HealthUnits
            | Self::Schools
            | Self::PublicBuildings
            | Self::SecurityPosts => ClassifyMode::Point,
            Self::Streets | Self::Parcels | Self::Blocks => ClassifyMode::Intersects,
            Self::RealEstate => ClassifyMode::RepresentativePoint,
        }
    }

    /// Whether the layer is delivered as a table with latitude/longitude
    /// columns rather than as a vector file.
    #[must_use]
    pub const fn is_point_table(self) -> bool {
        matches!(
            self,
            Self::Companies
                | Self::HealthUnits
                | Self::Schools
                | Self::PublicBuildings
                | Self::SecurityPosts
        )
    }
}

/// Spatial predicate policy used when classifying a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyMode {
    /// Point assets: strict `within`, loosened to `intersects` only when
    /// nothing is strictly inside.
    Point,
    /// Shapes reduced to an interior point, then classified as [`Self::Point`].
    RepresentativePoint,
    /// Lines and polygons: plain `intersects`.
    Intersects,
}

/// A single table cell, coerced at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Any other non-empty text.
    Text(String),
    /// Null, empty or absent.
    Missing,
}

impl CellValue {
    /// Coerces raw text into a cell: empty text is [`Self::Missing`],
    /// numeric text (including `,` decimal separators) is [`Self::Number`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        parse_number(trimmed).map_or_else(|| Self::Text(trimmed.to_string()), Self::Number)
    }

    /// Converts a JSON property value into a cell. Strings are kept as
    /// text (not parsed) so codes like `"0042"` survive untouched.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Number),
            serde_json::Value::String(s) if s.trim().is_empty() => Self::Missing,
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Numeric view of the cell. Text is parsed leniently; booleans map to
    /// `1.0`/`0.0`. Returns `None` for missing or non-numeric cells.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) | Self::Missing => None,
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => parse_number(s.trim()),
        }
    }

    /// Text view of the cell. Whole numbers render without a decimal
    /// point (`3.0` → `"3"`).
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) => Some(Cow::Owned(format_number(*n))),
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Missing => None,
        }
    }

    /// Returns `true` for [`Self::Missing`].
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns `true` if the cell holds a number (not numeric text).
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Missing
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

static MISSING: CellValue = CellValue::Missing;

/// A row of a layer: an optional geometry plus named cells.
///
/// Geometries are expected in the canonical geographic reference system
/// (EPSG:4326) by the time a record reaches the overlay core.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Zero-based row index within the source file.
    pub id: usize,
    /// Record geometry, if it could be resolved.
    pub geometry: Option<Geometry<f64>>,
    /// Named cells.
    pub cells: BTreeMap<String, CellValue>,
}

impl Record {
    /// Creates a record with no cells.
    #[must_use]
    pub const fn new(id: usize, geometry: Option<Geometry<f64>>) -> Self {
        Self {
            id,
            geometry,
            cells: BTreeMap::new(),
        }
    }

    /// Builder-style cell setter.
    #[must_use]
    pub fn with_cell(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets (or replaces) a cell.
    pub fn set(&mut self, column: &str, value: impl Into<CellValue>) {
        self.cells.insert(column.to_string(), value.into());
    }

    /// Returns the cell for `column`, or [`CellValue::Missing`] if the
    /// column does not exist.
    #[must_use]
    pub fn cell(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&MISSING)
    }

    /// Whether the record carries the column at all.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Numeric view of a cell.
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        self.cell(column).as_f64()
    }

    /// Text view of a cell.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<Cow<'_, str>> {
        self.cell(column).as_text()
    }

    /// Record geometry.
    #[must_use]
    pub const fn geometry(&self) -> Option<&Geometry<f64>> {
        self.geometry.as_ref()
    }
}

/// Parses a numeric string, accepting a `,` decimal separator when the
/// text has no `.`.
#[must_use]
pub fn parse_number(s: &str) -> Option<f64> {
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    if s.contains(',') && !s.contains('.') {
        return s
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite());
    }
    None
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
