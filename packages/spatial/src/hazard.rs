//! Flood-extent union.
//!
//! A scenario layer arrives as many polygon features of arbitrary quality
//! (self-intersections, null geometries, undeclared reference system).
//! [`union_polygon`] reduces them to one [`HazardPolygon`]; the polygon keeps
//! its parts in an R-tree so per-record tests only touch nearby parts.

use geo::{
    Area, BooleanOps, BoundingRect, Contains, Geometry, HasDimensions, Intersects, MultiPolygon,
    Point, Polygon, Validation,
};
use rstar::{AABB, RTree, RTreeObject};

use crate::crs::{Crs, to_canonical};

/// One disjoint part of the unioned hazard region.
#[derive(Debug, Clone)]
struct HazardPart {
    envelope: AABB<[f64; 2]>,
    polygon: Polygon<f64>,
    shape: Geometry<f64>,
}

impl RTreeObject for HazardPart {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// The unioned flood region of a scenario, in canonical coordinates.
///
/// Never empty: construction fails instead.
#[derive(Debug, Clone)]
pub struct HazardPolygon {
    region: MultiPolygon<f64>,
    parts: RTree<HazardPart>,
}

impl HazardPolygon {
    /// Wraps an already-unioned region. Returns `None` for an empty region.
    #[must_use]
    pub fn from_region(region: MultiPolygon<f64>) -> Option<Self> {
        let entries: Vec<HazardPart> = region
            .0
            .iter()
            .filter(|polygon| !polygon.is_empty())
            .filter_map(|polygon| {
                let rect = polygon.bounding_rect()?;
                Some(HazardPart {
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    polygon: polygon.clone(),
                    shape: Geometry::Polygon(polygon.clone()),
                })
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        Some(Self {
            region,
            parts: RTree::bulk_load(entries),
        })
    }

    /// The unioned region.
    #[must_use]
    pub const fn region(&self) -> &MultiPolygon<f64> {
        &self.region
    }

    /// Number of disjoint parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.size()
    }

    /// Planar area in square degrees.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.region.unsigned_area()
    }

    /// Whether `point` lies strictly inside the region (boundary excluded).
    #[must_use]
    pub fn contains_point(&self, point: Point<f64>) -> bool {
        let query = AABB::from_point([point.x(), point.y()]);
        self.parts
            .locate_in_envelope_intersecting(&query)
            .any(|part| part.polygon.contains(&point))
    }

    /// Whether `point` lies inside or on the boundary of the region.
    #[must_use]
    pub fn intersects_point(&self, point: Point<f64>) -> bool {
        let query = AABB::from_point([point.x(), point.y()]);
        self.parts
            .locate_in_envelope_intersecting(&query)
            .any(|part| point.intersects(&part.polygon))
    }

    /// Whether `geometry` shares at least one point with the region.
    #[must_use]
    pub fn intersects_geometry(&self, geometry: &Geometry<f64>) -> bool {
        let Some(rect) = geometry.bounding_rect() else {
            return false;
        };
        let query =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        self.parts
            .locate_in_envelope_intersecting(&query)
            .any(|part| geometry.intersects(&part.shape))
    }

    /// Serializes the region as a `GeoJSON` geometry for the presentation
    /// layer.
    #[must_use]
    pub fn to_geojson(&self) -> String {
        geojson::Geometry::new(geojson::Value::from(&self.region)).to_string()
    }
}

/// Unions the features of a hazard layer into one region.
///
/// Geometries are reprojected from `declared` (EPSG:4326 when `None`) and
/// invalid polygons are re-noded. Null, empty, non-areal and
/// non-reprojectable features are dropped one by one; the rest is unioned.
/// Returns `None` only when nothing usable remains, which the caller treats
/// as "no scenario active".
#[must_use]
pub fn union_polygon<'a>(
    raw_layer: impl IntoIterator<Item = Option<&'a Geometry<f64>>>,
    declared: Option<Crs>,
) -> Option<HazardPolygon> {
    let crs = declared.unwrap_or(Crs::CANONICAL);
    let mut parts: Vec<Polygon<f64>> = Vec::new();
    let mut features = 0usize;
    let mut skipped = 0usize;

    for geometry in raw_layer {
        features += 1;
        let Some(geometry) = geometry else {
            skipped += 1;
            continue;
        };

        let canonical = match to_canonical(geometry, Some(crs)) {
            Ok(g) => g,
            Err(e) => {
                log::warn!("Hazard feature {features} dropped; not reprojectable from {crs}: {e}");
                skipped += 1;
                continue;
            }
        };

        let before = parts.len();
        for polygon in areal_parts(canonical) {
            parts.extend(repair(polygon).0.into_iter().filter(|p| !p.is_empty()));
        }
        if parts.len() == before {
            skipped += 1;
        }
    }

    if parts.is_empty() {
        log::warn!("Hazard layer has no usable polygons ({features} features, {skipped} skipped)");
        return None;
    }

    let region = geo::unary_union(&parts);
    log::debug!(
        "Unioned {} hazard polygons from {features} features ({skipped} skipped) into {} parts",
        parts.len(),
        region.0.len()
    );

    HazardPolygon::from_region(region)
}

/// Flattens a geometry into its polygons. Points and lines have no area and
/// are discarded.
fn areal_parts(geometry: Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p],
        Geometry::MultiPolygon(mp) => mp.0,
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.0.into_iter().flat_map(areal_parts).collect(),
        Geometry::Point(_)
        | Geometry::MultiPoint(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiLineString(_) => Vec::new(),
    }
}

/// Zero-distance repair: invalid polygons are re-noded through a boolean
/// union with the empty set. A repair that loses all area falls back to
/// the original polygon.
fn repair(polygon: Polygon<f64>) -> MultiPolygon<f64> {
    if polygon.is_valid() {
        return MultiPolygon::new(vec![polygon]);
    }

    let repaired = polygon.union(&MultiPolygon::<f64>::new(vec![]));
    if repaired.0.is_empty() && polygon.unsigned_area() > 0.0 {
        log::debug!("Polygon repair produced an empty result; keeping the original");
        return MultiPolygon::new(vec![polygon]);
    }

    repaired
}
