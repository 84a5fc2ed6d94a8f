//! Affected-record classification.
//!
//! Point layers use a strict-first policy: a record is affected when it lies
//! strictly within the hazard. Only when no record of the layer does, the
//! looser `intersects` test is applied so that points sitting exactly on the
//! flood boundary still count. Lines and polygons are tested with
//! `intersects` directly.

use flood_map_dataset_models::{ClassifyMode, Record};
use geo::{CoordsIter, Geometry, InteriorPoint, Point};
use serde::Serialize;

use crate::hazard::HazardPolygon;

/// The spatial predicate that produced an [`AffectedSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Strictly inside the hazard region.
    Within,
    /// Inside or on the boundary of the hazard region.
    Intersects,
}

/// Records of one layer found to be affected by a hazard.
#[derive(Debug, Clone)]
pub struct AffectedSet {
    /// Predicate that selected the records.
    pub predicate: Predicate,
    records: Vec<Record>,
}

impl AffectedSet {
    /// Number of affected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was affected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The affected records, in input order, with all original cells.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the set, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Classifies `records` against `hazard`.
///
/// Returns `None` when there are no records or no hazard. Records without
/// geometry, or with a non-finite coordinate, are never affected; the rest
/// of the layer is still classified.
#[must_use]
pub fn classify_affected(
    records: &[Record],
    hazard: Option<&HazardPolygon>,
    mode: ClassifyMode,
) -> Option<AffectedSet> {
    let hazard = hazard?;
    if records.is_empty() {
        return None;
    }

    let non_finite = records
        .iter()
        .filter(|r| r.geometry().is_some_and(|g| !is_finite(g)))
        .count();
    if non_finite > 0 {
        log::warn!("{non_finite} records have a non-finite coordinate and are never affected");
    }

    let affected = match mode {
        ClassifyMode::Intersects => AffectedSet {
            predicate: Predicate::Intersects,
            records: records
                .iter()
                .filter(|r| finite_geometry(r).is_some_and(|g| hazard.intersects_geometry(g)))
                .cloned()
                .collect(),
        },
        ClassifyMode::Point => classify_points(records, hazard, |g| match g {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }),
        ClassifyMode::RepresentativePoint => classify_points(records, hazard, representative_point),
    };

    log::debug!(
        "{} of {} records affected ({:?})",
        affected.len(),
        records.len(),
        affected.predicate
    );

    Some(affected)
}

/// A point guaranteed to lie on `geometry`. Points pass through; other
/// shapes use an interior point, which (unlike a centroid) stays inside
/// concave polygons.
#[must_use]
pub fn representative_point(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    match geometry {
        Geometry::Point(p) => Some(*p),
        other => other.interior_point(),
    }
}

fn classify_points(
    records: &[Record],
    hazard: &HazardPolygon,
    locate: impl Fn(&Geometry<f64>) -> Option<Point<f64>>,
) -> AffectedSet {
    let located: Vec<(&Record, Point<f64>)> = records
        .iter()
        .filter_map(|r| Some((r, locate(finite_geometry(r)?)?)))
        .collect();

    if located.len() < records.len() {
        log::debug!(
            "{} records have no usable point location",
            records.len() - located.len()
        );
    }

    let within: Vec<Record> = located
        .iter()
        .filter(|(_, p)| hazard.contains_point(*p))
        .map(|(r, _)| (*r).clone())
        .collect();

    if !within.is_empty() {
        return AffectedSet {
            predicate: Predicate::Within,
            records: within,
        };
    }

    AffectedSet {
        predicate: Predicate::Intersects,
        records: located
            .iter()
            .filter(|(_, p)| hazard.intersects_point(*p))
            .map(|(r, _)| (*r).clone())
            .collect(),
    }
}

fn is_finite(geometry: &Geometry<f64>) -> bool {
    geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite())
}

fn finite_geometry(record: &Record) -> Option<&Geometry<f64>> {
    record.geometry().filter(|g| is_finite(g))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::union_polygon;
    use geo::{Rect, coord, line_string, polygon};

    fn square_hazard() -> HazardPolygon {
        let sq = Geometry::Polygon(
            Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }).to_polygon(),
        );
        union_polygon([Some(&sq)], None).unwrap()
    }

    fn point(id: usize, x: f64, y: f64) -> Record {
        Record::new(id, Some(Geometry::Point(Point::new(x, y))))
    }

    fn ids(set: &AffectedSet) -> Vec<usize> {
        set.records().iter().map(|r| r.id).collect()
    }

    #[test]
    fn four_inside_two_outside() {
        let hazard = square_hazard();
        let records = vec![
            point(0, 1.0, 1.0),
            point(1, 9.0, 1.0),
            point(2, 5.0, 5.0),
            point(3, 2.0, 8.0),
            point(4, 11.0, 5.0),
            point(5, -3.0, -3.0),
        ];

        let affected = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(ids(&affected), vec![0, 1, 2, 3]);
        assert_eq!(affected.predicate, Predicate::Within);
    }

    #[test]
    fn boundary_points_ignored_when_something_is_within() {
        let hazard = square_hazard();
        let records = vec![point(0, 5.0, 5.0), point(1, 10.0, 5.0), point(2, 0.0, 0.0)];

        let affected = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(ids(&affected), vec![0]);
        assert_eq!(affected.predicate, Predicate::Within);
    }

    #[test]
    fn falls_back_to_intersects_on_zero_strict_matches() {
        let hazard = square_hazard();
        let records = vec![point(0, 10.0, 5.0), point(1, 0.0, 3.0), point(2, 20.0, 20.0)];

        let affected = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(ids(&affected), vec![0, 1]);
        assert_eq!(affected.predicate, Predicate::Intersects);
    }

    #[test]
    fn no_matches_yields_empty_set() {
        let hazard = square_hazard();
        let records = vec![point(0, 20.0, 20.0)];

        let affected = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        assert!(affected.is_empty());
    }

    #[test]
    fn lines_crossing_the_boundary_are_affected() {
        let hazard = square_hazard();
        let crossing = Record::new(
            0,
            Some(Geometry::LineString(
                line_string![(x: 5.0, y: 5.0), (x: 15.0, y: 5.0)],
            )),
        );
        let outside = Record::new(
            1,
            Some(Geometry::LineString(
                line_string![(x: 15.0, y: 5.0), (x: 20.0, y: 5.0)],
            )),
        );
        let block = Record::new(
            2,
            Some(Geometry::Polygon(polygon![
                (x: 9.0, y: 9.0),
                (x: 12.0, y: 9.0),
                (x: 12.0, y: 12.0),
                (x: 9.0, y: 12.0),
            ])),
        );

        let affected = classify_affected(
            &[crossing, outside, block],
            Some(&hazard),
            ClassifyMode::Intersects,
        )
        .unwrap();
        assert_eq!(ids(&affected), vec![0, 2]);
        assert_eq!(affected.predicate, Predicate::Intersects);
    }

    #[test]
    fn concave_polygons_use_an_interior_point() {
        // U shape whose centroid falls in the notch at x = 5.
        let u = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 8.0, y: 10.0),
            (x: 8.0, y: 2.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]);
        let p = representative_point(&u).unwrap();
        assert!(geo::Intersects::intersects(&u, &p));
    }

    #[test]
    fn representative_point_mode_classifies_polygons() {
        let hazard = square_hazard();
        let inside = Record::new(
            0,
            Some(Geometry::Polygon(
                Rect::new(coord! { x: 2.0, y: 2.0 }, coord! { x: 3.0, y: 3.0 }).to_polygon(),
            )),
        );
        let straddling = Record::new(
            1,
            Some(Geometry::Polygon(
                Rect::new(coord! { x: 9.5, y: 2.0 }, coord! { x: 30.0, y: 3.0 }).to_polygon(),
            )),
        );

        let affected = classify_affected(
            &[inside, straddling],
            Some(&hazard),
            ClassifyMode::RepresentativePoint,
        )
        .unwrap();
        assert_eq!(ids(&affected), vec![0]);
    }

    #[test]
    fn classification_is_idempotent() {
        let hazard = square_hazard();
        let records = vec![point(0, 1.0, 1.0), point(1, 50.0, 1.0), point(2, 3.0, 4.0)];

        let once = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        let twice =
            classify_affected(once.records(), Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(ids(&once), ids(&twice));

        let boundary = vec![point(0, 10.0, 1.0), point(1, 50.0, 1.0)];
        let once = classify_affected(&boundary, Some(&hazard), ClassifyMode::Point).unwrap();
        let twice =
            classify_affected(once.records(), Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn missing_inputs_yield_none() {
        let hazard = square_hazard();
        assert!(classify_affected(&[], Some(&hazard), ClassifyMode::Point).is_none());
        assert!(classify_affected(&[point(0, 1.0, 1.0)], None, ClassifyMode::Point).is_none());
    }

    #[test]
    fn non_finite_records_are_skipped() {
        let hazard = square_hazard();
        let xs = [1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0];
        let mut records: Vec<Record> = (0..1000).map(|i| point(i, xs[i % xs.len()], 5.0)).collect();
        records.push(point(1000, f64::NAN, 5.0));
        records.push(point(1001, 5.0, f64::INFINITY));

        let affected = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(affected.len(), 1000);
        assert_eq!(affected.predicate, Predicate::Within);
    }

    #[test]
    fn non_finite_lines_are_skipped() {
        let hazard = square_hazard();
        let records = vec![
            Record::new(
                0,
                Some(Geometry::LineString(
                    line_string![(x: f64::NAN, y: 5.0), (x: 5.0, y: 5.0)],
                )),
            ),
            Record::new(
                1,
                Some(Geometry::LineString(
                    line_string![(x: 2.0, y: 5.0), (x: 5.0, y: 5.0)],
                )),
            ),
        ];

        let affected =
            classify_affected(&records, Some(&hazard), ClassifyMode::Intersects).unwrap();
        assert_eq!(ids(&affected), vec![1]);
    }

    #[test]
    fn records_without_geometry_are_never_affected() {
        let hazard = square_hazard();
        let records = vec![Record::new(0, None), point(1, 1.0, 1.0)];

        let affected = classify_affected(&records, Some(&hazard), ClassifyMode::Point).unwrap();
        assert_eq!(ids(&affected), vec![1]);
    }
}
