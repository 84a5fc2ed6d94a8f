#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial overlay core for flood scenarios.
//!
//! Turns a raw multi-feature flood layer into a single cleaned
//! [`HazardPolygon`] (backed by an R-tree of its parts) and classifies layer
//! records as affected by it. All comparisons happen in the canonical
//! geographic reference system; [`crs::to_canonical`] is the one place
//! coordinates are converted.

pub mod classify;
pub mod crs;
pub mod hazard;

pub use classify::{AffectedSet, Predicate, classify_affected, representative_point};
pub use crs::{Crs, to_canonical};
pub use hazard::{HazardPolygon, union_polygon};

/// Errors raised by reference-system conversion.
///
/// Union and classification never surface errors; they degrade to `None`.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The declared reference system is not one we can convert.
    #[error("Unsupported coordinate reference system: {crs}")]
    UnsupportedCrs {
        /// The declared identifier, as given.
        crs: String,
    },

    /// A coordinate was NaN or infinite before or after conversion.
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate {
        /// X / easting / longitude.
        x: f64,
        /// Y / northing / latitude.
        y: f64,
    },

    /// A projected coordinate converted to a longitude/latitude outside
    /// `[-180, 180] x [-90, 90]`.
    #[error("Coordinate ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain {
        /// Source reference system.
        crs: String,
        /// Projected x.
        x: f64,
        /// Projected y.
        y: f64,
    },
}
