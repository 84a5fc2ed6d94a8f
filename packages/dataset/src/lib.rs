#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood-map data loading.
//!
//! Reads the exported layer files listed in a [`DatasetManifest`] into
//! [`Record`](flood_map_dataset_models::Record)s in the canonical reference
//! system:
//!
//! * vector layers and hazard scenarios from `GeoJSON` `FeatureCollection`s
//!   ([`vector`]),
//! * point layers from CSV tables with latitude/longitude columns
//!   ([`table`]).
//!
//! Loader-side derivations (school dependency labels and staff totals,
//! street identity keys) are applied here so the overlay core reads plain
//! columns.

pub mod derive;
pub mod loader;
pub mod manifest;
pub mod progress;
pub mod table;
pub mod vector;

pub use loader::{Dataset, load_dataset, load_hazard, load_layer};
pub use manifest::{DatasetManifest, LayerSource};
pub use progress::{NullProgress, ProgressCallback};
pub use table::{PointTableSpec, load_point_table, read_point_table};
pub use vector::{load_geojson_layer, read_geojson_layer};

/// Errors that can occur while loading layer files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parse error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Manifest parse error.
    #[error("Manifest error: {0}")]
    Manifest(#[from] toml::de::Error),

    /// Reference system could not be resolved.
    #[error("Reference system error: {0}")]
    Crs(#[from] flood_map_spatial::SpatialError),

    /// A table lacks columns the layer needs.
    #[error("{layer}: missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Layer being loaded.
        layer: String,
        /// Columns that were not found.
        columns: Vec<String>,
    },

    /// The file content is not what the layer expects.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },
}
