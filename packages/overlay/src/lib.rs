#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood scenario overlay pipeline.
//!
//! Ties the other crates together: resolve a scenario's hazard polygon,
//! apply the user's [`LayerFilters`] to every loaded layer, classify each
//! layer against the hazard and aggregate totals versus affected into an
//! [`ImpactReport`](flood_map_analytics_models::ImpactReport).
//!
//! Every call recomputes from scratch. [`OverlayCache`] is an optional,
//! caller-owned memo for the expensive hazard union.

pub mod cache;
pub mod filter;
pub mod pipeline;
pub mod version;

pub use cache::{OverlayCache, OverlayKey};
pub use filter::LayerFilters;
pub use pipeline::{compute_overlay, load_scenario_hazard, scenario_path};
pub use version::DatasetVersion;

use std::path::PathBuf;

/// Errors that can occur while preparing an overlay.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Scenario lookup failed.
    #[error(transparent)]
    Scenario(#[from] flood_map_scenario::ScenarioError),

    /// A layer or hazard file could not be loaded.
    #[error(transparent)]
    Dataset(#[from] flood_map_dataset::DatasetError),

    /// A required scenario file is not in the data directory.
    #[error("Scenario '{id}' file not found: {}", path.display())]
    MissingScenarioFile {
        /// Scenario id.
        id: String,
        /// Expected location.
        path: PathBuf,
    },
}
