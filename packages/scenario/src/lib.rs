#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood hazard scenarios.
//!
//! A scenario is a named flood extent (observed or projected) shipped as a
//! polygon file in the data directory. The set of scenarios is fixed at
//! compile time; see [`registry`].

pub mod registry;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use registry::{all_scenarios, scenario_by_id};

/// Errors that can occur while resolving scenarios.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Scenario TOML could not be parsed.
    #[error("Scenario config error: {0}")]
    Config(#[from] toml::de::Error),

    /// No scenario has the requested id.
    #[error("Unknown scenario '{id}' (available: {})", available.join(", "))]
    Unknown {
        /// Requested id.
        id: String,
        /// Ids that do exist.
        available: Vec<String>,
    },
}

/// A flood extent the overlay can be run against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioDefinition {
    /// Unique identifier (e.g., `"may_2024"`).
    pub id: String,
    /// Display name (e.g., `"Maio de 2024"`).
    pub name: String,
    /// Polygon file, relative to the data directory.
    pub file: String,
    /// Whether the file may be absent from a data delivery. A missing
    /// optional scenario is reported as unavailable instead of failing.
    #[serde(default)]
    pub optional: bool,
}

impl ScenarioDefinition {
    /// Location of the scenario file inside `data_dir`.
    #[must_use]
    pub fn path_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.file)
    }
}

/// Parses a scenario definition from TOML.
///
/// # Errors
///
/// Returns [`ScenarioError::Config`] if the TOML is malformed.
pub fn parse_scenario_toml(toml_str: &str) -> Result<ScenarioDefinition, ScenarioError> {
    Ok(toml::from_str(toml_str)?)
}
