//! Dataset manifest.
//!
//! A TOML file mapping every layer (and optionally every scenario) to a file
//! inside the data directory. The built-in manifest is embedded at compile
//! time and names the files the municipal exports ship with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use flood_map_dataset_models::LayerKind;
use flood_map_spatial::Crs;
use serde::{Deserialize, Serialize};

use crate::DatasetError;

const DEFAULT_MANIFEST: &str = include_str!("../manifests/default.toml");

/// Where one layer or scenario is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSource {
    /// File name relative to the data directory.
    pub file: String,
    /// Reference system forced onto the file (e.g. `"EPSG:31982"`),
    /// replacing whatever it declares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl LayerSource {
    /// Creates a source with no reference-system override.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            crs: None,
        }
    }

    /// The parsed reference-system override.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Crs`] if the override is not a supported
    /// reference system.
    pub fn crs(&self) -> Result<Option<Crs>, DatasetError> {
        self.crs
            .as_deref()
            .map(Crs::from_str)
            .transpose()
            .map_err(DatasetError::from)
    }
}

/// Layer and scenario files of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Per-layer sources. Layers not listed are not loaded.
    #[serde(default)]
    pub layers: BTreeMap<LayerKind, LayerSource>,
    /// Scenario file overrides, keyed by scenario id.
    #[serde(default)]
    pub scenarios: BTreeMap<String, LayerSource>,
}

impl DatasetManifest {
    /// The embedded default manifest.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (caught by the unit tests).
    #[must_use]
    pub fn builtin() -> Self {
        Self::parse(DEFAULT_MANIFEST)
            .unwrap_or_else(|e| panic!("Failed to parse embedded manifest: {e}"))
    }

    /// Parses a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Manifest`] if the text is not a valid
    /// manifest.
    pub fn parse(toml_str: &str) -> Result<Self, DatasetError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Absolute path of a layer file, if the layer is configured.
    #[must_use]
    pub fn layer_path(&self, data_dir: &Path, kind: LayerKind) -> Option<PathBuf> {
        self.layers.get(&kind).map(|s| data_dir.join(&s.file))
    }

    /// Every file the manifest references, layers first.
    #[must_use]
    pub fn files(&self) -> Vec<&str> {
        self.layers
            .values()
            .chain(self.scenarios.values())
            .map(|s| s.file.as_str())
            .collect()
    }
}
