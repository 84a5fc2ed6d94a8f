//! Attribute filters applied before classification.

use std::borrow::Cow;

use flood_map_dataset_models::schema::{building, company, health, school};
use flood_map_dataset_models::{LayerKind, Record};
use serde::{Deserialize, Serialize};

/// Category selections per layer. An empty selection keeps every record.
///
/// Values are compared trimmed and case-insensitively against the cell's
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerFilters {
    /// Company sectors (`Seção`).
    pub sectors: Vec<String>,
    /// Company subsectors (`Denominação`).
    pub subsectors: Vec<String>,
    /// Company registration statuses. Defaults to active companies only.
    pub statuses: Vec<String>,
    /// Health establishment type codes.
    pub health_types: Vec<String>,
    /// Public building types.
    pub building_types: Vec<String>,
    /// Security post types.
    pub security_types: Vec<String>,
    /// School dependency labels (`Federal`, `Estadual`, ...).
    pub dependencies: Vec<String>,
}

impl Default for LayerFilters {
    fn default() -> Self {
        Self {
            statuses: vec![company::DEFAULT_STATUS.to_string()],
            ..Self::unfiltered()
        }
    }
}

impl LayerFilters {
    /// Filters that keep every record, including inactive companies.
    #[must_use]
    pub const fn unfiltered() -> Self {
        Self {
            sectors: Vec::new(),
            subsectors: Vec::new(),
            statuses: Vec::new(),
            health_types: Vec::new(),
            building_types: Vec::new(),
            security_types: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn selections(&self, kind: LayerKind) -> Vec<(&'static str, &[String])> {
        let all = match kind {
            LayerKind::Companies => vec![
                (company::SECTOR, self.sectors.as_slice()),
                (company::SUBSECTOR, self.subsectors.as_slice()),
                (company::STATUS, self.statuses.as_slice()),
            ],
            LayerKind::HealthUnits => vec![(health::ESTABLISHMENT_TYPE, self.health_types.as_slice())],
            LayerKind::Schools => vec![(school::DEPENDENCY_LABEL, self.dependencies.as_slice())],
            LayerKind::PublicBuildings => vec![(building::KIND, self.building_types.as_slice())],
            LayerKind::SecurityPosts => vec![(building::KIND, self.security_types.as_slice())],
            LayerKind::Streets | LayerKind::Parcels | LayerKind::Blocks | LayerKind::RealEstate => {
                Vec::new()
            }
        };

        all.into_iter().filter(|(_, values)| !values.is_empty()).collect()
    }

    /// Records of `kind` that pass every active selection.
    ///
    /// Borrows the input when no selection applies to the layer.
    #[must_use]
    pub fn apply<'a>(&self, kind: LayerKind, records: &'a [Record]) -> Cow<'a, [Record]> {
        let selections = self.selections(kind);
        if selections.is_empty() {
            return Cow::Borrowed(records);
        }

        let kept: Vec<Record> = records
            .iter()
            .filter(|r| selections.iter().all(|(column, values)| matches(r, column, values)))
            .cloned()
            .collect();

        log::debug!("{kind}: filters kept {} of {} records", kept.len(), records.len());
        Cow::Owned(kept)
    }
}

fn matches(record: &Record, column: &str, values: &[String]) -> bool {
    record.text(column).is_some_and(|cell| {
        let cell = cell.trim();
        values.iter().any(|v| v.trim().eq_ignore_ascii_case(cell))
    })
}
