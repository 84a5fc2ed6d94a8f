//! Scenario registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/scenario/scenarios/` is baked into the
//! binary at compile time via [`include_str!`]. The order below is the
//! order scenarios are listed to the user.

use crate::{ScenarioDefinition, ScenarioError, parse_scenario_toml};

const SCENARIO_TOMLS: &[(&str, &str)] = &[
    ("may_2024", include_str!("../scenarios/may_2024.toml")),
    (
        "may_2024_plus60",
        include_str!("../scenarios/may_2024_plus60.toml"),
    ),
    ("sep_2023", include_str!("../scenarios/sep_2023.toml")),
];

#[cfg(test)]
const EXPECTED_SCENARIO_COUNT: usize = 3;

/// Returns every configured scenario, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// the unit tests catch this).
#[must_use]
pub fn all_scenarios() -> Vec<ScenarioDefinition> {
    SCENARIO_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_scenario_toml(toml)
                .unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a scenario by id.
///
/// # Errors
///
/// Returns [`ScenarioError::Unknown`] if no scenario has that id.
pub fn scenario_by_id(id: &str) -> Result<ScenarioDefinition, ScenarioError> {
    let scenarios = all_scenarios();
    let available: Vec<String> = scenarios.iter().map(|s| s.id.clone()).collect();

    scenarios
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| {
            log::debug!("Scenario lookup failed for '{id}'");
            ScenarioError::Unknown {
                id: id.to_string(),
                available,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_scenarios() {
        assert_eq!(all_scenarios().len(), EXPECTED_SCENARIO_COUNT);
    }

    #[test]
    fn scenario_ids_are_unique() {
        let scenarios = all_scenarios();
        let mut ids: Vec<&str> = scenarios.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_SCENARIO_COUNT);
    }

    #[test]
    fn registry_keys_match_ids() {
        for ((key, _), scenario) in SCENARIO_TOMLS.iter().zip(all_scenarios()) {
            assert_eq!(*key, scenario.id);
        }
    }

    #[test]
    fn all_scenarios_have_required_fields() {
        for scenario in &all_scenarios() {
            assert!(!scenario.id.is_empty(), "scenario id is empty");
            assert!(!scenario.name.is_empty(), "{}: name is empty", scenario.id);
            assert!(
                scenario.file.ends_with(".geojson"),
                "{}: unexpected file {}",
                scenario.id,
                scenario.file
            );
        }
    }

    #[test]
    fn only_the_projection_is_optional() {
        let optional: Vec<String> = all_scenarios()
            .into_iter()
            .filter(|s| s.optional)
            .map(|s| s.id)
            .collect();
        assert_eq!(optional, vec!["may_2024_plus60".to_string()]);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(scenario_by_id("sep_2023").unwrap().name, "Setembro de 2023");

        let Err(ScenarioError::Unknown { id, available }) = scenario_by_id("jun_1941") else {
            panic!("expected unknown scenario");
        };
        assert_eq!(id, "jun_1941");
        assert_eq!(available.len(), EXPECTED_SCENARIO_COUNT);
    }
}
