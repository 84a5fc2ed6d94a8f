#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for flood impact reports.
//!
//! Loads the municipal layers from a data directory, unions the selected
//! flood scenario and prints how much of each layer falls inside it.
//!
//! Uses `indicatif-log-bridge` (via [`flood_map_cli_utils::init_logger`])
//! so log lines and the layer-loading progress bar share the terminal.

mod format;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use flood_map_analytics_models::ImpactReport;
use flood_map_cli_utils::{IndicatifProgress, MultiProgress};
use flood_map_dataset::{DatasetManifest, load_dataset};
use flood_map_dataset_models::LayerKind;
use flood_map_overlay::{
    DatasetVersion, LayerFilters, OverlayCache, OverlayKey, compute_overlay,
    load_scenario_hazard, scenario_path,
};
use flood_map_scenario::{ScenarioDefinition, all_scenarios, scenario_by_id};

#[derive(Parser)]
#[command(name = "flood_map_cli", about = "Flood impact overlay reports")]
struct Cli {
    /// Directory holding the layer and scenario files
    #[arg(long, global = true, env = "FLOOD_MAP_DATA_DIR", default_value = "Dados")]
    data_dir: PathBuf,
    /// Dataset manifest (TOML). Defaults to the built-in file list.
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the impact of one or more flood scenarios
    Report {
        /// Scenario id (repeatable). Without one, only totals are reported.
        #[arg(long = "scenario")]
        scenarios: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Keep only companies in this sector (repeatable)
        #[arg(long = "sector")]
        sectors: Vec<String>,
        /// Keep only companies in this subsector (repeatable)
        #[arg(long = "subsector")]
        subsectors: Vec<String>,
        /// Company registration status to keep (repeatable). Defaults to
        /// `Ativa`.
        #[arg(long = "status")]
        statuses: Vec<String>,
        /// Keep companies of every registration status
        #[arg(long, conflicts_with = "statuses")]
        all_statuses: bool,
        /// Keep only health establishments of this type code (repeatable)
        #[arg(long = "health-type")]
        health_types: Vec<String>,
        /// Keep only public buildings of this type (repeatable)
        #[arg(long = "building-type")]
        building_types: Vec<String>,
        /// Keep only security posts of this type (repeatable)
        #[arg(long = "security-type")]
        security_types: Vec<String>,
        /// Keep only schools with this dependency, e.g. "Municipal" (repeatable)
        #[arg(long = "dependency")]
        dependencies: Vec<String>,
    },
    /// List the configured flood scenarios
    Scenarios,
    /// List the dataset layers and their files
    Layers,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn load_manifest(path: Option<&Path>) -> Result<DatasetManifest, flood_map_dataset::DatasetError> {
    match path {
        Some(path) => {
            log::info!("Using manifest {}", path.display());
            DatasetManifest::load(path)
        }
        None => Ok(DatasetManifest::builtin()),
    }
}

fn availability(path: &Path) -> &'static str {
    if path.exists() { "ok" } else { "ausente" }
}

fn list_scenarios(manifest: &DatasetManifest, data_dir: &Path) {
    println!("{:<18} {:<22} {:<8} ARQUIVO", "ID", "NOME", "STATUS");
    println!("{}", "-".repeat(80));
    for scenario in &all_scenarios() {
        let path = scenario_path(manifest, data_dir, scenario);
        let status = match (path.exists(), scenario.optional) {
            (true, _) => "ok",
            (false, true) => "opcional",
            (false, false) => "ausente",
        };
        println!(
            "{:<18} {:<22} {status:<8} {}",
            scenario.id,
            scenario.name,
            path.display()
        );
    }
}

fn list_layers(manifest: &DatasetManifest, data_dir: &Path) {
    println!("{:<18} {:<22} {:<8} ARQUIVO", "CAMADA", "NOME", "STATUS");
    println!("{}", "-".repeat(80));
    for kind in LayerKind::ALL {
        match manifest.layer_path(data_dir, *kind) {
            Some(path) => println!(
                "{:<18} {:<22} {:<8} {}",
                kind.to_string(),
                kind.label(),
                availability(&path),
                path.display()
            ),
            None => println!(
                "{:<18} {:<22} {:<8} -",
                kind.to_string(),
                kind.label(),
                "sem arquivo"
            ),
        }
    }
}

struct ReportArgs {
    scenarios: Vec<String>,
    format: OutputFormat,
    filters: LayerFilters,
}

fn run_report(
    multi: &MultiProgress,
    manifest: &DatasetManifest,
    data_dir: &Path,
    args: &ReportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenarios: Vec<ScenarioDefinition> = args
        .scenarios
        .iter()
        .map(|id| scenario_by_id(id))
        .collect::<Result<_, _>>()?;

    let progress = IndicatifProgress::layers_bar(multi, "Carregando camadas");
    let dataset = load_dataset(manifest, data_dir, progress.as_ref());
    if dataset.is_empty() {
        log::warn!(
            "No layer could be loaded from {}; check --data-dir",
            data_dir.display()
        );
    }

    let scenario_files: Vec<PathBuf> = all_scenarios()
        .iter()
        .map(|s| scenario_path(manifest, data_dir, s))
        .collect();
    let version = DatasetVersion::compute(
        manifest,
        data_dir,
        scenario_files.iter().map(PathBuf::as_path),
    );

    let targets: Vec<Option<&ScenarioDefinition>> = if scenarios.is_empty() {
        vec![None]
    } else {
        scenarios.iter().map(Some).collect()
    };

    let mut hazards = OverlayCache::new();
    let mut reports: Vec<(String, ImpactReport)> = Vec::with_capacity(targets.len());

    for scenario in targets {
        let key = OverlayKey::new(version.clone(), scenario.map(|s| s.id.as_str()));
        let hazard = hazards.get_or_try_compute(key, || {
            scenario.map_or(Ok(None), |s| load_scenario_hazard(manifest, data_dir, s))
        })?;

        let mut report = compute_overlay(&dataset, hazard.as_ref(), &args.filters);
        report.scenario_id = scenario.map(|s| s.id.clone());

        let title = scenario.map_or_else(
            || "Totais (sem cenário)".to_string(),
            |s| format!("Cenário: {}", s.name),
        );
        reports.push((title, report));
    }

    match args.format {
        OutputFormat::Json => {
            let json = match reports.as_slice() {
                [(_, report)] => serde_json::to_string_pretty(report)?,
                many => {
                    let all: Vec<&ImpactReport> = many.iter().map(|(_, r)| r).collect();
                    serde_json::to_string_pretty(&all)?
                }
            };
            println!("{json}");
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, (title, report)) in reports.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                format::render_report(&mut out, title, report)?;
            }
            print!("{out}");
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = flood_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let manifest = load_manifest(cli.manifest.as_deref())?;

    match cli.command {
        Commands::Scenarios => list_scenarios(&manifest, &cli.data_dir),
        Commands::Layers => list_layers(&manifest, &cli.data_dir),
        Commands::Report {
            scenarios,
            format,
            sectors,
            subsectors,
            statuses,
            all_statuses,
            health_types,
            building_types,
            security_types,
            dependencies,
        } => {
            let defaults = LayerFilters::default();
            let statuses = if all_statuses {
                Vec::new()
            } else if statuses.is_empty() {
                defaults.statuses
            } else {
                statuses
            };

            let filters = LayerFilters {
                sectors,
                subsectors,
                statuses,
                health_types,
                building_types,
                security_types,
                dependencies,
            };

            run_report(
                &multi,
                &manifest,
                &cli.data_dir,
                &ReportArgs {
                    scenarios,
                    format,
                    filters,
                },
            )?;
        }
    }

    Ok(())
}
