//! ACR vs ACL simulator entry point: CLI wiring and scenario loading.

mod cli;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use acl_sim::batch::{run_batch_file, write_batch_csv};
use acl_sim::config::{ConfigError, ScenarioConfig};
use acl_sim::io::export::{export_annual_csv, export_monthly_csv, write_json};
use acl_sim::locale::{format_brl, format_percent};
use acl_sim::sim::compare::ScenarioComparison;
use acl_sim::sim::types::{MONTH_ABBREVIATIONS, TariffStructure};
use acl_sim::sim::{SimError, SimulationResult, simulate};
use acl_sim::tariffs::{TariffError, TariffTable};

use cli::{BatchArgs, Cli, Command, CompareArgs, ScenarioSource, SimulateArgs, TariffsArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error("{}", join_lines(.0))]
    Config(Vec<ConfigError>),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Tariff(#[from] TariffError),

    #[error("cannot write \"{path}\": {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(vec![e])
    }
}

fn join_lines(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_err(path: &Path) -> impl FnOnce(io::Error) -> CliError + '_ {
    move |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Loads, resolves, and validates a scenario.
fn load_scenario(
    scenario: Option<&Path>,
    preset: Option<&str>,
    tariffs: Option<&Path>,
) -> Result<ScenarioConfig, CliError> {
    // --scenario takes priority, then --preset, then baseline default
    let mut cfg = match (scenario, preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };

    match tariffs {
        Some(path) => cfg.apply_tariff_table(&TariffTable::from_path(path)?)?,
        None => cfg.require_inline_tariff()?,
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        return Err(CliError::Config(errors));
    }
    Ok(cfg)
}

fn load_source(source: &ScenarioSource) -> Result<ScenarioConfig, CliError> {
    load_scenario(
        source.scenario.as_deref(),
        source.preset.as_deref(),
        source.tariffs.as_deref(),
    )
}

fn run_scenario(cfg: &ScenarioConfig) -> Result<SimulationResult, CliError> {
    Ok(simulate(&cfg.to_params()?))
}

fn cmd_simulate(args: &SimulateArgs) -> Result<(), CliError> {
    let cfg = load_source(&args.source)?;
    let result = run_scenario(&cfg)?;

    if args.json {
        write_json(&result, io::stdout().lock())?;
    } else {
        if args.monthly {
            for m in &result.monthly {
                println!("{m}");
            }
            println!();
        }
        println!("{result}");
    }

    if let Some(path) = &args.monthly_out {
        export_monthly_csv(&result.monthly, path).map_err(write_err(path))?;
        info!(path = %path.display(), "monthly rows written");
    }
    if let Some(path) = &args.annual_out {
        export_annual_csv(&result.annual, path).map_err(write_err(path))?;
        info!(path = %path.display(), "annual rows written");
    }
    Ok(())
}

/// A compare operand names a preset unless it looks like a file.
fn load_operand(operand: &str, tariffs: Option<&Path>) -> Result<ScenarioConfig, CliError> {
    let path = Path::new(operand);
    if path.exists() || operand.ends_with(".toml") {
        load_scenario(Some(path), None, tariffs)
    } else {
        load_scenario(None, Some(operand), tariffs)
    }
}

fn cmd_compare(args: &CompareArgs) -> Result<(), CliError> {
    let tariffs = args.tariffs.as_deref();
    let a = run_scenario(&load_operand(&args.a, tariffs)?)?;
    let b = run_scenario(&load_operand(&args.b, tariffs)?)?;
    println!("{}", ScenarioComparison::new(&args.a, &a, &args.b, &b));
    Ok(())
}

fn cmd_batch(args: &BatchArgs) -> Result<(), CliError> {
    let table = TariffTable::from_path(&args.tariffs)?;
    let report = run_batch_file(&args.units, &table)?;

    for unit in &report.units {
        match &unit.result {
            Ok(s) => println!(
                "{:<24} ok     discount {:>7}  savings {:>18}  NPV {:>18}",
                unit.name,
                format_percent(s.overall_discount),
                format_brl(s.total_savings),
                format_brl(s.npv_savings)
            ),
            Err(e) => println!("{:<24} error  {e}", unit.name),
        }
    }
    println!(
        "\nUnits: {} ok, {} failed | Total savings: {} | Total NPV: {}",
        report.succeeded(),
        report.failed(),
        format_brl(report.total_savings),
        format_brl(report.total_npv_savings)
    );

    if let Some(path) = &args.out {
        let file = std::fs::File::create(path).map_err(write_err(path))?;
        write_batch_csv(&report, io::BufWriter::new(file)).map_err(write_err(path))?;
        info!(path = %path.display(), "batch summary written");
    }
    Ok(())
}

/// Lists utilities, then subgroups, then the tariff history of one combination.
fn cmd_tariffs(args: &TariffsArgs) -> Result<(), CliError> {
    let table = TariffTable::from_path(&args.tariffs)?;
    let Some(utility) = &args.utility else {
        for name in table.utilities() {
            println!("{name}");
        }
        return Ok(());
    };

    let month = table.adjustment_month(utility).clamp(1, 12) as usize;
    println!("Utility:     {utility}");
    println!("Adjustment:  {}", MONTH_ABBREVIATIONS[month - 1]);
    let Some(subgroup) = &args.subgroup else {
        println!("Subgroups:   {}", table.subgroups(utility).join(", "));
        return Ok(());
    };

    let structures = match &args.modality {
        Some(name) => vec![name.parse::<TariffStructure>()?],
        None => table.modalities(utility, subgroup),
    };
    if structures.is_empty() {
        return Err(TariffError::Unresolved {
            utility: utility.clone(),
            subgroup: subgroup.clone(),
            modality: "-".to_string(),
        }
        .into());
    }

    for structure in structures {
        println!("\n{structure} ({})", structure.regulator_name());
        println!(
            "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "effective", "kW P", "kW FP", "TUSD P", "TUSD FP", "TE P", "TE FP"
        );
        for s in table.history(utility, subgroup, structure) {
            println!(
                "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                s.effective_date,
                s.tusd_kw_peak,
                s.tusd_kw_offpeak,
                s.tusd_mwh_peak,
                s.tusd_mwh_offpeak,
                s.te_peak,
                s.te_offpeak
            );
        }
    }
    Ok(())
}

fn cmd_presets() {
    for name in ScenarioConfig::PRESETS {
        println!("{name}");
    }
}

#[cfg(feature = "api")]
fn cmd_serve(args: &cli::ServeArgs) -> Result<(), CliError> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let scenario = load_source(&args.source)?;
    let result = run_scenario(&scenario)?;
    let state = Arc::new(acl_sim::api::AppState { scenario, result });
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(acl_sim::api::serve(state, addr))?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .compact()
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Compare(args) => cmd_compare(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Tariffs(args) => cmd_tariffs(args),
        Command::Presets => {
            cmd_presets();
            Ok(())
        }
        #[cfg(feature = "api")]
        Command::Serve(args) => cmd_serve(args),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
