//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "acl-sim")]
#[command(version, about = "Regulated (ACR) vs free-market (ACL) electricity cost simulator")]
#[command(
    long_about = "Projects regulated tariffs over a contract period and compares the monthly cost \
    of staying in the regulated market with a free-market supplier offer.\n\
    \nExamples:\n  \
    acl-sim simulate                                  # Baseline preset\n  \
    acl-sim simulate --scenario scenarios/plant.toml --json\n  \
    acl-sim compare scenarios/baseline.toml scenarios/incentivized.toml\n  \
    acl-sim batch --units units.csv --tariffs tarifas.csv --out summary.csv\n  \
    acl-sim tariffs --tariffs tarifas.csv --utility CEMIG-D --subgroup A4"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scenario and print its savings report
    Simulate(SimulateArgs),

    /// Run two scenarios and print their differences
    Compare(CompareArgs),

    /// Simulate every consumer unit listed in a CSV file
    Batch(BatchArgs),

    /// Browse a regulator tariff table
    Tariffs(TariffsArgs),

    /// List the built-in presets
    Presets,

    /// Run a scenario and serve its results over HTTP
    #[cfg(feature = "api")]
    Serve(ServeArgs),
}

/// Where a scenario comes from: a TOML file, a preset, or the baseline default.
#[derive(Debug, Args)]
pub struct ScenarioSource {
    /// Scenario TOML file
    #[arg(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset name (see `acl-sim presets`)
    #[arg(long)]
    pub preset: Option<String>,

    /// Regulator tariff table (`;`-separated CSV); resolves the scenario's
    /// `tariff.utility` and `tariff.subgroup`
    #[arg(long, env = "ACL_SIM_TARIFFS")]
    pub tariffs: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub source: ScenarioSource,

    /// Print one line per contract month
    #[arg(long, default_value_t = false)]
    pub monthly: bool,

    /// Write monthly rows to this CSV file
    #[arg(long)]
    pub monthly_out: Option<PathBuf>,

    /// Write annual rows to this CSV file
    #[arg(long)]
    pub annual_out: Option<PathBuf>,

    /// Print the full result as JSON instead of the text report
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First scenario: a TOML file or a preset name
    pub a: String,

    /// Second scenario: a TOML file or a preset name
    pub b: String,

    /// Regulator tariff table used by both scenarios
    #[arg(long, env = "ACL_SIM_TARIFFS")]
    pub tariffs: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Units CSV, one consumer unit per row
    #[arg(long)]
    pub units: PathBuf,

    /// Regulator tariff table (`;`-separated CSV)
    #[arg(long, env = "ACL_SIM_TARIFFS")]
    pub tariffs: PathBuf,

    /// Write the per-unit summary to this CSV file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Without `--utility` lists utilities; without `--subgroup` lists subgroups.
#[derive(Debug, Args)]
pub struct TariffsArgs {
    /// Regulator tariff table (`;`-separated CSV)
    #[arg(long, env = "ACL_SIM_TARIFFS")]
    pub tariffs: PathBuf,

    #[arg(long)]
    pub utility: Option<String>,

    #[arg(long, requires = "utility")]
    pub subgroup: Option<String>,

    /// Blue/Green (or Azul/Verde); all published modalities when omitted
    #[arg(long, requires = "subgroup")]
    pub modality: Option<String>,
}

#[cfg(feature = "api")]
#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: ScenarioSource,

    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}
