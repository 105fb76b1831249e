use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "gridff - score molecular systems with a force field whose receptor interactions can be cached on interpolation grids.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel energy evaluation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the energy terms of a system and report its energies and gradient.
    Score(ScoreArgs),
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    // --- Core Arguments ---
    /// Path to the system file (TOML with `[[atoms]]` and `bonds`).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the force-field parameter table in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub params: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the score report as TOML to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Term Construction Overrides ---
    /// Build terms for hydrogen atoms as well.
    #[arg(long)]
    pub include_hydrogens: bool,

    /// Use plain pair terms instead of protein-ligand contact terms.
    #[arg(long)]
    pub no_protein_ligand: bool,

    /// Add superposition terms between ligand and template atoms.
    #[arg(long)]
    pub superpose: bool,

    /// Override the nonbonded cutoff distance, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    // --- Aggregation ---
    /// Replace receptor interactions by interpolation grids before scoring.
    #[arg(short, long)]
    pub aggregate: bool,

    /// Override the grid memory budget, in MiB.
    #[arg(long, value_name = "MIB")]
    pub memory_budget_mb: Option<usize>,

    // --- Reporting ---
    /// Report the attributed energy of every movable atom.
    #[arg(long)]
    pub per_atom: bool,

    /// Set a configuration value, overriding the config file.
    /// Example: -S aggregation.memory-budget-mb=256
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub set_values: Vec<String>,
}
