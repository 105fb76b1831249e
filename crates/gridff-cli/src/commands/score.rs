use crate::cli::ScoreArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::input;
use crate::utils::progress::CliProgressHandler;
use gridff::core::forcefield::params::ParameterTable;
use gridff::engine::progress::ProgressReporter;
use gridff::workflows::score::{self, ScoreOptions, ScoreReport};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: ScoreArgs) -> Result<()> {
    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    println!("Scoring system {}...", args.input.display());
    let report = execute(&args, &reporter)?;

    print_report(&report);
    if handler.grids_declined() > 0 {
        warn!(
            "{} grid(s) were declined by the memory budget.",
            handler.grids_declined()
        );
    }

    if let Some(path) = &args.output {
        write_report(&report, path)?;
        println!("✓ Report written to: {}", path.display());
    }
    Ok(())
}

fn execute(args: &ScoreArgs, reporter: &ProgressReporter) -> Result<ScoreReport> {
    let config = config::build_config(args)?;

    info!("Loading parameters from {:?}", &args.params);
    let params = ParameterTable::load(&args.params)?;

    info!("Loading system from {:?}", &args.input);
    let molecule = input::read_system(&args.input)?;

    let options = ScoreOptions {
        aggregate: args.aggregate,
        per_atom: args.per_atom,
    };
    info!("Invoking the scoring workflow...");
    Ok(score::run(molecule, params, &config, &options, reporter)?)
}

fn write_report(report: &ScoreReport, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(report)
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to serialize report: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

fn print_report(report: &ScoreReport) {
    println!(
        "Atoms: {} ({} movable), terms: {} ({} grid)",
        report.atom_count, report.movable_count, report.term_count, report.grid_count
    );
    println!("  Total energy:       {:>14.4} kcal/mol", report.total_energy);
    println!("  Interaction energy: {:>14.4} kcal/mol", report.interaction_energy);
    println!("  Structure energy:   {:>14.4} kcal/mol", report.structure_energy);
    println!(
        "  Bonded {:.4} | Nonbonded {:.4} | Direct interaction {:.4} | Grid {:.4}",
        report.breakdown.bonded,
        report.breakdown.nonbonded,
        report.breakdown.interaction,
        report.breakdown.grid
    );
    println!("  RMS gradient:       {:>14.4} kcal/mol/Å", report.rms_gradient);

    if let Some(agg) = &report.aggregation {
        println!(
            "Aggregation: {} grid(s) built, {} shared, {} atom(s) kept direct, {:.1} MiB",
            agg.summary.grids_built,
            agg.summary.grids_shared,
            agg.summary.atoms_fallback,
            agg.summary.bytes_committed as f64 / (1024.0 * 1024.0)
        );
        println!(
            "  Energy before {:.4}, after {:.4} (deviation {:+.6})",
            agg.energy_before,
            agg.energy_after,
            agg.deviation()
        );
    }

    if !report.atoms.is_empty() {
        println!("Per-atom energies:");
        for atom in &report.atoms {
            println!("  {:>6} {:<6} {:>12.4}", atom.index, atom.name, atom.energy);
        }
    }
}
