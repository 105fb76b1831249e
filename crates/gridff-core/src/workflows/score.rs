use crate::core::forcefield::params::ParameterProvider;
use crate::core::forcefield::scoring::EnergyBreakdown;
use crate::core::models::molecule::Molecule;
use crate::engine::aggregation::AggregationSummary;
use crate::engine::config::ForceFieldConfig;
use crate::engine::error::EngineError;
use crate::engine::forcefield::ForceField;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreOptions {
    /// Run the aggregation pass and report energies before and after it.
    pub aggregate: bool,
    /// Attribute energy to each movable atom.
    pub per_atom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomEnergy {
    pub index: usize,
    pub name: String,
    pub energy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregationComparison {
    pub energy_before: f64,
    pub energy_after: f64,
    pub summary: AggregationSummary,
}

impl AggregationComparison {
    pub fn deviation(&self) -> f64 {
        self.energy_after - self.energy_before
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub atom_count: usize,
    pub movable_count: usize,
    pub term_count: usize,
    pub grid_count: usize,
    pub total_energy: f64,
    pub interaction_energy: f64,
    pub structure_energy: f64,
    pub breakdown: EnergyBreakdown,
    /// Root mean square gradient norm over movable atoms.
    pub rms_gradient: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationComparison>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub atoms: Vec<AtomEnergy>,
}

#[instrument(skip_all, name = "score_workflow")]
pub fn run<P: ParameterProvider>(
    molecule: Molecule,
    params: P,
    config: &ForceFieldConfig,
    options: &ScoreOptions,
    reporter: &ProgressReporter,
) -> Result<ScoreReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Term Construction",
    });
    let mut forcefield = ForceField::new(molecule, params, config.clone())?;
    forcefield.init_with_progress(reporter)?;
    reporter.report(Progress::PhaseFinish);

    let aggregation = if options.aggregate {
        let energy_before = forcefield.total_energy()?;
        let summary = forcefield.aggregate_terms_with_progress(reporter)?;
        let energy_after = forcefield.total_energy()?;
        info!(
            "Aggregation changed the total energy by {:.6} kcal/mol",
            energy_after - energy_before
        );
        Some(AggregationComparison {
            energy_before,
            energy_after,
            summary,
        })
    } else {
        None
    };

    reporter.report(Progress::PhaseStart { name: "Scoring" });
    let (total_energy, gradient) = forcefield.energy_and_gradient()?;
    let interaction_energy = forcefield.interaction_energy()?;
    let structure_energy = forcefield.structure_energy()?;
    let breakdown = forcefield.energy_breakdown()?;

    let movable: Vec<usize> = forcefield
        .molecule()
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_movable)
        .map(|(i, _)| i)
        .collect();
    let rms_gradient = if movable.is_empty() {
        0.0
    } else {
        let sum_sq: f64 = movable.iter().map(|&i| gradient[i].norm_squared()).sum();
        (sum_sq / movable.len() as f64).sqrt()
    };

    let mut atoms = Vec::new();
    if options.per_atom {
        reporter.report(Progress::TaskStart {
            total_steps: movable.len() as u64,
        });
        for &index in &movable {
            let energy = forcefield.energy_for_atom(index, true, true)?;
            let name = forcefield.molecule().atoms()[index].name.clone();
            atoms.push(AtomEnergy {
                index,
                name,
                energy,
            });
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
    }
    reporter.report(Progress::PhaseFinish);

    let terms = forcefield.terms()?;
    let (term_count, grid_count) = (terms.len(), terms.grid_count());
    let molecule = forcefield.molecule();

    info!(
        "Scored {} atoms: total {:.4}, interaction {:.4}, structure {:.4}",
        molecule.atom_count(),
        total_energy,
        interaction_energy,
        structure_energy
    );

    Ok(ScoreReport {
        atom_count: molecule.atom_count(),
        movable_count: movable.len(),
        term_count,
        grid_count,
        total_energy,
        interaction_energy,
        structure_energy,
        breakdown,
        rms_gradient,
        aggregation,
        atoms,
    })
}
