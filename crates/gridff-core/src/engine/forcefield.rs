use super::aggregation::{self, AggregationSummary};
use super::builder::build_terms;
use super::config::{ForceFieldConfig, TermListMode};
use super::error::EngineError;
use super::progress::ProgressReporter;
use super::term_list::TermList;
use crate::core::forcefield::params::ParameterProvider;
use crate::core::forcefield::scoring::EnergyBreakdown;
use crate::core::models::molecule::Molecule;
use nalgebra::Vector3;
use tracing::info;

/// Largest molecule the engine accepts.
pub const MAX_ATOM_COUNT: usize = 100_000;

/// A molecule together with its parameters and lazily built term list.
///
/// Energy queries build the term list on first use. Coordinates may be changed
/// through [`ForceField::molecule_mut`] between queries; after a topology change,
/// call [`ForceField::init`] to rebuild the terms.
pub struct ForceField<P: ParameterProvider> {
    molecule: Molecule,
    params: P,
    config: ForceFieldConfig,
    terms: Option<TermList>,
}

impl<P: ParameterProvider> ForceField<P> {
    pub fn new(
        molecule: Molecule,
        params: P,
        config: ForceFieldConfig,
    ) -> Result<Self, EngineError> {
        let count = molecule.atom_count();
        if count > MAX_ATOM_COUNT {
            return Err(EngineError::TooManyAtoms {
                count,
                limit: MAX_ATOM_COUNT,
            });
        }
        Ok(Self {
            molecule,
            params,
            config,
            terms: None,
        })
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn molecule_mut(&mut self) -> &mut Molecule {
        &mut self.molecule
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn config(&self) -> &ForceFieldConfig {
        &self.config
    }

    pub fn into_molecule(self) -> Molecule {
        self.molecule
    }

    fn build_term_list(&self, reporter: &ProgressReporter) -> Result<TermList, EngineError> {
        let mut list = build_terms(&self.molecule, &self.params, &self.config)?;
        info!(
            "Built term list for {} atoms ({} movable): {} terms",
            self.molecule.atom_count(),
            self.molecule.movable_count(),
            list.len()
        );
        if self.config.term_list == TermListMode::Aggregated {
            aggregation::aggregate(
                &mut list,
                &self.molecule,
                &self.config.aggregation,
                self.config.nonbonded_cutoff,
                reporter,
            );
        }
        Ok(list)
    }

    fn prepared(&mut self) -> Result<(&mut TermList, &Molecule), EngineError> {
        let list = match self.terms.take() {
            Some(list) => list,
            None => self.build_term_list(&ProgressReporter::new())?,
        };
        Ok((self.terms.insert(list), &self.molecule))
    }

    /// Discards any existing terms and rebuilds them from the molecule.
    pub fn init(&mut self) -> Result<&TermList, EngineError> {
        self.init_with_progress(&ProgressReporter::new())
    }

    pub fn init_with_progress(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<&TermList, EngineError> {
        self.terms = None;
        let list = self.build_term_list(reporter)?;
        Ok(self.terms.insert(list))
    }

    /// The term list, built on first access.
    pub fn terms(&mut self) -> Result<&TermList, EngineError> {
        let (list, _) = self.prepared()?;
        Ok(list)
    }

    /// Runs the grid aggregation pass over the current term list.
    pub fn aggregate_terms(&mut self) -> Result<AggregationSummary, EngineError> {
        self.aggregate_terms_with_progress(&ProgressReporter::new())
    }

    pub fn aggregate_terms_with_progress(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<AggregationSummary, EngineError> {
        let config = self.config.aggregation.clone();
        let cutoff = self.config.nonbonded_cutoff;
        let (list, molecule) = self.prepared()?;
        Ok(aggregation::aggregate(list, molecule, &config, cutoff, reporter))
    }

    pub fn total_energy(&mut self) -> Result<f64, EngineError> {
        let (list, molecule) = self.prepared()?;
        Ok(list.total_energy(molecule))
    }

    /// Total energy and a freshly computed per-atom gradient.
    pub fn energy_and_gradient(&mut self) -> Result<(f64, Vec<Vector3<f64>>), EngineError> {
        let (list, molecule) = self.prepared()?;
        let mut gradient = vec![Vector3::zeros(); molecule.atom_count()];
        let energy = list.energy_and_gradient(molecule, &mut gradient);
        Ok((energy, gradient))
    }

    pub fn interaction_energy(&mut self) -> Result<f64, EngineError> {
        let (list, molecule) = self.prepared()?;
        Ok(list.interaction_energy(molecule))
    }

    pub fn structure_energy(&mut self) -> Result<f64, EngineError> {
        let (list, molecule) = self.prepared()?;
        Ok(list.structure_energy(molecule))
    }

    pub fn energy_for_atom(
        &mut self,
        atom: usize,
        include_intra: bool,
        include_inter: bool,
    ) -> Result<f64, EngineError> {
        let (list, molecule) = self.prepared()?;
        if atom >= molecule.atom_count() {
            return Err(EngineError::AtomIndexOutOfRange {
                index: atom,
                atom_count: molecule.atom_count(),
            });
        }
        Ok(list.energy_for_atom(molecule, atom, include_intra, include_inter))
    }

    pub fn energy_breakdown(&mut self) -> Result<EnergyBreakdown, EngineError> {
        let (list, molecule) = self.prepared()?;
        Ok(list.breakdown(molecule))
    }
}
