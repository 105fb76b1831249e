use super::error::EngineError;
use crate::core::forcefield::positions::Positions;
use crate::core::forcefield::scoring::EnergyBreakdown;
use crate::core::forcefield::term::{EnergyTerm, TermKind};
use crate::core::models::molecule::Molecule;
use nalgebra::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The energy terms of one molecule.
///
/// Terms live in two collections: plain terms (structural terms and grid terms) and
/// pairwise terms (direct extra-molecular terms, the candidates for aggregation).
/// Atom indices are checked against the molecule when a term is pushed.
#[derive(Debug, Clone, Default)]
pub struct TermList {
    terms: Vec<EnergyTerm>,
    pairwise: Vec<EnergyTerm>,
    atom_count: usize,
    committed_grid_bytes: usize,
}

impl TermList {
    pub fn new(atom_count: usize) -> Self {
        Self {
            atom_count,
            ..Self::default()
        }
    }

    /// Adds a term after checking its atom indices.
    pub fn push(&mut self, term: EnergyTerm) -> Result<(), EngineError> {
        if let Some(&index) = term.atoms().iter().find(|&&i| i >= self.atom_count) {
            return Err(EngineError::AtomIndexOutOfRange {
                index,
                atom_count: self.atom_count,
            });
        }
        if term.is_extra_molecular() && term.kind() != TermKind::Grid {
            self.pairwise.push(term);
        } else {
            self.terms.push(term);
        }
        Ok(())
    }

    pub(crate) fn push_plain(&mut self, term: EnergyTerm) {
        self.terms.push(term);
    }

    pub(crate) fn push_pairwise(&mut self, term: EnergyTerm) {
        self.pairwise.push(term);
    }

    pub(crate) fn take_pairwise(&mut self) -> Vec<EnergyTerm> {
        std::mem::take(&mut self.pairwise)
    }

    pub(crate) fn commit_grid_bytes(&mut self, bytes: usize) {
        self.committed_grid_bytes += bytes;
    }

    pub fn terms(&self) -> &[EnergyTerm] {
        &self.terms
    }

    pub fn pairwise(&self) -> &[EnergyTerm] {
        &self.pairwise
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnergyTerm> {
        self.terms.iter().chain(self.pairwise.iter())
    }

    pub fn len(&self) -> usize {
        self.terms.len() + self.pairwise.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    /// Grid memory committed by every aggregation pass run on this list so far.
    pub fn committed_grid_bytes(&self) -> usize {
        self.committed_grid_bytes
    }

    pub fn grid_count(&self) -> usize {
        self.terms
            .iter()
            .filter(|t| t.kind() == TermKind::Grid)
            .count()
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.pairwise.clear();
        self.committed_grid_bytes = 0;
    }

    fn sum_where<F>(&self, molecule: &Molecule, filter: F) -> f64
    where
        F: Fn(&EnergyTerm) -> bool + Sync,
    {
        let positions = Positions::new(molecule);

        #[cfg(not(feature = "parallel"))]
        let sum = self
            .iter()
            .filter(|t| filter(t))
            .map(|t| t.energy(&positions))
            .sum();

        #[cfg(feature = "parallel")]
        let sum = self
            .terms
            .par_iter()
            .chain(self.pairwise.par_iter())
            .filter(|t| filter(t))
            .map(|t| t.energy(&positions))
            .sum();

        sum
    }

    pub fn total_energy(&self, molecule: &Molecule) -> f64 {
        self.sum_where(molecule, |_| true)
    }

    /// Sum over extra-molecular terms, grid terms included.
    pub fn interaction_energy(&self, molecule: &Molecule) -> f64 {
        self.sum_where(molecule, EnergyTerm::is_extra_molecular)
    }

    /// Sum over structural terms whose first atom is a ligand atom.
    pub fn structure_energy(&self, molecule: &Molecule) -> f64 {
        let atoms = molecule.atoms();
        self.sum_where(molecule, |t| {
            !t.is_extra_molecular() && t.atoms().first().is_some_and(|&i| atoms[i].is_ligand())
        })
    }

    /// Energy attributed to `atom`.
    ///
    /// Every selected term that references the atom contributes its energy divided by
    /// the number of real (heavy ligand) atoms it touches, or by one if it touches none.
    pub fn energy_for_atom(
        &self,
        molecule: &Molecule,
        atom: usize,
        include_intra: bool,
        include_inter: bool,
    ) -> f64 {
        let atoms = molecule.atoms();
        let positions = Positions::new(molecule);
        self.iter()
            .filter(|t| {
                if t.is_extra_molecular() {
                    include_inter
                } else {
                    include_intra
                }
            })
            .filter(|t| t.atoms().contains(&atom))
            .map(|t| {
                let real = t.atoms().iter().filter(|&&i| atoms[i].is_real()).count();
                t.energy(&positions) / real.max(1) as f64
            })
            .sum()
    }

    pub fn breakdown(&self, molecule: &Molecule) -> EnergyBreakdown {
        let positions = Positions::new(molecule);
        let mut breakdown = EnergyBreakdown::default();
        for term in self.iter() {
            breakdown.record(term, term.energy(&positions));
        }
        breakdown
    }

    /// Total energy, adding every term's gradient into `gradient`.
    ///
    /// `gradient` must hold one entry per atom and is not cleared first.
    pub fn energy_and_gradient(&self, molecule: &Molecule, gradient: &mut [Vector3<f64>]) -> f64 {
        let positions = Positions::new(molecule);

        #[cfg(not(feature = "parallel"))]
        let energy = self
            .iter()
            .map(|t| t.evaluate(&positions, Some(&mut *gradient)))
            .sum();

        #[cfg(feature = "parallel")]
        let energy = {
            let n = gradient.len();
            let (energy, partial) = self
                .terms
                .par_iter()
                .chain(self.pairwise.par_iter())
                .fold(
                    || (0.0, vec![Vector3::zeros(); n]),
                    |(sum, mut buffer), term| {
                        let e = term.evaluate(&positions, Some(buffer.as_mut_slice()));
                        (sum + e, buffer)
                    },
                )
                .reduce(
                    || (0.0, vec![Vector3::zeros(); n]),
                    |(ea, mut a), (eb, b)| {
                        for (x, y) in a.iter_mut().zip(b) {
                            *x += y;
                        }
                        (ea + eb, a)
                    },
                );
            for (g, p) in gradient.iter_mut().zip(partial) {
                *g += p;
            }
            energy
        };

        energy
    }
}
