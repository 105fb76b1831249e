use super::term::{EnergyTerm, TermKind};
use serde::Serialize;
use std::ops::{Add, AddAssign};

/// Energy split by the kind of term that produced it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyBreakdown {
    /// Bonds, angles and torsions.
    pub bonded: f64,
    /// Non-bonded pairs within one subsystem.
    pub nonbonded: f64,
    /// Direct (ungridded) extra-molecular terms.
    pub interaction: f64,
    /// Interpolated grid terms.
    pub grid: f64,
}

impl EnergyBreakdown {
    pub fn total(&self) -> f64 {
        self.bonded + self.nonbonded + self.interaction + self.grid
    }

    /// Adds `energy` produced by `term` to the matching component.
    pub fn record(&mut self, term: &EnergyTerm, energy: f64) {
        match term.kind() {
            TermKind::Bond | TermKind::Angle | TermKind::Torsion => self.bonded += energy,
            TermKind::Grid => self.grid += energy,
            _ if term.is_extra_molecular() => self.interaction += energy,
            _ => self.nonbonded += energy,
        }
    }
}

impl Add for EnergyBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            bonded: self.bonded + rhs.bonded,
            nonbonded: self.nonbonded + rhs.nonbonded,
            interaction: self.interaction + rhs.interaction,
            grid: self.grid + rhs.grid,
        }
    }
}

impl AddAssign for EnergyBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
