use super::grid::GridTerm;
use super::params::{AngleParam, BondParam, ContactParam, SuperposeParam, TorsionParam};
use super::positions::Positions;
use super::potentials;
use crate::core::utils::geometry::{angle_with_derivatives, dihedral_with_derivatives};
use nalgebra::{Point3, Vector3};
use std::fmt;

/// Largest number of atoms any term depends on (torsions).
pub const MAX_TERM_ATOMS: usize = 4;

/// Per-atom energy derivatives of one term, in the order of [`EnergyTerm::atoms`].
/// Slots past the term's atom count are zero.
pub type AtomGradients = [Vector3<f64>; MAX_TERM_ATOMS];

const ZERO_GRADIENTS: AtomGradients = [Vector3::new(0.0, 0.0, 0.0); MAX_TERM_ATOMS];
const MIN_PAIR_DISTANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKind {
    Bond,
    Angle,
    Torsion,
    VanDerWaals,
    ProteinLigand,
    Superpose,
    Grid,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bond => "bond",
            Self::Angle => "angle",
            Self::Torsion => "torsion",
            Self::VanDerWaals => "van-der-waals",
            Self::ProteinLigand => "protein-ligand",
            Self::Superpose => "superpose",
            Self::Grid => "grid",
        };
        f.write_str(name)
    }
}

/// Spreads a radial derivative `dE/dr` of the pair (i, j) onto both atoms.
fn pair_gradients(pi: &Point3<f64>, pj: &Point3<f64>, d_energy: f64) -> AtomGradients {
    let delta = pi - pj;
    let dist = delta.norm();
    let mut grads = ZERO_GRADIENTS;
    if dist > MIN_PAIR_DISTANCE {
        let g = delta * (d_energy / dist);
        grads[0] = g;
        grads[1] = -g;
    }
    grads
}

/// Harmonic bond stretch.
#[derive(Debug, Clone, PartialEq)]
pub struct BondTerm {
    atoms: [usize; 2],
    param: BondParam,
}

impl BondTerm {
    pub fn new(a: usize, b: usize, param: BondParam) -> Self {
        Self {
            atoms: [a, b],
            param,
        }
    }

    fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let (pa, pb) = (positions.get(self.atoms[0]), positions.get(self.atoms[1]));
        let (energy, d_energy) = potentials::harmonic(
            (pa - pb).norm(),
            self.param.equilibrium_length,
            self.param.force_constant,
        );
        (energy, pair_gradients(&pa, &pb, d_energy))
    }
}

/// Harmonic valence angle bend around the middle atom.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleTerm {
    atoms: [usize; 3],
    force_constant: f64,
    equilibrium: f64,
}

impl AngleTerm {
    pub fn new(a: usize, vertex: usize, c: usize, param: AngleParam) -> Self {
        Self {
            atoms: [a, vertex, c],
            force_constant: param.force_constant,
            equilibrium: param.equilibrium_angle.to_radians(),
        }
    }

    fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let [a, b, c] = self.atoms.map(|i| positions.get(i));
        let (theta, derivatives) = angle_with_derivatives(&a, &b, &c);
        let (energy, d_energy) = potentials::harmonic(theta, self.equilibrium, self.force_constant);
        let mut grads = ZERO_GRADIENTS;
        for (slot, d) in derivatives.iter().enumerate() {
            grads[slot] = d * d_energy;
        }
        (energy, grads)
    }
}

/// Three-term Fourier torsion around the central bond.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionTerm {
    atoms: [usize; 4],
    param: TorsionParam,
}

impl TorsionTerm {
    pub fn new(atoms: [usize; 4], param: TorsionParam) -> Self {
        Self { atoms, param }
    }

    fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let [i, j, k, l] = self.atoms.map(|idx| positions.get(idx));
        let (phi, derivatives) = dihedral_with_derivatives(&i, &j, &k, &l);
        let p = &self.param;
        let (energy, d_energy) = potentials::fourier_torsion(phi, p.v1, p.v2, p.v3);
        (energy, derivatives.map(|d| d * d_energy))
    }
}

/// Lennard-Jones 12-6 plus Coulomb pair.
///
/// Used both inside one subsystem and, flagged extra-molecular, between subsystems
/// when dedicated protein-ligand terms are disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTerm {
    atoms: [usize; 2],
    r_min: f64,
    well_depth: f64,
    charge_product: f64,
    dielectric: f64,
    extra_molecular: bool,
}

impl PairTerm {
    pub fn new(
        atoms: [usize; 2],
        r_min: f64,
        well_depth: f64,
        charge_product: f64,
        dielectric: f64,
        extra_molecular: bool,
    ) -> Self {
        Self {
            atoms,
            r_min,
            well_depth,
            charge_product,
            dielectric,
            extra_molecular,
        }
    }

    fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let (pi, pj) = (positions.get(self.atoms[0]), positions.get(self.atoms[1]));
        let dist = (pi - pj).norm();
        let (e_vdw, d_vdw) = potentials::lennard_jones_12_6(dist, self.r_min, self.well_depth);
        let (e_elec, d_elec) = if self.charge_product == 0.0 {
            (0.0, 0.0)
        } else {
            potentials::coulomb(dist, self.charge_product, self.dielectric)
        };
        (e_vdw + e_elec, pair_gradients(&pi, &pj, d_vdw + d_elec))
    }
}

/// Ligand atom / receptor atom contact. The ligand atom always comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactTerm {
    atoms: [usize; 2],
    param: ContactParam,
    charge_product: f64,
    dielectric: f64,
}

impl ContactTerm {
    pub fn new(
        ligand_atom: usize,
        receptor_atom: usize,
        param: ContactParam,
        charge_product: f64,
        dielectric: f64,
    ) -> Self {
        Self {
            atoms: [ligand_atom, receptor_atom],
            param,
            charge_product,
            dielectric,
        }
    }

    fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let (pl, pr) = (positions.get(self.atoms[0]), positions.get(self.atoms[1]));
        let dist = (pl - pr).norm();
        let (e_vdw, d_vdw) =
            potentials::lennard_jones_12_6(dist, self.param.radius, self.param.well_depth);
        let (e_elec, d_elec) = potentials::coulomb(dist, self.charge_product, self.dielectric);
        (e_vdw + e_elec, pair_gradients(&pl, &pr, d_vdw + d_elec))
    }
}

/// Gaussian attraction of a ligand atom towards a template atom.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperposeTerm {
    atoms: [usize; 2],
    param: SuperposeParam,
}

impl SuperposeTerm {
    pub fn new(ligand_atom: usize, template_atom: usize, param: SuperposeParam) -> Self {
        Self {
            atoms: [ligand_atom, template_atom],
            param,
        }
    }

    fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let (pl, pt) = (positions.get(self.atoms[0]), positions.get(self.atoms[1]));
        let (energy, d_energy) =
            potentials::gaussian_overlap((pl - pt).norm(), self.param.weight, self.param.alpha);
        (energy, pair_gradients(&pl, &pt, d_energy))
    }
}

/// One interaction of the force field over a fixed, small set of atoms.
///
/// Every variant shares the same capability: compute a scalar energy and, on request,
/// add its per-atom gradient into a caller-owned buffer.
#[derive(Debug, Clone)]
pub enum EnergyTerm {
    Bond(BondTerm),
    Angle(AngleTerm),
    Torsion(TorsionTerm),
    VanDerWaals(PairTerm),
    ProteinLigand(ContactTerm),
    Superpose(SuperposeTerm),
    Grid(GridTerm),
}

impl EnergyTerm {
    pub fn kind(&self) -> TermKind {
        match self {
            Self::Bond(_) => TermKind::Bond,
            Self::Angle(_) => TermKind::Angle,
            Self::Torsion(_) => TermKind::Torsion,
            Self::VanDerWaals(_) => TermKind::VanDerWaals,
            Self::ProteinLigand(_) => TermKind::ProteinLigand,
            Self::Superpose(_) => TermKind::Superpose,
            Self::Grid(_) => TermKind::Grid,
        }
    }

    /// The atoms this term depends on, in a fixed order.
    pub fn atoms(&self) -> &[usize] {
        match self {
            Self::Bond(t) => &t.atoms,
            Self::Angle(t) => &t.atoms,
            Self::Torsion(t) => &t.atoms,
            Self::VanDerWaals(t) => &t.atoms,
            Self::ProteinLigand(t) => &t.atoms,
            Self::Superpose(t) => &t.atoms,
            Self::Grid(t) => t.atoms(),
        }
    }

    fn atoms_mut(&mut self) -> Option<&mut [usize]> {
        match self {
            Self::Bond(t) => Some(&mut t.atoms),
            Self::Angle(t) => Some(&mut t.atoms),
            Self::Torsion(t) => Some(&mut t.atoms),
            Self::VanDerWaals(t) => Some(&mut t.atoms),
            Self::ProteinLigand(t) => Some(&mut t.atoms),
            Self::Superpose(t) => Some(&mut t.atoms),
            Self::Grid(_) => None,
        }
    }

    /// A copy of this term acting on atom `to` wherever it acted on atom `from`.
    ///
    /// Grid terms are returned unchanged.
    pub fn with_atom_replaced(&self, from: usize, to: usize) -> EnergyTerm {
        let mut term = self.clone();
        if let Some(atoms) = term.atoms_mut() {
            for atom in atoms.iter_mut().filter(|a| **a == from) {
                *atom = to;
            }
        }
        term
    }

    /// True for terms acting between two molecular subsystems (e.g. ligand and receptor).
    pub fn is_extra_molecular(&self) -> bool {
        match self {
            Self::Bond(_) | Self::Angle(_) | Self::Torsion(_) => false,
            Self::VanDerWaals(t) => t.extra_molecular,
            Self::ProteinLigand(_) | Self::Superpose(_) | Self::Grid(_) => true,
        }
    }

    /// Energy and per-atom gradients at the given coordinates.
    pub fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        match self {
            Self::Bond(t) => t.compute(positions),
            Self::Angle(t) => t.compute(positions),
            Self::Torsion(t) => t.compute(positions),
            Self::VanDerWaals(t) => t.compute(positions),
            Self::ProteinLigand(t) => t.compute(positions),
            Self::Superpose(t) => t.compute(positions),
            Self::Grid(t) => t.compute(positions),
        }
    }

    /// Returns the energy and, if a buffer is supplied, adds this term's gradient into
    /// the slots of its atoms. The buffer is never cleared here.
    ///
    /// The returned energy does not depend on whether a buffer was given.
    pub fn evaluate(&self, positions: &Positions, gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let (energy, grads) = self.compute(positions);
        if let Some(buffer) = gradient {
            for (&atom, g) in self.atoms().iter().zip(grads.iter()) {
                buffer[atom] += g;
            }
        }
        energy
    }

    pub fn energy(&self, positions: &Positions) -> f64 {
        self.evaluate(positions, None)
    }
}

impl From<BondTerm> for EnergyTerm {
    fn from(term: BondTerm) -> Self {
        Self::Bond(term)
    }
}

impl From<AngleTerm> for EnergyTerm {
    fn from(term: AngleTerm) -> Self {
        Self::Angle(term)
    }
}

impl From<TorsionTerm> for EnergyTerm {
    fn from(term: TorsionTerm) -> Self {
        Self::Torsion(term)
    }
}

impl From<PairTerm> for EnergyTerm {
    fn from(term: PairTerm) -> Self {
        Self::VanDerWaals(term)
    }
}

impl From<ContactTerm> for EnergyTerm {
    fn from(term: ContactTerm) -> Self {
        Self::ProteinLigand(term)
    }
}

impl From<SuperposeTerm> for EnergyTerm {
    fn from(term: SuperposeTerm) -> Self {
        Self::Superpose(term)
    }
}

impl From<GridTerm> for EnergyTerm {
    fn from(term: GridTerm) -> Self {
        Self::Grid(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, CARBON};
    use crate::core::models::molecule::Molecule;

    fn molecule_at(points: &[[f64; 3]]) -> Molecule {
        let mut molecule = Molecule::new();
        for (i, p) in points.iter().enumerate() {
            molecule.add_atom(Atom::new(&format!("A{i}"), CARBON, Point3::from(*p)));
        }
        molecule
    }

    fn sample_terms() -> Vec<EnergyTerm> {
        vec![
            BondTerm::new(
                0,
                1,
                BondParam {
                    force_constant: 300.0,
                    equilibrium_length: 1.5,
                },
            )
            .into(),
            AngleTerm::new(
                0,
                1,
                2,
                AngleParam {
                    force_constant: 40.0,
                    equilibrium_angle: 109.5,
                },
            )
            .into(),
            TorsionTerm::new(
                [0, 1, 2, 3],
                TorsionParam {
                    v1: 0.3,
                    v2: -0.4,
                    v3: 1.1,
                },
            )
            .into(),
            PairTerm::new([0, 3], 3.8, 0.1, -0.12, 4.0, false).into(),
            ContactTerm::new(
                0,
                2,
                ContactParam {
                    radius: 3.5,
                    well_depth: 0.2,
                },
                0.3,
                4.0,
            )
            .into(),
            SuperposeTerm::new(
                3,
                1,
                SuperposeParam {
                    weight: 1.0,
                    alpha: 0.5,
                },
            )
            .into(),
        ]
    }

    fn skewed_molecule() -> Molecule {
        molecule_at(&[
            [1.1, 0.9, -0.2],
            [0.0, 0.1, 0.0],
            [0.2, -0.1, 1.6],
            [-0.8, 0.6, 2.3],
        ])
    }

    #[test]
    fn evaluate_returns_same_energy_with_and_without_gradient_buffer() {
        let molecule = skewed_molecule();
        let positions = Positions::new(&molecule);
        for term in sample_terms() {
            let mut buffer = vec![Vector3::zeros(); molecule.atom_count()];
            let without = term.evaluate(&positions, None);
            let with = term.evaluate(&positions, Some(&mut buffer));
            assert_eq!(without.to_bits(), with.to_bits(), "{}", term.kind());
        }
    }

    #[test]
    fn evaluate_adds_into_existing_gradient_buffer() {
        let molecule = skewed_molecule();
        let positions = Positions::new(&molecule);
        let term = &sample_terms()[0];

        let mut fresh = vec![Vector3::zeros(); 4];
        term.evaluate(&positions, Some(&mut fresh));

        let mut accumulated = vec![Vector3::new(1.0, 1.0, 1.0); 4];
        term.evaluate(&positions, Some(&mut accumulated));

        for atom in 0..4 {
            assert_eq!(accumulated[atom], fresh[atom] + Vector3::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn analytic_gradients_match_finite_differences() {
        let molecule = skewed_molecule();
        let h = 1e-6;
        for term in sample_terms() {
            let mut analytic = vec![Vector3::zeros(); molecule.atom_count()];
            term.evaluate(&Positions::new(&molecule), Some(&mut analytic));

            for &atom in term.atoms() {
                for axis in 0..3 {
                    let mut plus = molecule.clone();
                    let mut minus = molecule.clone();
                    plus.atom_mut(atom).unwrap().position[axis] += h;
                    minus.atom_mut(atom).unwrap().position[axis] -= h;
                    let numeric = (term.energy(&Positions::new(&plus))
                        - term.energy(&Positions::new(&minus)))
                        / (2.0 * h);
                    assert!(
                        (numeric - analytic[atom][axis]).abs() < 1e-4,
                        "{} atom {} axis {}: numeric {} analytic {}",
                        term.kind(),
                        atom,
                        axis,
                        numeric,
                        analytic[atom][axis]
                    );
                }
            }
        }
    }

    #[test]
    fn extra_molecular_classification_follows_term_kind() {
        let terms = sample_terms();
        let flags: Vec<bool> = terms.iter().map(EnergyTerm::is_extra_molecular).collect();
        assert_eq!(flags, vec![false, false, false, false, true, true]);

        let inter: EnergyTerm = PairTerm::new([0, 1], 3.0, 0.1, 0.0, 4.0, true).into();
        assert!(inter.is_extra_molecular());
    }

    #[test]
    fn atoms_are_reported_in_declaration_order() {
        let terms = sample_terms();
        assert_eq!(terms[1].atoms(), &[0, 1, 2]);
        assert_eq!(terms[2].atoms(), &[0, 1, 2, 3]);
        assert_eq!(terms[4].atoms(), &[0, 2]);
    }

    #[test]
    fn replaced_atom_takes_over_the_term() {
        let mut molecule = skewed_molecule();
        molecule.add_atom(Atom::new("A4", CARBON, Point3::new(1.1, 0.9, -0.2)));
        let positions = Positions::new(&molecule);
        let contact = &sample_terms()[4];

        let moved = contact.with_atom_replaced(0, 4);

        assert_eq!(moved.atoms(), &[4, 2]);
        assert_eq!(contact.atoms(), &[0, 2]);
        assert_eq!(
            moved.energy(&positions).to_bits(),
            contact.energy(&positions).to_bits()
        );
        assert_eq!(sample_terms()[0].with_atom_replaced(3, 4).atoms(), &[0, 1]);
    }

    #[test]
    fn bond_at_equilibrium_has_zero_energy_and_gradient() {
        let molecule = molecule_at(&[[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]]);
        let term: EnergyTerm = BondTerm::new(
            0,
            1,
            BondParam {
                force_constant: 300.0,
                equilibrium_length: 1.5,
            },
        )
        .into();
        let mut buffer = vec![Vector3::zeros(); 2];
        let energy = term.evaluate(&Positions::new(&molecule), Some(&mut buffer));
        assert_eq!(energy, 0.0);
        assert_eq!(buffer[0].norm(), 0.0);
    }
}
