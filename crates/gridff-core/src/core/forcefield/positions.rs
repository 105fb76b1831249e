use crate::core::models::atom::Atom;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;

/// Read-only view of atom coordinates used by energy terms.
///
/// A view may carry a probe: one atom reported at a substitute position. Grid cells
/// are populated through a probed view, so the molecule itself is never moved while
/// sampling.
#[derive(Debug, Clone, Copy)]
pub struct Positions<'a> {
    atoms: &'a [Atom],
    probe: Option<(usize, Point3<f64>)>,
}

impl<'a> Positions<'a> {
    pub fn new(molecule: &'a Molecule) -> Self {
        Self::from_atoms(molecule.atoms())
    }

    pub fn from_atoms(atoms: &'a [Atom]) -> Self {
        Self { atoms, probe: None }
    }

    /// Returns a view in which `atom` sits at `position` and every other atom is unchanged.
    pub fn with_probe(&self, atom: usize, position: Point3<f64>) -> Self {
        Self {
            atoms: self.atoms,
            probe: Some((atom, position)),
        }
    }

    /// Position of atom `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; term atom indices are validated when terms
    /// enter a term list.
    #[inline]
    pub fn get(&self, index: usize) -> Point3<f64> {
        match self.probe {
            Some((atom, position)) if atom == index => position,
            _ => self.atoms[index].position,
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::CARBON;

    fn two_atoms() -> Molecule {
        let mut molecule = Molecule::new();
        molecule.add_atom(Atom::new("A", CARBON, Point3::new(0.0, 0.0, 0.0)));
        molecule.add_atom(Atom::new("B", CARBON, Point3::new(1.0, 0.0, 0.0)));
        molecule
    }

    #[test]
    fn get_returns_molecule_positions() {
        let molecule = two_atoms();
        let positions = Positions::new(&molecule);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions.get(1), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn probe_overrides_only_the_probed_atom() {
        let molecule = two_atoms();
        let probed = Positions::new(&molecule).with_probe(0, Point3::new(5.0, 5.0, 5.0));

        assert_eq!(probed.get(0), Point3::new(5.0, 5.0, 5.0));
        assert_eq!(probed.get(1), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(molecule.atom(0).unwrap().position, Point3::origin());
    }
}
