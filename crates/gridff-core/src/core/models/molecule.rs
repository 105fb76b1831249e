use super::atom::Atom;
use super::topology::Bond;
use crate::core::utils::geometry::BoundingBox;
use nalgebra::Point3;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Atom index {index} is out of range (molecule has {atom_count} atoms)")]
    AtomNotFound { index: usize, atom_count: usize },
    #[error("An atom cannot be bonded to itself (atom {0})")]
    SelfBond(usize),
}

/// An indexed collection of atoms and their covalent bonds.
///
/// Atoms are addressed by their insertion index, which stays stable for the lifetime
/// of the molecule: atoms can be appended and moved, never removed. Energy terms
/// store these indices directly.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    bond_set: HashSet<Bond>,
    adjacency: Vec<Vec<usize>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an atom and returns its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Adds a bond between two existing atoms. Adding an existing bond again is a no-op.
    pub fn add_bond(&mut self, a: usize, b: usize) -> Result<(), MoleculeError> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Err(MoleculeError::SelfBond(a));
        }
        let bond = Bond::new(a, b);
        if self.bond_set.insert(bond) {
            self.bonds.push(bond);
            self.adjacency[a].push(b);
            self.adjacency[b].push(a);
        }
        Ok(())
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn movable_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_movable).count()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn are_bonded(&self, a: usize, b: usize) -> bool {
        self.bond_set.contains(&Bond::new(a, b))
    }

    /// True if `a` and `b` are separated by one or two bonds (1-2 or 1-3 pair).
    pub fn within_two_bonds(&self, a: usize, b: usize) -> bool {
        self.are_bonded(a, b)
            || self
                .neighbors(a)
                .iter()
                .any(|&mid| self.are_bonded(mid, b))
    }

    /// Moves an atom in place.
    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> Result<(), MoleculeError> {
        let atom_count = self.atoms.len();
        let atom = self
            .atoms
            .get_mut(index)
            .ok_or(MoleculeError::AtomNotFound { index, atom_count })?;
        atom.position = position;
        Ok(())
    }

    /// Axis-aligned bounding box of all atom positions, or `None` for an empty molecule.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.atoms.iter().map(|a| &a.position))
    }

    fn check_index(&self, index: usize) -> Result<(), MoleculeError> {
        if index < self.atoms.len() {
            Ok(())
        } else {
            Err(MoleculeError::AtomNotFound {
                index,
                atom_count: self.atoms.len(),
            })
        }
    }
}
