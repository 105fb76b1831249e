//! # Core Models Module
//!
//! Data structures describing the molecular system the force field evaluates.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom with coordinates, element, interaction class, role and mobility
//! - [`topology`] - Covalent bonds
//! - [`molecule`] - Indexed atom store with bond adjacency and bounding box
//!
//! ```ignore
//! use gridff::core::models::{atom::Atom, molecule::Molecule};
//!
//! let mut molecule = Molecule::new();
//! let c1 = molecule.add_atom(Atom::new("C1", 6, Point3::new(0.0, 0.0, 0.0)));
//! let c2 = molecule.add_atom(Atom::new("C2", 6, Point3::new(1.5, 0.0, 0.0)));
//! molecule.add_bond(c1, c2)?;
//! ```

pub mod atom;
pub mod molecule;
pub mod topology;
