//! # Core Module
//!
//! Stateless building blocks of the engine: the molecule model, the force-field terms
//! and their potentials, and geometric utilities.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, and the molecule container
//! - **Energy Terms** ([`forcefield`]) - Parameters, potentials, terms and grid fields
//! - **Geometry** ([`utils`]) - Bounding boxes and angle/dihedral derivatives

pub mod forcefield;
pub mod models;
pub mod utils;
