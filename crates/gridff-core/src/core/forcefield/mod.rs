//! # Force Field Module
//!
//! Energy terms of a molecular mechanics force field and the grid cache that
//! approximates groups of them.
//!
//! ## Key Components
//!
//! - [`params`] - Parameter structures and the [`params::ParameterProvider`] lookup service
//! - [`potentials`] - Scalar potential functions returning energy and derivative
//! - [`positions`] - Coordinate views used during evaluation, including probed views
//! - [`term`] - The [`term::EnergyTerm`] enum and its concrete terms
//! - [`grid`] - Lazily populated, trilinearly interpolated grid fields
//! - [`scoring`] - Per-kind energy breakdown
//!
//! Every term evaluates against a [`positions::Positions`] view and never mutates the
//! molecule. Gradients are added into caller-owned buffers.

pub mod grid;
pub mod params;
pub mod positions;
pub(crate) mod potentials;
pub mod scoring;
pub mod term;
