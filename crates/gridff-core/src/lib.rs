//! # gridff Core Library
//!
//! A molecular mechanics energy and gradient engine with a grid cache for the
//! interactions of movable atoms with a rigid environment.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`), the energy term
//!   catalogue with analytic gradients, and the lazily populated `GridField`.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer. `ForceField` owns the molecule,
//!   builds a `TermList` from topology and parameters, and runs the aggregation pass
//!   that replaces eligible pairwise terms with shared grid terms under a memory budget.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the engine, such as
//!   scoring a system with or without aggregation.

pub mod core;
pub mod engine;
pub mod workflows;
