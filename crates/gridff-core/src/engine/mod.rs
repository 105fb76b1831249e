//! # Engine Module
//!
//! The stateful layer: it turns a molecule and a parameter service into a term list,
//! evaluates energies and gradients, and runs the grid aggregation pass.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Force-field options and aggregation budget settings
//! - **Term Construction** ([`builder`]) - Bonded and non-bonded terms from topology
//! - **Term Storage** ([`term_list`]) - Plain and pairwise terms with energy queries
//! - **Aggregation** ([`aggregation`]) - Replacing pairwise terms with shared grid terms
//! - **Orchestration** ([`forcefield`]) - The [`forcefield::ForceField`] entry point
//! - **Progress Monitoring** ([`progress`]) - Callbacks for long-running passes
//! - **Error Handling** ([`error`]) - Engine error type
//!
//! Aggregation never fails for lack of memory: a declined grid leaves the atom's
//! terms in place and is reported through the summary, the log, and the progress
//! callback.

pub mod aggregation;
pub mod builder;
pub mod config;
pub mod error;
pub mod forcefield;
pub mod progress;
pub mod term_list;
