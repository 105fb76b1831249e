//! # Workflows Module
//!
//! Complete procedures built on the engine. Each workflow takes ready inputs (a
//! molecule, a parameter service, and configuration), reports progress, and returns
//! a plain result structure.
//!
//! - **Scoring Workflow** ([`score`]) - Energy, gradient and per-atom attribution of a
//!   system, optionally comparing direct and aggregated evaluation.

pub mod score;
