use thiserror::Error;

use super::config::ConfigError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::forcefield::term::TermKind;
use crate::core::models::molecule::MoleculeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Molecule has {count} atoms, more than the supported maximum of {limit}")]
    TooManyAtoms { count: usize, limit: usize },

    #[error("Term references atom {index}, but the molecule has only {atom_count} atoms")]
    AtomIndexOutOfRange { index: usize, atom_count: usize },

    #[error("No {kind} parameters for interaction classes {key}")]
    MissingParameter { kind: TermKind, key: String },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load parameters: {source}")]
    Parameters {
        #[from]
        source: ParamLoadError,
    },

    #[error("Molecule error: {source}")]
    Molecule {
        #[from]
        source: MoleculeError,
    },
}
