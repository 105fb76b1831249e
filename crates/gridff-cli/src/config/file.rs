use crate::error::{CliError, Result};
use gridff::engine::config::TermListMode;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileTermListMode {
    Direct,
    Aggregated,
}

impl From<FileTermListMode> for TermListMode {
    fn from(mode: FileTermListMode) -> Self {
        match mode {
            FileTermListMode::Direct => TermListMode::Direct,
            FileTermListMode::Aggregated => TermListMode::Aggregated,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileForceFieldConfig {
    pub include_hydrogens: Option<bool>,
    pub protein_ligand: Option<bool>,
    pub superposition: Option<bool>,
    pub nonbonded_cutoff: Option<f64>,
    pub term_list: Option<FileTermListMode>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileAggregationConfig {
    pub memory_budget_mb: Option<usize>,
    pub safety_margin_mb: Option<usize>,
    pub padding: Option<f64>,
    pub carbon_cell_size: Option<f64>,
    pub superpose_cell_size: Option<f64>,
    pub default_cell_size: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub forcefield: Option<FileForceFieldConfig>,
    pub aggregation: Option<FileAggregationConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
