use thiserror::Error;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Which term-list implementation a force field uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermListMode {
    /// Every term is evaluated directly.
    #[default]
    Direct,
    /// The aggregation pass runs as soon as the term list is built.
    Aggregated,
}

/// Settings of the grid aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    /// Total memory the pass may commit to grids, across passes.
    pub memory_budget_bytes: usize,
    /// Headroom that must stay free after a grid is committed.
    pub safety_margin_bytes: usize,
    /// Padding added around the molecule's bounding box, in Angstroms.
    pub padding: f64,
    pub carbon_cell_size: f64,
    pub superpose_cell_size: f64,
    pub default_cell_size: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: 512 * MIB,
            safety_margin_bytes: 4 * MIB,
            padding: 3.0,
            carbon_cell_size: 0.75,
            superpose_cell_size: 0.5,
            default_cell_size: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceFieldConfig {
    /// Build non-bonded terms for hydrogen atoms too.
    pub include_hydrogens: bool,
    /// Use dedicated protein-ligand contact terms for ligand/receptor pairs.
    pub use_protein_ligand: bool,
    /// Attract ligand atoms to template atoms of the same element.
    pub use_superposition: bool,
    /// Distance cutoff for non-bonded pairs, in Angstroms.
    pub nonbonded_cutoff: f64,
    pub term_list: TermListMode,
    pub aggregation: AggregationConfig,
}

impl Default for ForceFieldConfig {
    fn default() -> Self {
        Self {
            include_hydrogens: false,
            use_protein_ligand: true,
            use_superposition: false,
            nonbonded_cutoff: 8.0,
            term_list: TermListMode::Direct,
            aggregation: AggregationConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct ForceFieldConfigBuilder {
    include_hydrogens: Option<bool>,
    use_protein_ligand: Option<bool>,
    use_superposition: Option<bool>,
    nonbonded_cutoff: Option<f64>,
    term_list: Option<TermListMode>,
    memory_budget_bytes: Option<usize>,
    safety_margin_bytes: Option<usize>,
    padding: Option<f64>,
    carbon_cell_size: Option<f64>,
    superpose_cell_size: Option<f64>,
    default_cell_size: Option<f64>,
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            reason: format!("must be a positive finite number, got {value}"),
        })
    }
}

impl ForceFieldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_hydrogens(mut self, include: bool) -> Self {
        self.include_hydrogens = Some(include);
        self
    }
    pub fn use_protein_ligand(mut self, enabled: bool) -> Self {
        self.use_protein_ligand = Some(enabled);
        self
    }
    pub fn use_superposition(mut self, enabled: bool) -> Self {
        self.use_superposition = Some(enabled);
        self
    }
    pub fn nonbonded_cutoff(mut self, cutoff: f64) -> Self {
        self.nonbonded_cutoff = Some(cutoff);
        self
    }
    pub fn term_list(mut self, mode: TermListMode) -> Self {
        self.term_list = Some(mode);
        self
    }
    pub fn memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }
    pub fn safety_margin_bytes(mut self, bytes: usize) -> Self {
        self.safety_margin_bytes = Some(bytes);
        self
    }
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }
    pub fn carbon_cell_size(mut self, size: f64) -> Self {
        self.carbon_cell_size = Some(size);
        self
    }
    pub fn superpose_cell_size(mut self, size: f64) -> Self {
        self.superpose_cell_size = Some(size);
        self
    }
    pub fn default_cell_size(mut self, size: f64) -> Self {
        self.default_cell_size = Some(size);
        self
    }

    /// Fills unset values from [`ForceFieldConfig::default`] and validates the result.
    pub fn build(self) -> Result<ForceFieldConfig, ConfigError> {
        let defaults = ForceFieldConfig::default();
        let agg = defaults.aggregation;

        let padding = self.padding.unwrap_or(agg.padding);
        if !padding.is_finite() || padding < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "padding",
                reason: format!("must be a non-negative finite number, got {padding}"),
            });
        }

        let aggregation = AggregationConfig {
            memory_budget_bytes: self.memory_budget_bytes.unwrap_or(agg.memory_budget_bytes),
            safety_margin_bytes: self.safety_margin_bytes.unwrap_or(agg.safety_margin_bytes),
            padding,
            carbon_cell_size: require_positive(
                "carbon_cell_size",
                self.carbon_cell_size.unwrap_or(agg.carbon_cell_size),
            )?,
            superpose_cell_size: require_positive(
                "superpose_cell_size",
                self.superpose_cell_size.unwrap_or(agg.superpose_cell_size),
            )?,
            default_cell_size: require_positive(
                "default_cell_size",
                self.default_cell_size.unwrap_or(agg.default_cell_size),
            )?,
        };

        Ok(ForceFieldConfig {
            include_hydrogens: self.include_hydrogens.unwrap_or(defaults.include_hydrogens),
            use_protein_ligand: self.use_protein_ligand.unwrap_or(defaults.use_protein_ligand),
            use_superposition: self.use_superposition.unwrap_or(defaults.use_superposition),
            nonbonded_cutoff: require_positive(
                "nonbonded_cutoff",
                self.nonbonded_cutoff.unwrap_or(defaults.nonbonded_cutoff),
            )?,
            term_list: self.term_list.unwrap_or(defaults.term_list),
            aggregation,
        })
    }
}
