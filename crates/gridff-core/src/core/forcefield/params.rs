use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BondParam {
    pub force_constant: f64,
    pub equilibrium_length: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct AngleParam {
    pub force_constant: f64,
    /// Equilibrium angle in degrees.
    pub equilibrium_angle: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TorsionParam {
    #[serde(default)]
    pub v1: f64,
    #[serde(default)]
    pub v2: f64,
    #[serde(default)]
    pub v3: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct VdwParam {
    pub radius: f64,
    pub well_depth: f64,
}

/// Pair parameters for a ligand/receptor contact, already combined for the pair.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ContactParam {
    pub radius: f64,
    pub well_depth: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SuperposeParam {
    pub weight: f64,
    pub alpha: f64,
}

impl Default for SuperposeParam {
    fn default() -> Self {
        Self {
            weight: 1.0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GlobalParams {
    pub dielectric_constant: f64,
    #[serde(default)]
    pub superpose: SuperposeParam,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            dielectric_constant: 4.0,
            superpose: SuperposeParam::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct FallbackParams {
    pub bond: Option<BondParam>,
    pub angle: Option<AngleParam>,
    pub torsion: Option<TorsionParam>,
    pub vdw: Option<VdwParam>,
}

/// The parameter lookup service the force field consults, keyed by interaction class.
///
/// Implementations are free to apply any approximate-match logic; `None` means no
/// parameters exist for the requested combination.
pub trait ParameterProvider {
    fn bond(&self, a: u32, b: u32) -> Option<BondParam>;
    fn angle(&self, a: u32, b: u32, c: u32) -> Option<AngleParam>;
    fn torsion(&self, a: u32, b: u32, c: u32, d: u32) -> Option<TorsionParam>;
    fn vdw(&self, class: u32) -> Option<VdwParam>;
    fn contact(&self, ligand_class: u32, receptor_class: u32) -> Option<ContactParam>;
    fn superpose(&self) -> SuperposeParam;
    fn dielectric_constant(&self) -> f64;
}

/// A parameter table loaded from TOML.
///
/// Keys of the `bond`, `angle`, `torsion` and `contact` sections are interaction
/// classes joined by `-` (e.g. `"3-7"`); `vdw` is keyed by a single class. Lookups try
/// the exact key, then the reversed key, then the `fallback` section.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ParameterTable {
    #[serde(default)]
    pub globals: GlobalParams,
    #[serde(default)]
    pub bond: HashMap<String, BondParam>,
    #[serde(default)]
    pub angle: HashMap<String, AngleParam>,
    #[serde(default)]
    pub torsion: HashMap<String, TorsionParam>,
    #[serde(default)]
    pub vdw: HashMap<String, VdwParam>,
    #[serde(default)]
    pub contact: HashMap<String, ContactParam>,
    #[serde(default)]
    pub fallback: FallbackParams,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

fn class_key(classes: &[u32]) -> String {
    classes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

fn lookup_symmetric<T: Copy>(map: &HashMap<String, T>, classes: &[u32]) -> Option<T> {
    map.get(&class_key(classes)).copied().or_else(|| {
        let reversed: Vec<u32> = classes.iter().rev().copied().collect();
        map.get(&class_key(&reversed)).copied()
    })
}

impl ParameterTable {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl ParameterProvider for ParameterTable {
    fn bond(&self, a: u32, b: u32) -> Option<BondParam> {
        lookup_symmetric(&self.bond, &[a, b]).or(self.fallback.bond)
    }

    fn angle(&self, a: u32, b: u32, c: u32) -> Option<AngleParam> {
        lookup_symmetric(&self.angle, &[a, b, c]).or(self.fallback.angle)
    }

    fn torsion(&self, a: u32, b: u32, c: u32, d: u32) -> Option<TorsionParam> {
        lookup_symmetric(&self.torsion, &[a, b, c, d]).or(self.fallback.torsion)
    }

    fn vdw(&self, class: u32) -> Option<VdwParam> {
        self.vdw.get(&class.to_string()).copied().or(self.fallback.vdw)
    }

    /// Explicit contact entries win; otherwise the pair is combined from the two
    /// atoms' van der Waals parameters (arithmetic radius, geometric well depth).
    fn contact(&self, ligand_class: u32, receptor_class: u32) -> Option<ContactParam> {
        if let Some(param) = self
            .contact
            .get(&class_key(&[ligand_class, receptor_class]))
        {
            return Some(*param);
        }
        let (p1, p2) = (self.vdw(ligand_class)?, self.vdw(receptor_class)?);
        Some(ContactParam {
            radius: (p1.radius + p2.radius) / 2.0,
            well_depth: (p1.well_depth * p2.well_depth).sqrt(),
        })
    }

    fn superpose(&self) -> SuperposeParam {
        self.globals.superpose
    }

    fn dielectric_constant(&self) -> f64 {
        self.globals.dielectric_constant
    }
}
