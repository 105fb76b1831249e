use nalgebra::Point3;
use std::str::FromStr;

/// Atomic number of hydrogen.
pub const HYDROGEN: u8 = 1;
/// Atomic number of carbon.
pub const CARBON: u8 = 6;

/// Classifies which molecular subsystem an atom belongs to.
///
/// The role decides how pairs of atoms interact: atoms with the same role interact
/// through structural terms, ligand/receptor pairs through interaction terms, and
/// template atoms only through superposition terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Part of the small molecule being scored or optimized.
    Ligand,
    /// Part of the (mostly rigid) receptor, e.g. a protein binding site.
    Receptor,
    /// A reference atom the ligand is superposed onto. Never interacts physically.
    Template,
    /// Solvent atom.
    Water,
    /// Unknown or unclassified.
    #[default]
    Other,
}

/// A single atom as seen by the force field.
///
/// Besides its coordinates, an atom carries the opaque interaction class used for
/// parameter lookup and grid-cache grouping, its element, and whether an optimizer
/// may move it.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g. "C1", "CA").
    pub name: String,
    /// Atomic number of the element.
    pub atomic_number: u8,
    /// Opaque interaction class id used as a parameter and cache key.
    pub interaction_class: u32,
    /// Partial charge in elementary charge units.
    pub partial_charge: f64,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Subsystem membership.
    pub role: AtomRole,
    /// Whether an optimizer may change this atom's position.
    pub is_movable: bool,
}

impl Atom {
    /// Creates a fixed atom with role [`AtomRole::Other`], class 0 and no charge.
    pub fn new(name: &str, atomic_number: u8, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            atomic_number,
            interaction_class: 0,
            partial_charge: 0.0,
            position,
            role: AtomRole::default(),
            is_movable: false,
        }
    }

    #[inline]
    pub fn is_ligand(&self) -> bool {
        self.role == AtomRole::Ligand
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == HYDROGEN
    }

    #[inline]
    pub fn is_carbon(&self) -> bool {
        self.atomic_number == CARBON
    }

    /// A "real" atom for per-atom energy attribution: a heavy ligand atom.
    #[inline]
    pub fn is_real(&self) -> bool {
        self.is_ligand() && !self.is_hydrogen()
    }
}

impl FromStr for AtomRole {
    type Err = ();

    /// Parses a role name, case-insensitively. Accepts "protein" as an alias for
    /// the receptor and "solvent" for water.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ligand" => Ok(AtomRole::Ligand),
            "receptor" | "protein" => Ok(AtomRole::Receptor),
            "template" => Ok(AtomRole::Template),
            "water" | "solvent" => Ok(AtomRole::Water),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}
