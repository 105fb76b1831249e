//! Reading a molecular system from a TOML system file.
//!
//! ```toml
//! bonds = [[0, 1]]
//!
//! [[atoms]]
//! name = "C1"
//! atomic-number = 6
//! class = 1
//! charge = -0.12
//! position = [0.0, 0.0, 0.0]
//! role = "ligand"
//! ```
//!
//! `bonds` must precede the first `[[atoms]]` table. `movable` defaults to true for
//! ligand atoms and false for everything else.

use crate::error::{CliError, Result};
use gridff::core::models::atom::{Atom, AtomRole};
use gridff::core::models::molecule::Molecule;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileAtom {
    name: String,
    atomic_number: u8,
    #[serde(default)]
    class: u32,
    #[serde(default)]
    charge: f64,
    position: [f64; 3],
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    movable: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct SystemFile {
    #[serde(default)]
    bonds: Vec<[usize; 2]>,
    #[serde(default)]
    atoms: Vec<FileAtom>,
}

pub fn read_system(path: &Path) -> Result<Molecule> {
    debug!("Reading system file {:?}", path);
    let content = std::fs::read_to_string(path)?;
    let file: SystemFile = toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    build_molecule(file).map_err(|reason| CliError::InvalidSystem {
        path: path.to_path_buf(),
        reason,
    })
}

fn build_molecule(file: SystemFile) -> std::result::Result<Molecule, String> {
    let mut molecule = Molecule::new();
    for entry in file.atoms {
        let role = match entry.role.as_deref() {
            Some(name) => AtomRole::from_str(name)
                .map_err(|_| format!("unknown role '{}' for atom '{}'", name, entry.name))?,
            None => AtomRole::Other,
        };
        if entry.position.iter().any(|c| !c.is_finite()) {
            return Err(format!("atom '{}' has a non-finite position", entry.name));
        }

        let mut atom = Atom::new(&entry.name, entry.atomic_number, Point3::from(entry.position));
        atom.interaction_class = entry.class;
        atom.partial_charge = entry.charge;
        atom.role = role;
        atom.is_movable = entry.movable.unwrap_or(role == AtomRole::Ligand);
        molecule.add_atom(atom);
    }

    for [a, b] in file.bonds {
        molecule.add_bond(a, b).map_err(|e| e.to_string())?;
    }

    debug!(
        "System has {} atoms ({} movable) and {} bonds",
        molecule.atom_count(),
        molecule.movable_count(),
        molecule.bonds().len()
    );
    Ok(molecule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SYSTEM: &str = r#"
        bonds = [[0, 1]]

        [[atoms]]
        name = "C1"
        atomic-number = 6
        class = 1
        charge = -0.1
        position = [0.0, 0.0, 0.0]
        role = "ligand"

        [[atoms]]
        name = "C2"
        atomic-number = 6
        class = 1
        position = [1.5, 0.0, 0.0]
        role = "ligand"
        movable = false

        [[atoms]]
        name = "N"
        atomic-number = 7
        class = 9
        position = [0.0, 4.0, 0.0]
        role = "protein"
    "#;

    fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_atoms_bonds_and_roles() {
        let (_dir, path) = write(SYSTEM);
        let molecule = read_system(&path).unwrap();

        assert_eq!(molecule.atom_count(), 3);
        assert_eq!(molecule.bonds().len(), 1);
        assert!(molecule.are_bonded(0, 1));

        let atoms = molecule.atoms();
        assert_eq!(atoms[0].interaction_class, 1);
        assert_eq!(atoms[0].partial_charge, -0.1);
        assert_eq!(atoms[2].role, AtomRole::Receptor);
        assert_eq!(atoms[1].position, Point3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn movable_defaults_to_ligand_role_unless_overridden() {
        let (_dir, path) = write(SYSTEM);
        let molecule = read_system(&path).unwrap();
        let atoms = molecule.atoms();

        assert!(atoms[0].is_movable);
        assert!(!atoms[1].is_movable);
        assert!(!atoms[2].is_movable);
        assert_eq!(molecule.movable_count(), 1);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let (_dir, path) = write(
            r#"
            [[atoms]]
            name = "X"
            atomic-number = 6
            position = [0.0, 0.0, 0.0]
            role = "sidechain"
            "#,
        );
        let result = read_system(&path);
        assert!(matches!(result, Err(CliError::InvalidSystem { .. })));
    }

    #[test]
    fn bond_to_missing_atom_is_rejected() {
        let (_dir, path) = write(
            r#"
            bonds = [[0, 5]]

            [[atoms]]
            name = "C"
            atomic-number = 6
            position = [0.0, 0.0, 0.0]
            "#,
        );
        let result = read_system(&path);
        assert!(matches!(result, Err(CliError::InvalidSystem { .. })));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let (_dir, path) = write(
            r#"
            [[atoms]]
            name = "C"
            atomic-number = 6
            position = [0.0, 0.0, 0.0]
            mass = 12.0
            "#,
        );
        let result = read_system(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = read_system(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
