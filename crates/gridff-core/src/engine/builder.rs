use super::config::ForceFieldConfig;
use super::error::EngineError;
use super::term_list::TermList;
use crate::core::forcefield::params::ParameterProvider;
use crate::core::forcefield::term::{
    AngleTerm, BondTerm, ContactTerm, EnergyTerm, PairTerm, SuperposeTerm, TermKind,
    TorsionTerm,
};
use crate::core::models::atom::{Atom, AtomRole};
use crate::core::models::molecule::Molecule;
use itertools::Itertools;
use kiddo::{KdTree, SquaredEuclidean};
use tracing::debug;

fn missing(kind: TermKind, classes: &[u32]) -> EngineError {
    EngineError::MissingParameter {
        kind,
        key: classes.iter().join("-"),
    }
}

/// Builds the standard term list of `molecule`.
///
/// Only features touching at least one movable atom produce terms; everything else
/// is a constant offset. Non-bonded pairs are found within the configured cutoff and
/// skip atoms separated by one or two bonds.
pub fn build_terms<P>(
    molecule: &Molecule,
    params: &P,
    config: &ForceFieldConfig,
) -> Result<TermList, EngineError>
where
    P: ParameterProvider + ?Sized,
{
    let mut list = TermList::new(molecule.atom_count());
    add_bonded_terms(&mut list, molecule, params)?;
    add_nonbonded_terms(&mut list, molecule, params, config)?;
    debug!(
        "Built {} terms ({} plain, {} pairwise)",
        list.len(),
        list.terms().len(),
        list.pairwise().len()
    );
    Ok(list)
}

fn any_movable(molecule: &Molecule, indices: &[usize]) -> bool {
    let atoms = molecule.atoms();
    indices.iter().any(|&i| atoms[i].is_movable)
}

fn add_bonded_terms<P>(
    list: &mut TermList,
    molecule: &Molecule,
    params: &P,
) -> Result<(), EngineError>
where
    P: ParameterProvider + ?Sized,
{
    let atoms = molecule.atoms();
    let class = |i: usize| atoms[i].interaction_class;

    for bond in molecule.bonds() {
        let (a, b) = (bond.atom1, bond.atom2);
        if !any_movable(molecule, &[a, b]) {
            continue;
        }
        let param = params
            .bond(class(a), class(b))
            .ok_or_else(|| missing(TermKind::Bond, &[class(a), class(b)]))?;
        list.push(BondTerm::new(a, b, param).into())?;
    }

    for vertex in 0..molecule.atom_count() {
        for (&a, &c) in molecule.neighbors(vertex).iter().tuple_combinations() {
            if !any_movable(molecule, &[a, vertex, c]) {
                continue;
            }
            let classes = [class(a), class(vertex), class(c)];
            let param = params
                .angle(classes[0], classes[1], classes[2])
                .ok_or_else(|| missing(TermKind::Angle, &classes))?;
            list.push(AngleTerm::new(a, vertex, c, param).into())?;
        }
    }

    for bond in molecule.bonds() {
        let (j, k) = (bond.atom1, bond.atom2);
        for &i in molecule.neighbors(j).iter().filter(|&&i| i != k) {
            for &l in molecule.neighbors(k).iter().filter(|&&l| l != j && l != i) {
                let quad = [i, j, k, l];
                if !any_movable(molecule, &quad) {
                    continue;
                }
                let classes = quad.map(class);
                let param = params
                    .torsion(classes[0], classes[1], classes[2], classes[3])
                    .ok_or_else(|| missing(TermKind::Torsion, &classes))?;
                list.push(TorsionTerm::new(quad, param).into())?;
            }
        }
    }

    Ok(())
}

fn add_nonbonded_terms<P>(
    list: &mut TermList,
    molecule: &Molecule,
    params: &P,
    config: &ForceFieldConfig,
) -> Result<(), EngineError>
where
    P: ParameterProvider + ?Sized,
{
    let atoms = molecule.atoms();
    let candidates: Vec<usize> = (0..atoms.len())
        .filter(|&i| config.include_hydrogens || !atoms[i].is_hydrogen())
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }

    let points: Vec<[f64; 3]> = candidates
        .iter()
        .map(|&i| {
            let p = atoms[i].position;
            [p.x, p.y, p.z]
        })
        .collect();
    let kdtree: KdTree<f64, 3> = (&points).into();
    let cutoff_sq = config.nonbonded_cutoff * config.nonbonded_cutoff;

    for (slot, &a) in candidates.iter().enumerate() {
        if !atoms[a].is_movable {
            continue;
        }
        let mut partners: Vec<usize> = kdtree
            .within_unsorted::<SquaredEuclidean>(&points[slot], cutoff_sq)
            .into_iter()
            .map(|neighbour| candidates[neighbour.item as usize])
            .filter(|&b| b != a && !(atoms[b].is_movable && b < a))
            .filter(|&b| !molecule.within_two_bonds(a, b))
            .collect();
        partners.sort_unstable();

        for b in partners {
            if let Some(term) = pair_term(&atoms[a], a, &atoms[b], b, params, config)? {
                list.push(term)?;
            }
        }
    }
    Ok(())
}

/// Chooses the term for a non-bonded pair from the roles of its atoms.
fn pair_term<P>(
    atom_a: &Atom,
    a: usize,
    atom_b: &Atom,
    b: usize,
    params: &P,
    config: &ForceFieldConfig,
) -> Result<Option<EnergyTerm>, EngineError>
where
    P: ParameterProvider + ?Sized,
{
    let dielectric = params.dielectric_constant();
    let charge_product = atom_a.partial_charge * atom_b.partial_charge;

    match (atom_a.role, atom_b.role) {
        (AtomRole::Template, AtomRole::Template) => Ok(None),
        (AtomRole::Template, _) | (_, AtomRole::Template) => {
            let (ligand, template) = if atom_a.role == AtomRole::Template {
                ((atom_b, b), (atom_a, a))
            } else {
                ((atom_a, a), (atom_b, b))
            };
            let superposable = config.use_superposition
                && ligand.0.is_ligand()
                && ligand.0.is_movable
                && ligand.0.atomic_number == template.0.atomic_number;
            Ok(superposable
                .then(|| SuperposeTerm::new(ligand.1, template.1, params.superpose()).into()))
        }
        (AtomRole::Ligand, AtomRole::Receptor) | (AtomRole::Receptor, AtomRole::Ligand)
            if config.use_protein_ligand =>
        {
            let (ligand, receptor) = if atom_a.is_ligand() {
                ((atom_a, a), (atom_b, b))
            } else {
                ((atom_b, b), (atom_a, a))
            };
            let classes = [ligand.0.interaction_class, receptor.0.interaction_class];
            let param = params
                .contact(classes[0], classes[1])
                .ok_or_else(|| missing(TermKind::ProteinLigand, &classes))?;
            Ok(Some(
                ContactTerm::new(ligand.1, receptor.1, param, charge_product, dielectric).into(),
            ))
        }
        (role_a, role_b) => {
            let (class_a, class_b) = (atom_a.interaction_class, atom_b.interaction_class);
            let pa = params
                .vdw(class_a)
                .ok_or_else(|| missing(TermKind::VanDerWaals, &[class_a]))?;
            let pb = params
                .vdw(class_b)
                .ok_or_else(|| missing(TermKind::VanDerWaals, &[class_b]))?;
            Ok(Some(
                PairTerm::new(
                    [a, b],
                    (pa.radius + pb.radius) / 2.0,
                    (pa.well_depth * pb.well_depth).sqrt(),
                    charge_product,
                    dielectric,
                    role_a != role_b,
                )
                .into(),
            ))
        }
    }
}
