use super::config::AggregationConfig;
use super::progress::{Progress, ProgressReporter};
use super::term_list::TermList;
use crate::core::forcefield::grid::{
    GridField, GridTerm, anchored_box, dimensions_for, estimate_bytes,
};
use crate::core::forcefield::term::{EnergyTerm, TermKind};
use crate::core::models::atom::{Atom, CARBON};
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::BoundingBox;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a grid approximates ordinary interaction terms or superposition terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridKind {
    Ordinary,
    Superpose,
}

/// Movable atoms with equal keys are candidates for one shared grid field.
///
/// Atoms of equal key interact identically with any fixed partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub interaction_class: u32,
    pub atomic_number: u8,
    pub charge_bits: u64,
    pub kind: GridKind,
}

impl GridKey {
    fn for_atom(atom: &Atom, kind: GridKind) -> Self {
        // Folds -0.0 into 0.0.
        let charge = atom.partial_charge + 0.0;
        Self {
            interaction_class: atom.interaction_class,
            atomic_number: atom.atomic_number,
            charge_bits: charge.to_bits(),
            kind,
        }
    }

    pub fn cell_size(&self, config: &AggregationConfig) -> f64 {
        match self.kind {
            GridKind::Superpose => config.superpose_cell_size,
            GridKind::Ordinary if self.atomic_number == CARBON => config.carbon_cell_size,
            GridKind::Ordinary => config.default_cell_size,
        }
    }
}

/// Outcome of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregationSummary {
    /// Grid fields allocated in this pass.
    pub grids_built: usize,
    /// Grid terms that reuse a field built earlier in this pass.
    pub grids_shared: usize,
    /// Movable atoms whose terms stayed direct because the budget declined a grid.
    pub atoms_fallback: usize,
    /// Direct terms replaced by grid terms.
    pub terms_aggregated: usize,
    /// Estimated memory committed in this pass.
    pub bytes_committed: usize,
}

type Bucket = (usize, Vec<EnergyTerm>);

/// A term's kind and the atoms it acts on besides its movable atom.
type PartnerKey = (TermKind, Vec<usize>);

/// Returns the single movable atom of an eligible term.
///
/// A term is eligible when it spans at least two atoms of which exactly one is movable.
fn sole_movable_atom(term: &EnergyTerm, molecule: &Molecule) -> Option<usize> {
    let atoms = term.atoms();
    if atoms.len() < 2 {
        return None;
    }
    let mut movable = atoms.iter().filter(|&&i| molecule.atoms()[i].is_movable);
    match (movable.next(), movable.next()) {
        (Some(&atom), None) => Some(atom),
        _ => None,
    }
}

fn partner_key(term: &EnergyTerm, atom: usize) -> PartnerKey {
    let partners = term.atoms().iter().copied().filter(|&a| a != atom).collect();
    (term.kind(), partners)
}

/// Every distinct partner term of a group, with the atom whose term it was.
fn merged_partners(group: &[Bucket]) -> BTreeMap<PartnerKey, (usize, EnergyTerm)> {
    let mut merged = BTreeMap::new();
    for (atom, terms) in group {
        for term in terms {
            merged
                .entry(partner_key(term, *atom))
                .or_insert_with(|| (*atom, term.clone()));
        }
    }
    merged
}

/// True when the merged partners within `cutoff` of `atom` are exactly its own terms.
///
/// Fails for an atom that moved since its terms were built, or one whose bonded
/// neighbours are excluded partners of other atoms in the group.
fn sees_merged_partners(
    atom: usize,
    terms: &[EnergyTerm],
    merged: &BTreeMap<PartnerKey, (usize, EnergyTerm)>,
    molecule: &Molecule,
    cutoff: f64,
) -> bool {
    let atoms = molecule.atoms();
    let position = atoms[atom].position;
    let mut own: Vec<PartnerKey> = terms.iter().map(|t| partner_key(t, atom)).collect();
    own.sort();
    let reachable: Vec<&PartnerKey> = merged
        .keys()
        .filter(|(_, partners)| {
            partners
                .iter()
                .all(|&p| (atoms[p].position - position).norm_squared() <= cutoff * cutoff)
        })
        .collect();
    own.len() == reachable.len() && own.iter().zip(reachable).all(|(a, b)| a == b)
}

/// Mutable state of one aggregation pass.
struct Placement<'a, 'r> {
    list: &'a mut TermList,
    molecule: &'a Molecule,
    config: &'a AggregationConfig,
    reporter: &'a ProgressReporter<'r>,
    bbox: BoundingBox,
    committed: usize,
    summary: AggregationSummary,
}

impl Placement<'_, '_> {
    /// Serves every member from one field anchored at the first member's position,
    /// or keeps their direct terms if the budget declines it.
    fn place(
        &mut self,
        key: &GridKey,
        members: Vec<Bucket>,
        targets: Vec<EnergyTerm>,
        cutoff: Option<f64>,
    ) {
        let Some(probe) = members.first().map(|(atom, _)| *atom) else {
            return;
        };
        let cell_size = key.cell_size(self.config);
        let anchor = self.molecule.atoms()[probe].position;
        let lattice = anchored_box(&self.bbox, cell_size, &anchor);
        let bytes = estimate_bytes(dimensions_for(&lattice, cell_size));
        let free = self.config.memory_budget_bytes.saturating_sub(self.committed);

        if bytes.saturating_add(self.config.safety_margin_bytes) > free {
            for (atom, terms) in members {
                warn!(
                    "Grid for atom {} needs {} bytes but only {} of the budget remain; keeping {} direct terms",
                    atom,
                    bytes,
                    free,
                    terms.len()
                );
                self.summary.atoms_fallback += 1;
                for term in terms {
                    self.list.push_pairwise(term);
                }
                self.reporter.report(Progress::GridDeclined { atom, bytes });
                self.reporter.report(Progress::TaskIncrement);
            }
            return;
        }

        debug!(
            "Committing grid for atom {} ({:?}): cell {:.2} Å, {} targets, {} bytes",
            probe,
            key,
            cell_size,
            targets.len(),
            bytes
        );
        self.committed += bytes;
        self.summary.grids_built += 1;
        self.summary.bytes_committed += bytes;
        let mut field = GridField::new(&lattice, cell_size, probe, targets);
        if let Some(cutoff) = cutoff {
            field = field.with_cutoff(cutoff);
        }
        let field = Arc::new(field);
        self.reporter.report(Progress::GridCommitted { atom: probe, bytes });

        for (atom, terms) in members {
            if atom != probe {
                debug!("Atom {} shares grid of atom {}", atom, probe);
                self.summary.grids_shared += 1;
            }
            self.summary.terms_aggregated += terms.len();
            self.list
                .push_plain(GridTerm::new(Arc::clone(&field), atom).into());
            self.reporter.report(Progress::TaskIncrement);
        }
    }
}

/// Replaces eligible pairwise terms of `list` with grid terms.
///
/// Eligible terms are bucketed per movable atom and term kind, buckets are grouped by
/// [`GridKey`], and groups are processed largest first. A group's shared field holds
/// the union of its members' partner terms, moved onto the first member and limited
/// to partners within `cutoff` of each node, so every member reads the partners its
/// own terms had. A member whose partners within `cutoff` differ from that union gets
/// a dedicated field of its own terms instead. Each field's lattice passes through
/// its first member's position. Atoms whose field the budget declines keep their
/// direct terms; ineligible terms are left untouched.
pub(crate) fn aggregate(
    list: &mut TermList,
    molecule: &Molecule,
    config: &AggregationConfig,
    cutoff: f64,
    reporter: &ProgressReporter,
) -> AggregationSummary {
    let Some(bbox) = molecule.bounding_box() else {
        return AggregationSummary::default();
    };
    let bbox = bbox.padded(config.padding);

    reporter.report(Progress::PhaseStart {
        name: "Grid Aggregation",
    });

    let mut buckets: BTreeMap<(usize, GridKind), Vec<EnergyTerm>> = BTreeMap::new();
    for term in list.take_pairwise() {
        match sole_movable_atom(&term, molecule) {
            Some(atom) => {
                let kind = if term.kind() == TermKind::Superpose {
                    GridKind::Superpose
                } else {
                    GridKind::Ordinary
                };
                buckets.entry((atom, kind)).or_default().push(term);
            }
            None => list.push_pairwise(term),
        }
    }

    let mut groups: BTreeMap<GridKey, Vec<Bucket>> = BTreeMap::new();
    for ((atom, kind), terms) in buckets {
        let key = GridKey::for_atom(&molecule.atoms()[atom], kind);
        groups.entry(key).or_default().push((atom, terms));
    }

    let mut ordered: Vec<(GridKey, Vec<Bucket>)> = groups.into_iter().collect();
    ordered.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let total_atoms: usize = ordered.iter().map(|(_, group)| group.len()).sum();
    reporter.report(Progress::TaskStart {
        total_steps: total_atoms as u64,
    });

    let committed = list.committed_grid_bytes();
    let mut placement = Placement {
        list,
        molecule,
        config,
        reporter,
        bbox,
        committed,
        summary: AggregationSummary::default(),
    };

    for (key, group) in ordered {
        let merged = merged_partners(&group);
        let (sharing, own): (Vec<Bucket>, Vec<Bucket>) =
            group.into_iter().partition(|(atom, terms)| {
                sees_merged_partners(*atom, terms, &merged, molecule, cutoff)
            });

        if let Some(probe) = sharing.first().map(|(atom, _)| *atom) {
            let targets = merged
                .into_values()
                .map(|(source, term)| term.with_atom_replaced(source, probe))
                .collect();
            placement.place(&key, sharing, targets, Some(cutoff));
        }
        for (atom, terms) in own {
            debug!(
                "Atom {} sees other partners than its {:?} group; giving it a dedicated grid",
                atom, key
            );
            let targets = terms.clone();
            placement.place(&key, vec![(atom, terms)], targets, None);
        }
    }

    let summary = placement.summary;
    list.commit_grid_bytes(summary.bytes_committed);
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(
        "Aggregation finished: {} grids built, {} shared, {} atoms fell back, {} terms aggregated, {} bytes committed",
        summary.grids_built,
        summary.grids_shared,
        summary.atoms_fallback,
        summary.terms_aggregated,
        summary.bytes_committed
    );
    summary
}
