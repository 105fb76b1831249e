use super::positions::Positions;
use super::term::{AtomGradients, EnergyTerm, MAX_TERM_ATOMS};
use crate::core::utils::geometry::BoundingBox;
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Size of one stored sample component in the memory estimate.
pub const BYTES_PER_SAMPLE: usize = 16;
/// Components stored per cell: the value and three gradient components.
pub const SAMPLES_PER_CELL: usize = 4;

/// Number of grid nodes per axis needed to cover `bbox` with spacing `cell_size`.
///
/// One extra node on each axis guarantees every point inside the box has a full
/// upper corner.
pub fn dimensions_for(bbox: &BoundingBox, cell_size: f64) -> [usize; 3] {
    let extent = bbox.extent();
    [0, 1, 2].map(|axis| (extent[axis].max(0.0) / cell_size).floor() as usize + 2)
}

/// Returns `bbox` with its minimum corner lowered onto the lattice of spacing
/// `cell_size` that passes through `anchor`, so `anchor` is a grid node.
///
/// The new corner lies less than one cell below the old one.
pub fn anchored_box(bbox: &BoundingBox, cell_size: f64, anchor: &Point3<f64>) -> BoundingBox {
    let steps = ((*anchor - bbox.min) / cell_size).map(f64::ceil);
    BoundingBox {
        min: *anchor - steps * cell_size,
        max: bbox.max,
    }
}

/// Heuristic memory cost of a grid with the given dimensions.
pub fn estimate_bytes(dims: [usize; 3]) -> usize {
    dims.iter().product::<usize>() * SAMPLES_PER_CELL * BYTES_PER_SAMPLE
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridSample {
    pub value: f64,
    pub gradient: Vector3<f64>,
}

/// A lazily populated 3D field of (energy, gradient) samples.
///
/// The field approximates the summed contribution of `targets` as a function of the
/// position of `probe_atom`, with every other atom held where it is. A cell is
/// computed on first access and never again. Fields are shared between grid terms
/// through an [`Arc`]; a cell's content depends only on its node, never on which
/// term asked for it.
///
/// With a cutoff set, a target only contributes to a node when all of its other
/// atoms lie within the cutoff of that node.
pub struct GridField {
    origin: Point3<f64>,
    cell_size: f64,
    dims: [usize; 3],
    cells: Vec<OnceLock<GridSample>>,
    probe_atom: usize,
    targets: Vec<EnergyTerm>,
    cutoff: Option<f64>,
    populated: AtomicUsize,
}

impl GridField {
    /// Creates an empty field spanning `bbox`, whose minimum corner becomes the origin.
    pub fn new(
        bbox: &BoundingBox,
        cell_size: f64,
        probe_atom: usize,
        targets: Vec<EnergyTerm>,
    ) -> Self {
        let dims = dimensions_for(bbox, cell_size);
        let cell_count = dims.iter().product();
        let mut cells = Vec::with_capacity(cell_count);
        cells.resize_with(cell_count, OnceLock::new);
        Self {
            origin: bbox.min,
            cell_size,
            dims,
            cells,
            probe_atom,
            targets,
            cutoff: None,
            populated: AtomicUsize::new(0),
        }
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn estimated_bytes(&self) -> usize {
        estimate_bytes(self.dims)
    }

    pub fn probe_atom(&self) -> usize {
        self.probe_atom
    }

    pub fn targets(&self) -> &[EnergyTerm] {
        &self.targets
    }

    /// Number of cells computed so far.
    pub fn populated_cells(&self) -> usize {
        self.populated.load(Ordering::Relaxed)
    }

    /// World coordinate of the node at `index`.
    pub fn node_position(&self, index: [usize; 3]) -> Point3<f64> {
        self.origin
            + Vector3::new(index[0] as f64, index[1] as f64, index[2] as f64) * self.cell_size
    }

    fn flat_index(&self, index: [usize; 3]) -> usize {
        (index[0] * self.dims[1] + index[1]) * self.dims[2] + index[2]
    }

    fn sample(&self, positions: &Positions, index: [usize; 3]) -> GridSample {
        *self.cells[self.flat_index(index)].get_or_init(|| self.compute_sample(positions, index))
    }

    fn reaches(&self, term: &EnergyTerm, positions: &Positions, node: &Point3<f64>) -> bool {
        let Some(cutoff) = self.cutoff else {
            return true;
        };
        term.atoms()
            .iter()
            .filter(|&&atom| atom != self.probe_atom)
            .all(|&atom| (positions.get(atom) - *node).norm_squared() <= cutoff * cutoff)
    }

    fn compute_sample(&self, positions: &Positions, index: [usize; 3]) -> GridSample {
        let node = self.node_position(index);
        let probed = positions.with_probe(self.probe_atom, node);
        let mut sample = GridSample::default();
        for term in self
            .targets
            .iter()
            .filter(|term| self.reaches(term, &probed, &node))
        {
            let (energy, grads) = term.compute(&probed);
            sample.value += energy;
            for (&atom, g) in term.atoms().iter().zip(grads.iter()) {
                if atom == self.probe_atom {
                    sample.gradient += g;
                }
            }
        }
        self.populated.fetch_add(1, Ordering::Relaxed);
        trace!(
            "Populated grid cell {:?} for atom {}: {:.6}",
            index, self.probe_atom, sample.value
        );
        sample
    }

    /// Trilinear estimate of the field at `point`.
    ///
    /// Points whose lower or upper corner falls outside the grid give zero energy and
    /// zero gradient. Corners with zero weight are neither read nor populated, so a
    /// point exactly on a node returns that node's sample unchanged.
    pub fn interpolate(
        &self,
        positions: &Positions,
        point: &Point3<f64>,
    ) -> (f64, Vector3<f64>) {
        let rel = (point - self.origin) / self.cell_size;
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for axis in 0..3 {
            let r = rel[axis];
            // NaN fails this comparison as well.
            if !(r >= 0.0) {
                return (0.0, Vector3::zeros());
            }
            let floor = r.floor();
            let cell = floor as usize;
            if cell >= self.dims[axis] - 1 {
                return (0.0, Vector3::zeros());
            }
            base[axis] = cell;
            frac[axis] = r - floor;
        }

        let mut value = 0.0;
        let mut gradient = Vector3::zeros();
        for corner in 0..8usize {
            let mut weight = 1.0;
            let mut index = base;
            for axis in 0..3 {
                if (corner >> axis) & 1 == 1 {
                    weight *= frac[axis];
                    index[axis] += 1;
                } else {
                    weight *= 1.0 - frac[axis];
                }
            }
            if weight == 0.0 {
                continue;
            }
            let sample = self.sample(positions, index);
            value += weight * sample.value;
            gradient += sample.gradient * weight;
        }
        (value, gradient)
    }
}

impl fmt::Debug for GridField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridField")
            .field("origin", &self.origin)
            .field("cell_size", &self.cell_size)
            .field("dims", &self.dims)
            .field("probe_atom", &self.probe_atom)
            .field("targets", &self.targets.len())
            .field("cutoff", &self.cutoff)
            .field("populated", &self.populated_cells())
            .finish()
    }
}

/// Energy of one movable atom read from a (possibly shared) grid field.
#[derive(Debug, Clone)]
pub struct GridTerm {
    field: Arc<GridField>,
    atoms: [usize; 1],
}

impl GridTerm {
    pub fn new(field: Arc<GridField>, atom: usize) -> Self {
        Self {
            field,
            atoms: [atom],
        }
    }

    pub fn field(&self) -> &Arc<GridField> {
        &self.field
    }

    pub fn atom(&self) -> usize {
        self.atoms[0]
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub(crate) fn compute(&self, positions: &Positions) -> (f64, AtomGradients) {
        let (value, gradient) = self
            .field
            .interpolate(positions, &positions.get(self.atoms[0]));
        let mut grads = [Vector3::zeros(); MAX_TERM_ATOMS];
        grads[0] = gradient;
        (value, grads)
    }
}
