use nalgebra::{Point3, Unit, Vector3};

const DEGENERATE_LENGTH: f64 = 1e-10;
const DEGENERATE_SIN: f64 = 1e-8;

/// An axis-aligned box in Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` if there are no points.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        Some(Self { min, max })
    }

    /// Returns a copy grown by `padding` on every side.
    pub fn padded(&self, padding: f64) -> Self {
        let pad = Vector3::repeat(padding);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e.x * e.y * e.z
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

/// Normalizes `v`.
///
/// # Panics
///
/// Panics if `v` has (near) zero length. Callers must only ask for a direction
/// where one is geometrically defined.
pub fn unit_vector(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    match Unit::try_new(*v, DEGENERATE_LENGTH) {
        Some(unit) => unit,
        None => panic!("unit_vector called with a zero-length vector {v:?}"),
    }
}

/// Valence angle a-b-c (radians, vertex at `b`) and its derivatives with respect to
/// the three positions.
///
/// Collinear or overlapping atoms give zero derivatives.
pub fn angle_with_derivatives(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> (f64, [Vector3<f64>; 3]) {
    let zero = [Vector3::zeros(); 3];
    let u = a - b;
    let v = c - b;
    let (len_u, len_v) = (u.norm(), v.norm());
    if len_u < DEGENERATE_LENGTH || len_v < DEGENERATE_LENGTH {
        return (0.0, zero);
    }

    let u_hat = unit_vector(&u).into_inner();
    let v_hat = unit_vector(&v).into_inner();
    let cos_theta = u_hat.dot(&v_hat).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    if sin_theta < DEGENERATE_SIN {
        return (theta, zero);
    }

    let d_a = -(v_hat - u_hat * cos_theta) / (sin_theta * len_u);
    let d_c = -(u_hat - v_hat * cos_theta) / (sin_theta * len_v);
    let d_b = -(d_a + d_c);
    (theta, [d_a, d_b, d_c])
}

/// Dihedral angle i-j-k-l (radians, in (-pi, pi]) and its derivatives with respect to
/// the four positions (Blondel & Karplus formulation).
///
/// Returns a zero angle and zero derivatives when either plane is undefined.
pub fn dihedral_with_derivatives(
    i: &Point3<f64>,
    j: &Point3<f64>,
    k: &Point3<f64>,
    l: &Point3<f64>,
) -> (f64, [Vector3<f64>; 4]) {
    let f = i - j;
    let g = j - k;
    let h = l - k;
    let a = f.cross(&g);
    let b = h.cross(&g);
    let a2 = a.norm_squared();
    let b2 = b.norm_squared();
    let g_len = g.norm();
    if a2 < DEGENERATE_LENGTH || b2 < DEGENERATE_LENGTH || g_len < DEGENERATE_LENGTH {
        return (0.0, [Vector3::zeros(); 4]);
    }

    let ab_len = (a2 * b2).sqrt();
    let cos_phi = a.dot(&b) / ab_len;
    let sin_phi = b.cross(&a).dot(&g) / (ab_len * g_len);
    let phi = sin_phi.atan2(cos_phi);

    let fg = f.dot(&g);
    let hg = h.dot(&g);
    let d_i = -a * (g_len / a2);
    let d_l = b * (g_len / b2);
    let d_j = a * (g_len / a2) + a * (fg / (a2 * g_len)) - b * (hg / (b2 * g_len));
    let d_k = -b * (g_len / b2) - a * (fg / (a2 * g_len)) + b * (hg / (b2 * g_len));
    (phi, [d_i, d_j, d_k, d_l])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOLERANCE: f64 = 1e-6;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn numeric_derivative<F>(points: &[Point3<f64>], atom: usize, axis: usize, f: F) -> f64
    where
        F: Fn(&[Point3<f64>]) -> f64,
    {
        let h = 1e-6;
        let mut plus = points.to_vec();
        let mut minus = points.to_vec();
        plus[atom][axis] += h;
        minus[atom][axis] -= h;
        (f(&plus) - f(&minus)) / (2.0 * h)
    }

    #[test]
    fn bounding_box_from_points_covers_all_points() {
        let points = [
            Point3::new(1.0, -2.0, 3.0),
            Point3::new(-1.0, 4.0, 0.5),
            Point3::new(0.0, 0.0, 5.0),
        ];
        let bbox = BoundingBox::from_points(points.iter()).unwrap();
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, 0.5));
        assert_eq!(bbox.max, Point3::new(1.0, 4.0, 5.0));
        assert!(points.iter().all(|p| bbox.contains(p)));
    }

    #[test]
    fn bounding_box_of_no_points_is_none() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn padded_box_grows_on_every_side() {
        let bbox = BoundingBox {
            min: Point3::new(0.0, 0.0, 0.0),
            max: Point3::new(1.0, 2.0, 3.0),
        }
        .padded(1.0);
        assert_eq!(bbox.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bbox.extent(), Vector3::new(3.0, 4.0, 5.0));
        assert!(f64_approx_equal(bbox.volume(), 60.0));
    }

    #[test]
    fn unit_vector_normalizes() {
        let unit = unit_vector(&Vector3::new(3.0, 0.0, 4.0));
        assert!(f64_approx_equal(unit.norm(), 1.0));
        assert!(f64_approx_equal(unit.x, 0.6));
    }

    #[test]
    #[should_panic(expected = "zero-length")]
    fn unit_vector_panics_on_zero_vector() {
        unit_vector(&Vector3::zeros());
    }

    #[test]
    fn angle_of_right_angle_is_half_pi() {
        let (theta, _) = angle_with_derivatives(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert!(f64_approx_equal(theta, FRAC_PI_2));
    }

    #[test]
    fn angle_derivatives_match_finite_differences() {
        let points = [
            Point3::new(1.2, 0.3, -0.4),
            Point3::new(0.1, -0.2, 0.3),
            Point3::new(-0.5, 1.1, 0.7),
        ];
        let (_, derivatives) = angle_with_derivatives(&points[0], &points[1], &points[2]);
        for atom in 0..3 {
            for axis in 0..3 {
                let numeric = numeric_derivative(&points, atom, axis, |p| {
                    angle_with_derivatives(&p[0], &p[1], &p[2]).0
                });
                assert!(f64_approx_equal(numeric, derivatives[atom][axis]));
            }
        }
    }

    #[test]
    fn collinear_angle_has_zero_derivatives() {
        let (theta, derivatives) = angle_with_derivatives(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(-1.0, 0.0, 0.0),
        );
        assert!(f64_approx_equal(theta, PI));
        assert!(derivatives.iter().all(|d| d.norm() == 0.0));
    }

    #[test]
    fn trans_dihedral_is_pi() {
        let (phi, _) = dihedral_with_derivatives(
            &Point3::new(1.0, 1.0, 0.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 1.5),
            &Point3::new(-1.0, -1.0, 1.5),
        );
        assert!(f64_approx_equal(phi.abs(), PI));
    }

    #[test]
    fn dihedral_derivatives_match_finite_differences() {
        let points = [
            Point3::new(1.1, 0.9, -0.2),
            Point3::new(0.0, 0.1, 0.0),
            Point3::new(0.2, -0.1, 1.5),
            Point3::new(-0.8, 0.6, 2.1),
        ];
        let (_, derivatives) =
            dihedral_with_derivatives(&points[0], &points[1], &points[2], &points[3]);
        for atom in 0..4 {
            for axis in 0..3 {
                let numeric = numeric_derivative(&points, atom, axis, |p| {
                    dihedral_with_derivatives(&p[0], &p[1], &p[2], &p[3]).0
                });
                assert!(f64_approx_equal(numeric, derivatives[atom][axis]));
            }
        }
    }

    #[test]
    fn dihedral_with_collinear_atoms_is_degenerate() {
        let (phi, derivatives) = dihedral_with_derivatives(
            &Point3::new(0.0, 0.0, -1.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
        );
        assert_eq!(phi, 0.0);
        assert!(derivatives.iter().all(|d| d.norm() == 0.0));
    }
}
